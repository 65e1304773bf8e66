//! Form-boundary validation.
//!
//! Records are checked here, before they reach the store. The store itself
//! never rejects a draft on content grounds.
//!
//! Hard failures (missing cave/person/date, an unnamed "Otro", a malformed
//! date, an oversized photo) return [`Error::Validation`]. Values outside the
//! station's usual option lists are only reported, since the fields are
//! free text.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::export::image::decoded_len;
use crate::model::{RecordDraft, PERSON_OTHER};

/// Largest accepted photo, measured after base64 decoding.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

// ── Option lists offered by the field form ───────────────────

pub static CAVE_OPTIONS: LazyLock<HashSet<&str>> = LazyLock::new(|| {
    [
        "La Fábrica",
        "La Chapa",
        "El Hoyo",
        "El Indio",
        "El Pesebre",
        "Marlene",
        "Cabeza de Toro",
        "Alsacia",
        "La Vaca",
        "Chivo Barbas de Oro...",
        "El Santo",
        "La Perrita",
        "La Liona",
    ]
    .into_iter()
    .collect()
});

pub static PERSON_OPTIONS: LazyLock<HashSet<&str>> = LazyLock::new(|| {
    [
        "Nicolas Peña",
        "Delsy Gamboa",
        "Deiver Amboni",
        "Miguel Quintero",
        "Arnulfo Berrio",
        "Sergio Rueda",
        "Juan Carlos Jaimes",
        "Avelino Solano",
        "Leonardo Forero",
        PERSON_OTHER,
    ]
    .into_iter()
    .collect()
});

pub static DRIP_OPTIONS: LazyLock<HashSet<&str>> = LazyLock::new(|| {
    [
        "5 segundos",
        "10 segundos",
        "30 segundos",
        "1 minuto",
        "2 minutos",
        "5 minutos",
        "Otro",
    ]
    .into_iter()
    .collect()
});

/// Shared by "has it rained" and "carbonate observed".
pub static AMOUNT_OPTIONS: LazyLock<HashSet<&str>> = LazyLock::new(|| {
    ["Mucho", "Más o menos", "Poco", "Muy poco", "Nada"]
        .into_iter()
        .collect()
});

pub static YES_NO_OPTIONS: LazyLock<HashSet<&str>> =
    LazyLock::new(|| ["Si", "No"].into_iter().collect());

/// Validate a draft before it is handed to the store.
///
/// # Errors
///
/// Returns [`Error::Validation`] naming the first offending field.
pub fn validate_draft(draft: &RecordDraft) -> Result<()> {
    if draft.cave_name.trim().is_empty() {
        return Err(Error::validation("caveName", "the cave is required"));
    }
    if draft.person_in_charge.trim().is_empty() {
        return Err(Error::validation(
            "personInCharge",
            "the person in charge is required",
        ));
    }
    if draft.diligenciamiento_date.trim().is_empty() {
        return Err(Error::validation(
            "diligenciamientoDate",
            "the date is required",
        ));
    }
    if draft.person_in_charge == PERSON_OTHER
        && draft
            .person_in_charge_other
            .as_deref()
            .is_none_or(|p| p.trim().is_empty())
    {
        return Err(Error::validation(
            "personInChargeOther",
            "name the person in charge when \"Otro\" is selected",
        ));
    }

    validate_date(&draft.diligenciamiento_date)?;

    if let Some(image) = draft.image.as_deref().filter(|s| !s.is_empty()) {
        validate_image(image)?;
    }

    Ok(())
}

/// Check an ISO `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns [`Error::Validation`] if the date does not parse.
pub fn validate_date(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|e| {
        Error::validation("diligenciamientoDate", format!("'{date}' is not a YYYY-MM-DD date ({e})"))
    })
}

/// Check that a photo is a base64 data URI within the size limit.
///
/// # Errors
///
/// Returns [`Error::Validation`] for a non data URI or an oversized payload.
pub fn validate_image(data_uri: &str) -> Result<()> {
    let Some(len) = decoded_len(data_uri) else {
        return Err(Error::validation(
            "image",
            "expected a data:<mime>;base64,<payload> URI",
        ));
    };

    if len > MAX_IMAGE_BYTES {
        return Err(Error::validation(
            "image",
            format!("the photo is {len} bytes, the maximum is {MAX_IMAGE_BYTES}"),
        ));
    }

    Ok(())
}

/// Fields whose value is not one of the form's usual options.
///
/// Returned as `(field, value)` pairs; empty fields are not reported.
#[must_use]
pub fn unusual_values(draft: &RecordDraft) -> Vec<(&'static str, String)> {
    let checks: [(&'static str, &str, &LazyLock<HashSet<&str>>); 6] = [
        ("caveName", &draft.cave_name, &CAVE_OPTIONS),
        ("personInCharge", &draft.person_in_charge, &PERSON_OPTIONS),
        ("activeDrip", &draft.active_drip, &DRIP_OPTIONS),
        ("hasItRained", &draft.has_it_rained, &AMOUNT_OPTIONS),
        ("watchGlassFallen", &draft.watch_glass_fallen, &YES_NO_OPTIONS),
        ("carbonateObserved", &draft.carbonate_observed, &AMOUNT_OPTIONS),
    ];

    checks
        .into_iter()
        .filter(|(_, value, options)| !value.is_empty() && !options.contains(value))
        .map(|(field, value, _)| (field, value.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> RecordDraft {
        RecordDraft {
            cave_name: "La Fábrica".to_string(),
            person_in_charge: "Nicolas Peña".to_string(),
            diligenciamiento_date: "2024-03-01".to_string(),
            ..RecordDraft::default()
        }
    }

    fn field_of(err: Error) -> &'static str {
        match err {
            Error::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_draft_passes() {
        assert!(validate_draft(&valid()).is_ok());
    }

    #[test]
    fn test_required_fields() {
        let mut d = valid();
        d.cave_name = "   ".to_string();
        assert_eq!(field_of(validate_draft(&d).unwrap_err()), "caveName");

        let mut d = valid();
        d.person_in_charge.clear();
        assert_eq!(field_of(validate_draft(&d).unwrap_err()), "personInCharge");

        let mut d = valid();
        d.diligenciamiento_date.clear();
        assert_eq!(field_of(validate_draft(&d).unwrap_err()), "diligenciamientoDate");
    }

    #[test]
    fn test_otro_requires_name() {
        let mut d = valid();
        d.person_in_charge = PERSON_OTHER.to_string();
        assert_eq!(field_of(validate_draft(&d).unwrap_err()), "personInChargeOther");

        d.person_in_charge_other = Some("  ".to_string());
        assert_eq!(field_of(validate_draft(&d).unwrap_err()), "personInChargeOther");

        d.person_in_charge_other = Some("Ana Ruiz".to_string());
        assert!(validate_draft(&d).is_ok());
    }

    #[test]
    fn test_bad_date_rejected() {
        let mut d = valid();
        d.diligenciamiento_date = "01/03/2024".to_string();
        assert_eq!(field_of(validate_draft(&d).unwrap_err()), "diligenciamientoDate");
    }

    #[test]
    fn test_image_must_be_data_uri() {
        let mut d = valid();
        d.image = Some("not-a-data-uri".to_string());
        assert_eq!(field_of(validate_draft(&d).unwrap_err()), "image");

        d.image = Some("data:image/png;base64,iVBORw0KGgo=".to_string());
        assert!(validate_draft(&d).is_ok());
    }

    #[test]
    fn test_unusual_values_reports_off_list_entries() {
        let mut d = valid();
        d.has_it_rained = "Bastante".to_string();
        d.watch_glass_fallen = "No".to_string();

        let unusual = unusual_values(&d);
        assert_eq!(unusual, vec![("hasItRained", "Bastante".to_string())]);
    }
}
