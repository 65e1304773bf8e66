//! Monitoring record model.
//!
//! A record is one field observation at a cave monitoring station: who
//! filled it in, when, the drip measurements, sample names, and an optional
//! photo carried as a data URI.

use serde::{Deserialize, Serialize};

/// Value of `personInCharge` that defers to the free-text `personInChargeOther`.
pub const PERSON_OTHER: &str = "Otro";

/// The observation fields a user fills in on the form.
///
/// This is the payload for [`RecordStore::add`](crate::storage::RecordStore::add).
/// The store adds `id`, `customId` and `synced` on top of it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDraft {
    #[serde(default)]
    pub cave_name: String,
    #[serde(default)]
    pub person_in_charge: String,
    #[serde(default)]
    pub person_in_charge_other: Option<String>,
    /// ISO date (`YYYY-MM-DD`).
    #[serde(default)]
    pub diligenciamiento_date: String,
    #[serde(default)]
    pub active_drip: String,
    #[serde(default)]
    pub drip_count: String,
    #[serde(default)]
    pub test_tube_sample_name: String,
    #[serde(default)]
    pub watch_glass_sample_name: String,
    #[serde(default)]
    pub has_it_rained: String,
    #[serde(default)]
    pub watch_glass_fallen: String,
    #[serde(default)]
    pub observations: String,
    #[serde(default)]
    pub carbonate_observed: String,
    /// Photo as a `data:<mime>;base64,...` URI.
    #[serde(default)]
    pub image: Option<String>,
}

impl RecordDraft {
    /// The person who actually filled in the record.
    ///
    /// Resolves to `personInChargeOther` when `personInCharge` is "Otro".
    #[must_use]
    pub fn effective_person(&self) -> Option<&str> {
        if self.person_in_charge == PERSON_OTHER {
            self.person_in_charge_other.as_deref()
        } else {
            Some(self.person_in_charge.as_str())
        }
    }

    /// Whether a non-empty image payload is attached.
    #[must_use]
    pub fn has_image(&self) -> bool {
        self.image.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// A persisted monitoring record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringRecord {
    /// Store-assigned key. `None` only before the first insert.
    #[serde(default)]
    pub id: Option<i64>,

    /// Human-readable secondary key, fixed at creation.
    #[serde(default)]
    pub custom_id: String,

    #[serde(flatten)]
    pub data: RecordDraft,

    /// True only after a confirmed remote commit.
    #[serde(default)]
    pub synced: bool,
}

impl MonitoringRecord {
    /// The stored id, or 0 for a record that was never persisted.
    #[must_use]
    pub fn id_or_default(&self) -> i64 {
        self.id.unwrap_or_default()
    }
}

/// A partial edit of a record.
///
/// `None` leaves a field untouched. For `image`, `Some(None)` removes the
/// photo. `customId` cannot be patched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPatch {
    pub cave_name: Option<String>,
    pub person_in_charge: Option<String>,
    pub person_in_charge_other: Option<Option<String>>,
    pub diligenciamiento_date: Option<String>,
    pub active_drip: Option<String>,
    pub drip_count: Option<String>,
    pub test_tube_sample_name: Option<String>,
    pub watch_glass_sample_name: Option<String>,
    pub has_it_rained: Option<String>,
    pub watch_glass_fallen: Option<String>,
    pub observations: Option<String>,
    pub carbonate_observed: Option<String>,
    pub image: Option<Option<String>>,
}

impl RecordPatch {
    /// Merge the patch into a draft in place.
    pub fn apply(&self, draft: &mut RecordDraft) {
        fn set(target: &mut String, value: Option<&String>) {
            if let Some(v) = value {
                target.clone_from(v);
            }
        }

        set(&mut draft.cave_name, self.cave_name.as_ref());
        set(&mut draft.person_in_charge, self.person_in_charge.as_ref());
        set(&mut draft.diligenciamiento_date, self.diligenciamiento_date.as_ref());
        set(&mut draft.active_drip, self.active_drip.as_ref());
        set(&mut draft.drip_count, self.drip_count.as_ref());
        set(&mut draft.test_tube_sample_name, self.test_tube_sample_name.as_ref());
        set(&mut draft.watch_glass_sample_name, self.watch_glass_sample_name.as_ref());
        set(&mut draft.has_it_rained, self.has_it_rained.as_ref());
        set(&mut draft.watch_glass_fallen, self.watch_glass_fallen.as_ref());
        set(&mut draft.observations, self.observations.as_ref());
        set(&mut draft.carbonate_observed, self.carbonate_observed.as_ref());

        if let Some(other) = &self.person_in_charge_other {
            draft.person_in_charge_other.clone_from(other);
        }
        if let Some(image) = &self.image {
            draft.image.clone_from(image);
        }
    }

    /// True if the patch touches no field.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> RecordDraft {
        RecordDraft {
            cave_name: "La Chapa".to_string(),
            person_in_charge: "Delsy Gamboa".to_string(),
            diligenciamiento_date: "2024-05-10".to_string(),
            ..RecordDraft::default()
        }
    }

    #[test]
    fn test_effective_person_uses_other_field() {
        let mut d = draft();
        assert_eq!(d.effective_person(), Some("Delsy Gamboa"));

        d.person_in_charge = PERSON_OTHER.to_string();
        d.person_in_charge_other = Some("Ana Ruiz".to_string());
        assert_eq!(d.effective_person(), Some("Ana Ruiz"));
    }

    #[test]
    fn test_patch_merges_only_given_fields() {
        let mut d = draft();
        d.image = Some("data:image/png;base64,AAAA".to_string());

        let patch = RecordPatch {
            observations: Some("Goteo constante".to_string()),
            image: Some(None),
            ..RecordPatch::default()
        };
        patch.apply(&mut d);

        assert_eq!(d.cave_name, "La Chapa");
        assert_eq!(d.observations, "Goteo constante");
        assert_eq!(d.image, None);
        assert!(RecordPatch::default().is_empty());
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_record_serializes_camel_case_in_field_order() {
        let record = MonitoringRecord {
            id: Some(3),
            custom_id: "La_Chapa-2024-05-10-Delsy_Gamboa-1".to_string(),
            data: draft(),
            synced: false,
        };

        let value = serde_json::to_value(&record).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys[0], "id");
        assert_eq!(keys[1], "customId");
        assert_eq!(keys[2], "caveName");
        assert_eq!(*keys.last().unwrap(), "synced");
    }

    #[test]
    fn test_legacy_json_without_sync_fields_defaults() {
        let json = r#"{"id":1,"caveName":"El Hoyo","personInCharge":"Sergio Rueda","diligenciamientoDate":"2023-11-02"}"#;
        let record: MonitoringRecord = serde_json::from_str(json).unwrap();
        assert!(!record.synced);
        assert!(record.custom_id.is_empty());
        assert_eq!(record.data.observations, "");
    }
}
