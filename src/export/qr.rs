//! QR code rendering.
//!
//! Each record can be printed as a QR code carrying its JSON (without the
//! photo), so a sample bag label scans back to the full observation.

use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};
use qrcode::{Color, EcLevel, QrCode};

use crate::error::{Error, Result};
use crate::export::serialize::qr_payload;
use crate::model::MonitoringRecord;

/// Quiet zone around the symbol, in modules.
pub const MARGIN: u32 = 2;

/// Pixels per module.
pub const SCALE: u32 = 6;

const DARK: Rgb<u8> = Rgb([0x00, 0x58, 0x33]);
const LIGHT: Rgb<u8> = Rgb([0xFF, 0xFF, 0xFF]);

/// Render a record as a PNG-encoded QR code.
///
/// # Errors
///
/// Returns [`Error::QrGeneration`] if the payload does not fit in a QR code
/// at error-correction level M, or if PNG encoding fails.
pub fn to_qr_png(record: &MonitoringRecord) -> Result<Vec<u8>> {
    let id = record.id_or_default();
    let qr_error = |message: String| Error::QrGeneration { id, message };

    let payload = qr_payload(record)?;
    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::M)
        .map_err(|e| qr_error(e.to_string()))?;

    let image = render(&code).ok_or_else(|| qr_error("symbol too large to render".to_string()))?;

    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .map_err(|e| qr_error(e.to_string()))?;

    Ok(bytes.into_inner())
}

/// Paint the module grid onto an RGB canvas.
fn render(code: &QrCode) -> Option<RgbImage> {
    let modules = u32::try_from(code.width()).ok()?;
    let side = (modules + 2 * MARGIN).checked_mul(SCALE)?;
    let mut canvas = RgbImage::from_pixel(side, side, LIGHT);

    for (index, color) in code.to_colors().into_iter().enumerate() {
        if color != Color::Dark {
            continue;
        }
        let index = u32::try_from(index).ok()?;
        let x0 = (index % modules + MARGIN) * SCALE;
        let y0 = (index / modules + MARGIN) * SCALE;
        for dy in 0..SCALE {
            for dx in 0..SCALE {
                canvas.put_pixel(x0 + dx, y0 + dy, DARK);
            }
        }
    }

    Some(canvas)
}
