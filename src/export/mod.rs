//! Export of records to files.
//!
//! - **Serialize**: JSON (object or array) and CSV renderings
//! - **QR**: one PNG QR code per record
//! - **Image**: data URI decoding for record photos
//! - **Archive**: zip bundles of a single record or the whole store
//! - **File**: atomic writes of finished archives

pub mod archive;
pub mod file;
pub mod image;
pub mod qr;
pub mod serialize;

pub use archive::{build_archive, Archive, ArchiveScope};
pub use file::{atomic_write, write_archive};
pub use qr::to_qr_png;
pub use serialize::{to_csv, to_csv_single, to_json, to_json_single, ImageNaming};
