//! Audio content detection and import into the store.

mod fetch;
mod sniff;

pub use fetch::{DownloadError, MAX_DOWNLOAD_BYTES, download, import_url, is_url};
pub use sniff::{AudioFormat, detect_format, import_file};
