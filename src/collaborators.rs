//! External interfaces the core consumes but does not implement (§6): HTTP/FTP
//! downloading, archive extraction, and filesystem installation all live
//! behind these traits. Modeling them as traits keeps the core's dependency
//! surface free of an HTTP client or archive reader - those concerns belong
//! to the embedding application.

use std::io::Write;

use crate::error::CoreError;

/// Retrieves a URL (`http://`, `https://`, `ftp://`, or `file:`) to a local
/// path. The core does not care how.
pub trait Downloader {
    fn download(&self, url: &str, dest_path: &str) -> Result<(), CoreError>;
}

/// Reads the control stanza (and, separately, the file list) out of a
/// package archive (`.ipk`/`.deb`) into a stream the control-file parser (C2)
/// can consume.
pub trait ArchiveReader {
    fn extract_control(&self, archive_path: &str, out: &mut dyn Write) -> Result<(), CoreError>;
    fn extract_file_list(&self, archive_path: &str, out: &mut dyn Write) -> Result<(), CoreError>;
}
