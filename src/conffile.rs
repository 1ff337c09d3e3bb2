//! Conffile tracker (C6, §4.6, §3.5): tracks declared configuration files and
//! whether they have been modified, by comparing a stored digest against a
//! freshly computed one.
//!
//! Digest computation is the one piece of the §6 "digest interface" the core
//! implements directly rather than only consuming - it's cheap, in-process,
//! and the standard library has no hashing of its own to reach for.

use sha2::{Digest, Sha256};

use crate::package::ConffileEntry;

/// The §6 digest interface, kept as a trait so tests (and embedders who
/// already cache digests elsewhere) can substitute a fake.
pub trait DigestSource {
    fn md5(&self, path: &str) -> Option<String>;
    fn sha256(&self, path: &str) -> Option<String>;
}

/// Reads the file from disk and hashes its contents.
pub struct FileDigestSource;

impl DigestSource for FileDigestSource {
    fn md5(&self, path: &str) -> Option<String> {
        let data = std::fs::read(path).ok()?;
        Some(format!("{:x}", md5::compute(&data)))
    }

    fn sha256(&self, path: &str) -> Option<String> {
        let data = std::fs::read(path).ok()?;
        let mut hasher = Sha256::new();
        hasher.update(&data);
        Some(hex::encode(hasher.finalize()))
    }
}

/// §4.6: a conffile is "modified" if the file exists and its freshly
/// computed digest differs from `recorded_digest`; a missing digest or an
/// unreadable file both count as modified.
pub fn is_modified(entry: &ConffileEntry, source: &dyn DigestSource) -> bool {
    let Some(recorded) = &entry.recorded_digest else {
        return true;
    };

    let computed = if recorded.len() > 33 {
        source.sha256(&entry.path)
    } else {
        source.md5(&entry.path)
    };

    match computed {
        Some(actual) => !actual.eq_ignore_ascii_case(recorded),
        None => true,
    }
}
