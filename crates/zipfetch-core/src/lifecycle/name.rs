//! Archive names: the on-disk identity of a named archive.

use crate::url_model::sanitize_storage_name;
use std::fmt;

const SUFFIX: &str = ".zip";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("filename is required")]
    Missing,
    #[error("invalid archive name: {0:?}")]
    Invalid(String),
}

/// A validated archive filename: sanitized, a single path component, ends in
/// `.zip` (any case). Cannot name anything outside the storage directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArchiveName(String);

impl ArchiveName {
    pub fn parse(raw: &str) -> Result<Self, NameError> {
        let cleaned = sanitize_storage_name(raw);
        if cleaned.is_empty() {
            return Err(NameError::Missing);
        }
        let name = if has_zip_suffix(&cleaned) {
            cleaned
        } else {
            format!("{}{}", cleaned, SUFFIX)
        };
        let stem = &name[..name.len() - SUFFIX.len()];
        // "", ".", ".." and friends would escape or alias the directory.
        if stem.trim_matches('.').trim().is_empty() {
            return Err(NameError::Invalid(raw.to_string()));
        }
        Ok(Self(name))
    }

    /// Name for an ephemeral archive: local time, minute resolution.
    pub fn timestamped() -> Self {
        Self(chrono::Local::now().format("%Y%m%d_%H%M.zip").to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArchiveName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Case-insensitive `.zip` suffix check, also used by the janitor.
pub fn has_zip_suffix(name: &str) -> bool {
    name.len() >= SUFFIX.len()
        && name.is_char_boundary(name.len() - SUFFIX.len())
        && name[name.len() - SUFFIX.len()..].eq_ignore_ascii_case(SUFFIX)
}
