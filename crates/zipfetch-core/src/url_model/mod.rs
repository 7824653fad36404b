//! URL modeling and filename derivation.
//!
//! Derives archive entry names from the URL path, falling back to a
//! synthesized `file_<index>` name with an extension from the response
//! content-type, then sanitizes the result.

mod mime;
mod path;
mod sanitize;

pub use mime::extension_for_content_type;
pub use path::filename_from_url_path;
pub use sanitize::{sanitize_filename, sanitize_storage_name};

/// Derives the archive entry name for the URL at position `index` of a batch.
///
/// # Examples
///
/// - `derive_filename("https://example.com/a/photo.jpg", 0, None)` → `"photo.jpg"`
/// - `derive_filename("https://example.com/", 2, Some("image/png"))` → `"file_2.png"`
pub fn derive_filename(url: &str, index: usize, content_type: Option<&str>) -> String {
    let raw = filename_from_url_path(url).unwrap_or_else(|| {
        let ext = content_type.map(extension_for_content_type).unwrap_or("");
        format!("file_{}{}", index, ext)
    });
    sanitize_filename(&raw)
}
