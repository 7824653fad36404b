//! Filename sanitization for archive entries and archive files.

/// Characters that are replaced with `_` in every derived filename.
const FORBIDDEN: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Replaces every character from `/ \ : * ? " < > |` with `_`.
///
/// Idempotent: a name without forbidden characters comes back unchanged.
/// Not collision-safe: distinct inputs may map to the same output.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if FORBIDDEN.contains(&c) { '_' } else { c })
        .collect()
}

/// Stricter variant for names that become files in the storage directory:
/// forbidden characters and control characters become `_`, surrounding
/// whitespace is trimmed.
pub fn sanitize_storage_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if FORBIDDEN.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_forbidden_set() {
        assert_eq!(sanitize_filename("a/b:c*d"), "a_b_c_d");
        assert_eq!(sanitize_filename("q?\"<>|\\"), "q______");
    }

    #[test]
    fn idempotent_on_clean_names() {
        let clean = "report-2024 final.pdf";
        assert_eq!(sanitize_filename(clean), clean);
        let once = sanitize_filename("x|y?.txt");
        assert_eq!(sanitize_filename(&once), once);
    }

    #[test]
    fn does_not_collapse_or_trim() {
        assert_eq!(sanitize_filename("//a"), "__a");
        assert_eq!(sanitize_filename(" a "), " a ");
    }

    #[test]
    fn storage_name_strips_controls_and_whitespace() {
        assert_eq!(sanitize_storage_name("  my\x00arch\tive  "), "my_arch_ive");
        assert_eq!(sanitize_storage_name("../../etc/passwd"), ".._.._etc_passwd");
    }
}
