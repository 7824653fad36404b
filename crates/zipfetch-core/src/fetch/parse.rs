//! Parse HTTP response header lines collected by libcurl.

/// Reason phrase of the last status line in `lines`.
///
/// libcurl hands over the headers of every response in a redirect chain, so
/// the last `HTTP/` line belongs to the final response.
pub(crate) fn final_reason_phrase(lines: &[String]) -> Option<String> {
    let status_line = lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| l.starts_with("HTTP/"))
        .last()?;
    // "HTTP/1.1 404 Not Found" -> ["HTTP/1.1", "404", "Not Found"]
    let mut parts = status_line.splitn(3, ' ');
    parts.next()?;
    parts.next()?;
    let reason = parts.next()?.trim();
    if reason.is_empty() {
        None
    } else {
        Some(reason.to_string())
    }
}
