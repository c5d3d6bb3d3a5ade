//! Live reload client injection.

use crate::embed::serve::script_tag;

/// Inject the client into HTML bodies; other content passes through.
pub fn maybe_inject_livereload(body: Vec<u8>, content_type: &str) -> Vec<u8> {
    if content_type.starts_with("text/html") {
        inject_before_body_end(&body, script_tag().as_bytes())
    } else {
        body
    }
}

/// Insert `snippet` before the last `</body>`, or append it when there is
/// none.
fn inject_before_body_end(content: &[u8], snippet: &[u8]) -> Vec<u8> {
    const PATTERN: &[u8] = b"</body>";

    let pos = content
        .windows(PATTERN.len())
        .rposition(|w| w.eq_ignore_ascii_case(PATTERN))
        .unwrap_or(content.len());

    let mut result = Vec::with_capacity(content.len() + snippet.len());
    result.extend_from_slice(&content[..pos]);
    result.extend_from_slice(snippet);
    result.extend_from_slice(&content[pos..]);
    result
}
