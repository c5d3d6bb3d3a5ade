//! Shared helpers: glob matching, file output, HTML and MIME utilities.

pub mod fs;
pub mod glob;
pub mod html;
pub mod mime;

/// Format count with noun, handling pluralization
///
/// - `plural_count(0, "file")` -> `"0 files"`
/// - `plural_count(1, "file")` -> `"1 file"`
#[inline]
pub fn plural_count(count: usize, noun: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{count} {noun}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::plural_count;

    #[test]
    fn test_plural_count() {
        assert_eq!(plural_count(0, "icon"), "0 icons");
        assert_eq!(plural_count(1, "icon"), "1 icon");
        assert_eq!(plural_count(12, "font"), "12 fonts");
    }
}
