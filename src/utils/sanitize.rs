//! Output filename sanitization

/// Characters stripped from presented titles before they become filenames.
/// Hash marks are included because the filename doubles as a URL path.
const ILLEGAL: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*', '#'];

const MAX_LEN: usize = 200;

/// Strip characters that break common filesystems or retrieval URLs,
/// drop non-printable characters, trim surrounding whitespace and cap
/// the length. Applying it twice yields the same result.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !ILLEGAL.contains(c) && !c.is_control())
        .collect();

    let capped: String = cleaned.trim().chars().take(MAX_LEN).collect();
    capped.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_illegal_characters() {
        let result = sanitize_filename("My/Video?#1");
        assert!(!result.contains('/'));
        assert!(!result.contains('?'));
        assert!(!result.contains('#'));
        assert_eq!(result, "MyVideo1");
    }

    #[test]
    fn test_strips_control_characters() {
        assert_eq!(sanitize_filename("a\nb\tc"), "abc");
    }

    #[test]
    fn test_trims_whitespace() {
        assert_eq!(sanitize_filename("  spaced out  "), "spaced out");
    }

    #[test]
    fn test_caps_length() {
        let long = "x".repeat(500);
        assert_eq!(sanitize_filename(&long).chars().count(), 200);
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "My/Video?#1",
            "  plain title  ",
            &format!("{} tail", "y".repeat(220)),
            "already-clean",
        ];
        for input in inputs {
            let once = sanitize_filename(input);
            assert_eq!(sanitize_filename(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_empty_and_only_illegal() {
        assert_eq!(sanitize_filename(""), "");
        assert_eq!(sanitize_filename("///???"), "");
    }
}
