//! Upload filename handling.

use std::path::Path;

/// Fallback name when nothing of the original survives sanitising.
const FALLBACK_NAME: &str = "document";

/// Reduce a user-supplied filename to a safe flat name.
///
/// Non-ASCII characters are dropped, path separators become spaces, anything
/// outside `[A-Za-z0-9_.-]` is removed, whitespace runs collapse into `_` and
/// leading/trailing dots and underscores are stripped. `../../etc/passwd`
/// becomes `etc_passwd`.
pub fn secure_filename(name: &str) -> String {
    let ascii: String = name
        .chars()
        .filter(|c| c.is_ascii())
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");

    let cleaned: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Lower-cased file extension, if any.
pub fn extension_lowercase(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_filename_basic() {
        assert_eq!(secure_filename("My cool movie.mov"), "My_cool_movie.mov");
        assert_eq!(secure_filename("report-2024_v2.pdf"), "report-2024_v2.pdf");
    }

    #[test]
    fn test_secure_filename_strips_paths() {
        assert_eq!(secure_filename("../../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename("C:\\Users\\me\\scan.png"), "C_Users_me_scan.png");
    }

    #[test]
    fn test_secure_filename_drops_non_ascii() {
        assert_eq!(secure_filename("Befund_Müller.docx"), "Befund_Mller.docx");
        assert_eq!(secure_filename("i contain cool ümläuts.txt"), "i_contain_cool_mluts.txt");
    }

    #[test]
    fn test_secure_filename_fallback() {
        assert_eq!(secure_filename(""), "document");
        assert_eq!(secure_filename("..."), "document");
        assert_eq!(secure_filename("äöü"), "document");
    }

    #[test]
    fn test_extension_lowercase() {
        assert_eq!(extension_lowercase(Path::new("a/B.PDF")).as_deref(), Some("pdf"));
        assert_eq!(extension_lowercase(Path::new("README")), None);
    }
}
