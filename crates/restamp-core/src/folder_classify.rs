use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

/// Localized prefixes: "<prefix>YYYY"
const YEAR_FOLDER_PREFIXES: &[&str] = &[
    "Photos from ",   // EN
    "Fotos von ",     // DE
    "Fotos aus ",     // DE (alternate)
    "Photos de ",     // FR
    "Fotos de ",      // ES, PT, CA
    "Foto's uit ",    // NL
    "Foto dal ",      // IT
    "Foto del ",      // IT (alternate)
    "Zdjęcia z ",     // PL
    "Фото за ",       // RU
    "Фотографии за ", // RU (alternate)
    "Fotky z ",       // CS
    "Fotografii din ",// RO
    "Foton från ",    // SV
    "Bilder fra ",    // NO
    "Billeder fra ",  // DA
    "Valokuvat ",     // FI
    "Fényképek - ",   // HU
    "Fotoğraflar ",   // TR
];

/// Localized suffixes: "YYYY<suffix>"
const YEAR_FOLDER_SUFFIXES: &[&str] = &[
    " 年の写真",  // JA
    "年のフォト", // JA (alternate)
    "년의 사진",  // KO
    "年的照片",   // ZH-CN
    "年的相片",   // ZH-TW
];

static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(20|19|18)\d{2}$").unwrap());

/// Check if a folder name is a year-layout folder rather than an album:
/// a bare year ("2023") or a localized export name ("Photos from 2023").
pub fn is_year_folder(name: &str) -> bool {
    if YEAR_RE.is_match(name) {
        return true;
    }
    for prefix in YEAR_FOLDER_PREFIXES {
        if let Some(rest) = name.strip_prefix(prefix) {
            if YEAR_RE.is_match(rest) {
                return true;
            }
        }
    }
    for suffix in YEAR_FOLDER_SUFFIXES {
        if let Some(rest) = name.strip_suffix(suffix) {
            if YEAR_RE.is_match(rest) {
                return true;
            }
        }
    }
    false
}

/// Container folders exports wrap everything in; never album names.
fn is_container_folder(name: &str) -> bool {
    name == "Takeout"
        || (name.starts_with("Google")
            && (name.contains("hoto")
                || name.contains("ото")
                || name.contains("フォト")
                || name.contains("照片")
                || name.contains("사진")))
}

/// Derive the album grouping for a file from its directory path relative to
/// the input root. The first path component that is neither a container
/// folder nor a year-layout folder names the album; year folders and
/// root-level files yield `None`.
pub fn classify_album(relative_dir: &Path) -> Option<String> {
    for component in relative_dir.components() {
        let name = component.as_os_str().to_str()?;
        if is_container_folder(name) || is_year_folder(name) {
            continue;
        }
        if !name.is_empty() {
            return Some(name.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_folders() {
        assert!(is_year_folder("2023"));
        assert!(is_year_folder("Photos from 2023"));
        assert!(is_year_folder("Fotos von 2021"));
        assert!(is_year_folder("2023 年の写真"));
        assert!(is_year_folder("2023년의 사진"));
        assert!(is_year_folder("2023年的照片"));
        assert!(!is_year_folder("My Vacation"));
        assert!(!is_year_folder("Photos from abcd"));
    }

    #[test]
    fn test_classify_album() {
        assert_eq!(
            classify_album(Path::new("Takeout/Google Photos/Trip")),
            Some("Trip".to_string())
        );
        assert_eq!(classify_album(Path::new("Takeout/Google Photos/Photos from 2023")), None);
        assert_eq!(classify_album(Path::new("2019")), None);
        assert_eq!(classify_album(Path::new("")), None);
        assert_eq!(classify_album(Path::new("Trip")), Some("Trip".to_string()));
    }
}
