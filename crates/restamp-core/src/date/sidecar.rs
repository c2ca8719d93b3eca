use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

use super::Extraction;
use crate::extras;

/// Export pipelines truncate sidecar filenames to this many bytes,
/// including the ".json" extension.
const MAX_SIDECAR_NAME: usize = 51;

static BRACKET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(\d+\)\.").unwrap());
static TRAILING_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?P<extra>-[A-Za-zÀ-ÖØ-öø-ÿ]+(\(\d+\))?)\.\w+$").unwrap());

/// How hard to look for a sidecar. `Relaxed` applies the aggressive
/// suffix-stripping transforms and is only consulted late in the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Standard,
    Relaxed,
}

/// Locate and parse the structured sidecar for a media file.
pub fn extract(media_path: &Path, mode: Mode) -> Extraction {
    let Some(sidecar) = locate(media_path, mode) else {
        return Extraction::NotFound;
    };
    let bytes = match fs::read(&sidecar) {
        Ok(bytes) => bytes,
        Err(e) => {
            return Extraction::Failed(format!(
                "failed to read sidecar {}: {}",
                sidecar.display(),
                e
            ))
        }
    };
    match parse_taken_time(&bytes) {
        Some(taken) => Extraction::Found(taken),
        None => Extraction::Failed(format!(
            "sidecar {} has no usable photoTakenTime",
            sidecar.display()
        )),
    }
}

/// Try filename transformations in a fixed order until a sidecar exists
/// next to the media file.
fn locate(media_path: &Path, mode: Mode) -> Option<PathBuf> {
    let dir = media_path.parent()?;
    let name = media_path.file_name()?.to_str()?;

    let transforms: &[fn(&str) -> String] = match mode {
        Mode::Standard => &[
            |s: &str| s.to_string(),
            |s: &str| extras::strip_edited_suffix(s),
            bracket_swap,
            strip_digit_brackets,
            shorten_name,
            drop_extension,
        ],
        Mode::Relaxed => &[strip_trailing_suffix],
    };

    let mut seen: Vec<String> = Vec::new();
    for transform in transforms {
        let candidate = transform(name);
        // Relaxed transforms that change nothing re-cover Standard ground.
        if mode == Mode::Relaxed && candidate == name {
            continue;
        }
        if seen.contains(&candidate) {
            continue;
        }
        let sidecar = dir.join(format!("{}.json", candidate));
        if sidecar.is_file() {
            return Some(sidecar);
        }
        seen.push(candidate);
    }
    None
}

/// `photoTakenTime.timestamp` holds Unix seconds, as a string or a number.
/// The value is UTC; capture times are kept as local wall-clock time.
pub fn parse_taken_time(json_bytes: &[u8]) -> Option<NaiveDateTime> {
    let data: serde_json::Value = serde_json::from_slice(json_bytes).ok()?;
    let ts = data.get("photoTakenTime")?.get("timestamp")?;
    let epoch = match ts {
        serde_json::Value::String(s) => s.parse::<i64>().ok()?,
        serde_json::Value::Number(n) => n.as_i64()?,
        _ => return None,
    };
    let utc = chrono::DateTime::from_timestamp(epoch, 0)?;
    Some(utc.with_timezone(&chrono::Local).naive_local())
}

/// `name(1).ext` -> `name.ext(1)`, the bracket placement sidecars use.
fn bracket_swap(filename: &str) -> String {
    if let Some(m) = BRACKET_RE.find_iter(filename).last() {
        let bracket = m.as_str().replace('.', "");
        if let Some(pos) = filename.rfind(&bracket) {
            let mut result = String::with_capacity(filename.len());
            result.push_str(&filename[..pos]);
            result.push_str(&filename[pos + bracket.len()..]);
            result.push_str(&bracket);
            return result;
        }
    }
    filename.to_string()
}

/// Drop trailing `(n).` disambiguators: `name(2).jpg` -> `name.jpg`.
fn strip_digit_brackets(filename: &str) -> String {
    BRACKET_RE.replace_all(filename, ".").to_string()
}

/// Truncate so `<name>.json` fits the exported name limit, respecting
/// char boundaries.
fn shorten_name(filename: &str) -> String {
    let max_len = MAX_SIDECAR_NAME - ".json".len();
    if filename.len() + ".json".len() > MAX_SIDECAR_NAME {
        let mut end = max_len;
        while end > 0 && !filename.is_char_boundary(end) {
            end -= 1;
        }
        filename[..end].to_string()
    } else {
        filename.to_string()
    }
}

fn drop_extension(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename)
        .to_string()
}

/// Aggressive fuzzy match: strip one arbitrary trailing `-<letters>` run,
/// with an optional `(n)` group, before the extension.
fn strip_trailing_suffix(filename: &str) -> String {
    let matches: Vec<_> = TRAILING_SUFFIX_RE.find_iter(filename).collect();
    if matches.len() == 1 {
        if let Some(caps) = TRAILING_SUFFIX_RE.captures(filename) {
            if let Some(extra) = caps.name("extra") {
                let mut result = filename.to_string();
                result.replace_range(extra.start()..extra.end(), "");
                return result;
            }
        }
    }
    filename.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SIDECAR: &[u8] = br#"{"title": "photo.jpg", "photoTakenTime": {"timestamp": "1623750000", "formatted": "Jun 15, 2021"}}"#;

    fn expected() -> NaiveDateTime {
        chrono::DateTime::from_timestamp(1623750000, 0)
            .unwrap()
            .with_timezone(&chrono::Local)
            .naive_local()
    }

    #[test]
    fn test_parse_string_and_numeric_timestamps() {
        assert_eq!(parse_taken_time(SIDECAR), Some(expected()));
        assert_eq!(
            parse_taken_time(br#"{"photoTakenTime": {"timestamp": 1623750000}}"#),
            Some(expected())
        );
        assert_eq!(parse_taken_time(b"{}"), None);
        assert_eq!(parse_taken_time(b"not json"), None);
    }

    #[test]
    fn test_exact_match() {
        let dir = tempdir().unwrap();
        let media = dir.path().join("photo.jpg");
        fs::write(&media, b"x").unwrap();
        fs::write(dir.path().join("photo.jpg.json"), SIDECAR).unwrap();

        assert!(matches!(extract(&media, Mode::Standard), Extraction::Found(t) if t == expected()));
    }

    #[test]
    fn test_edited_variant_uses_original_sidecar() {
        let dir = tempdir().unwrap();
        let media = dir.path().join("photo-edited.jpg");
        fs::write(&media, b"x").unwrap();
        fs::write(dir.path().join("photo.jpg.json"), SIDECAR).unwrap();

        assert!(matches!(extract(&media, Mode::Standard), Extraction::Found(_)));
    }

    #[test]
    fn test_bracket_swap() {
        assert_eq!(bracket_swap("photo(1).jpg"), "photo.jpg(1)");
        assert_eq!(bracket_swap("photo.jpg"), "photo.jpg");

        let dir = tempdir().unwrap();
        let media = dir.path().join("photo(1).jpg");
        fs::write(&media, b"x").unwrap();
        fs::write(dir.path().join("photo.jpg(1).json"), SIDECAR).unwrap();
        assert!(matches!(extract(&media, Mode::Standard), Extraction::Found(_)));
    }

    #[test]
    fn test_digit_bracket_strip() {
        let dir = tempdir().unwrap();
        let media = dir.path().join("photo(2).jpg");
        fs::write(&media, b"x").unwrap();
        fs::write(dir.path().join("photo.jpg.json"), SIDECAR).unwrap();

        assert!(matches!(extract(&media, Mode::Standard), Extraction::Found(_)));
    }

    #[test]
    fn test_truncated_long_name() {
        let dir = tempdir().unwrap();
        let long_name = format!("{}.jpg", "a".repeat(60));
        let media = dir.path().join(&long_name);
        fs::write(&media, b"x").unwrap();

        let shortened = shorten_name(&long_name);
        assert_eq!(shortened.len() + ".json".len(), MAX_SIDECAR_NAME);
        fs::write(dir.path().join(format!("{}.json", shortened)), SIDECAR).unwrap();

        assert!(matches!(extract(&media, Mode::Standard), Extraction::Found(_)));
    }

    #[test]
    fn test_relaxed_strips_arbitrary_suffix() {
        let dir = tempdir().unwrap();
        let media = dir.path().join("photo-collage.jpg");
        fs::write(&media, b"x").unwrap();
        fs::write(dir.path().join("photo.jpg.json"), SIDECAR).unwrap();

        // "-collage" is not in the known edited-suffix table.
        assert!(matches!(extract(&media, Mode::Standard), Extraction::NotFound));
        assert!(matches!(extract(&media, Mode::Relaxed), Extraction::Found(_)));
    }

    #[test]
    fn test_corrupt_sidecar_is_failed_not_found() {
        let dir = tempdir().unwrap();
        let media = dir.path().join("photo.jpg");
        fs::write(&media, b"x").unwrap();
        fs::write(dir.path().join("photo.jpg.json"), b"{ nope").unwrap();

        assert!(matches!(extract(&media, Mode::Standard), Extraction::Failed(_)));
    }

    #[test]
    fn test_missing_sidecar_is_not_found() {
        let dir = tempdir().unwrap();
        let media = dir.path().join("photo.jpg");
        fs::write(&media, b"x").unwrap();

        assert!(matches!(extract(&media, Mode::Standard), Extraction::NotFound));
    }
}
