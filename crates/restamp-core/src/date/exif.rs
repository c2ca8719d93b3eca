use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::NaiveDateTime;
use exif::{In, Reader, Tag};

use super::Extraction;

/// Files above this are never opened for an embedded-metadata read.
pub const MAX_EXIF_SIZE: u64 = 64 * 1024 * 1024;

/// Read an embedded capture time. Only plausible camera images qualify:
/// size within the ceiling and a guessed `image/*` content type.
/// EXIF datetimes carry no timezone; they are local wall-clock time as-is.
pub fn extract(path: &Path, size: u64) -> Extraction {
    if size > MAX_EXIF_SIZE {
        return Extraction::NotFound;
    }
    let is_image = mime_guess::from_path(path)
        .first()
        .map_or(false, |mime| mime.type_() == mime_guess::mime::IMAGE);
    if !is_image {
        return Extraction::NotFound;
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => return Extraction::Failed(format!("failed to open for metadata read: {}", e)),
    };
    let mut reader = BufReader::new(file);
    // Screenshots and app exports routinely carry no EXIF at all; an
    // unparseable container is a miss, not an error.
    let Ok(data) = Reader::new().read_from_container(&mut reader) else {
        return Extraction::NotFound;
    };

    let tags = [Tag::DateTimeOriginal, Tag::DateTimeDigitized, Tag::DateTime];
    for tag in &tags {
        if let Some(field) = data.get_field(*tag, In::PRIMARY) {
            let val = field.display_value().to_string();
            if let Some(dt) = parse_exif_datetime(&val) {
                return Extraction::Found(dt);
            }
        }
    }

    Extraction::NotFound
}

/// Tag values use wildly inconsistent separators; normalize everything to
/// `:`, then parse, trimming oversized tails and padding date-only values.
fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    let cleaned = s.replace(['-', '/', '\\', '.'], ":");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    if let Ok(dt) = NaiveDateTime::parse_from_str(&cleaned, "%Y:%m:%d %H:%M:%S") {
        return Some(dt);
    }
    if let Some(head) = cleaned.get(..19) {
        if let Ok(dt) = NaiveDateTime::parse_from_str(head, "%Y:%m:%d %H:%M:%S") {
            return Some(dt);
        }
    }
    let date_part = cleaned.split(' ').next()?;
    let d = chrono::NaiveDate::parse_from_str(date_part, "%Y:%m:%d").ok()?;
    d.and_hms_opt(0, 0, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_parse_standard_form() {
        assert_eq!(
            parse_exif_datetime("2023:06:15 14:30:22"),
            Some(dt(2023, 6, 15, 14, 30, 22))
        );
    }

    #[test]
    fn test_parse_mixed_separators() {
        assert_eq!(
            parse_exif_datetime("2023-06-15 14:30:22"),
            Some(dt(2023, 6, 15, 14, 30, 22))
        );
        assert_eq!(
            parse_exif_datetime("2023/06/15 14.30.22"),
            Some(dt(2023, 6, 15, 14, 30, 22))
        );
        assert_eq!(
            parse_exif_datetime("2023\\06\\15 14:30:22"),
            Some(dt(2023, 6, 15, 14, 30, 22))
        );
    }

    #[test]
    fn test_parse_oversized_tail() {
        assert_eq!(
            parse_exif_datetime("2023:06:15 14:30:22.000"),
            Some(dt(2023, 6, 15, 14, 30, 22))
        );
    }

    #[test]
    fn test_parse_date_only_pads_midnight() {
        assert_eq!(
            parse_exif_datetime("2023:06:15"),
            Some(dt(2023, 6, 15, 0, 0, 0))
        );
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(parse_exif_datetime("0000:00:00 00:00:00"), None);
        assert_eq!(parse_exif_datetime("not a date"), None);
    }

    #[test]
    fn test_non_image_skipped() {
        // .mp4 guesses video/*, so the extractor never opens it.
        assert!(matches!(
            extract(Path::new("/nonexistent/video.mp4"), 10),
            Extraction::NotFound
        ));
    }

    #[test]
    fn test_oversized_skipped() {
        assert!(matches!(
            extract(Path::new("/nonexistent/huge.jpg"), MAX_EXIF_SIZE + 1),
            Extraction::NotFound
        ));
    }
}
