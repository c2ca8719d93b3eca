use std::path::Path;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::{Captures, Regex};

/// One recognized naming convention: a pattern plus its own typed
/// capture-builder. Builders validate every field; an out-of-range capture
/// makes the pattern a non-match and the table moves on.
struct NamePattern {
    tag: &'static str,
    regex: &'static LazyLock<Regex>,
    build: fn(&Captures) -> Option<NaiveDateTime>,
}

static COMPACT_DASH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<y>(?:19|20)\d{2})(?P<m>\d{2})(?P<d>\d{2})-(?P<h>\d{2})(?P<mi>\d{2})(?P<s>\d{2})").unwrap()
});
static COMPACT_UNDERSCORE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<y>(?:19|20)\d{2})(?P<m>\d{2})(?P<d>\d{2})_(?P<h>\d{2})(?P<mi>\d{2})(?P<s>\d{2})").unwrap()
});
static DASHED_COMPACT_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<y>(?:19|20)\d{2})-(?P<m>\d{2})-(?P<d>\d{2})-(?P<h>\d{2})(?P<mi>\d{2})(?P<s>\d{2})").unwrap()
});
static DASHED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<y>(?:19|20)\d{2})-(?P<m>\d{2})-(?P<d>\d{2})-(?P<h>\d{2})-(?P<mi>\d{2})-(?P<s>\d{2})").unwrap()
});
static UNDERSCORED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<y>(?:19|20)\d{2})_(?P<m>\d{2})_(?P<d>\d{2})_(?P<h>\d{2})_(?P<mi>\d{2})_(?P<s>\d{2})").unwrap()
});
static WHATSAPP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:IMG|VID)-(?P<y>(?:19|20)\d{2})(?P<m>\d{2})(?P<d>\d{2})-WA\d+").unwrap()
});
static COMPACT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<y>(?:19|20)\d{2})(?P<m>\d{2})(?P<d>\d{2})(?P<h>\d{2})(?P<mi>\d{2})(?P<s>\d{2})").unwrap()
});

/// Evaluation order matters: specific shapes before the bare digit run,
/// date-only shapes before it as well. First pattern that matches and
/// validates wins.
static PATTERNS: &[NamePattern] = &[
    NamePattern { tag: "compact-dash", regex: &COMPACT_DASH_RE, build: ymd_hms },
    NamePattern { tag: "compact-underscore", regex: &COMPACT_UNDERSCORE_RE, build: ymd_hms },
    NamePattern { tag: "dashed-compact-time", regex: &DASHED_COMPACT_TIME_RE, build: ymd_hms },
    NamePattern { tag: "dashed", regex: &DASHED_RE, build: ymd_hms },
    NamePattern { tag: "underscored", regex: &UNDERSCORED_RE, build: ymd_hms },
    NamePattern { tag: "whatsapp", regex: &WHATSAPP_RE, build: ymd_noon },
    NamePattern { tag: "compact", regex: &COMPACT_RE, build: ymd_hms },
];

/// Guess a capture time from the filename alone (directory ignored).
pub fn guess_from_path(path: &Path) -> Option<NaiveDateTime> {
    let basename = path.file_name().and_then(|n| n.to_str())?;
    guess_from_name(basename)
}

pub fn guess_from_name(basename: &str) -> Option<NaiveDateTime> {
    match_pattern(basename).map(|(_, dt)| dt)
}

/// Like [`guess_from_name`], but also reports which pattern won.
pub fn match_pattern(basename: &str) -> Option<(&'static str, NaiveDateTime)> {
    for pat in PATTERNS {
        if let Some(caps) = pat.regex.captures(basename) {
            if let Some(dt) = (pat.build)(&caps) {
                return Some((pat.tag, dt));
            }
            // Matched but failed validation: treat as non-matching and let
            // a later, looser pattern have a go.
        }
    }
    None
}

fn field(caps: &Captures, name: &str) -> Option<u32> {
    caps.name(name)?.as_str().parse().ok()
}

fn build_datetime(y: u32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> Option<NaiveDateTime> {
    if !(1900..=2100).contains(&y) {
        return None;
    }
    NaiveDate::from_ymd_opt(y as i32, m, d)?.and_hms_opt(h, mi, s)
}

fn ymd_hms(caps: &Captures) -> Option<NaiveDateTime> {
    build_datetime(
        field(caps, "y")?,
        field(caps, "m")?,
        field(caps, "d")?,
        field(caps, "h")?,
        field(caps, "mi")?,
        field(caps, "s")?,
    )
}

/// Date-only shapes default to noon.
fn ymd_noon(caps: &Captures) -> Option<NaiveDateTime> {
    build_datetime(field(caps, "y")?, field(caps, "m")?, field(caps, "d")?, 12, 0, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_screenshot_name() {
        assert_eq!(
            guess_from_name("Screenshot_20190919-053857.jpg"),
            Some(dt(2019, 9, 19, 5, 38, 57))
        );
    }

    #[test]
    fn test_camera_name() {
        assert_eq!(
            guess_from_name("IMG_20230615_143022.jpg"),
            Some(dt(2023, 6, 15, 14, 30, 22))
        );
        assert_eq!(
            guess_from_name("VID_20190509_154733.mp4"),
            Some(dt(2019, 5, 9, 15, 47, 33))
        );
    }

    #[test]
    fn test_signal_name() {
        assert_eq!(
            guess_from_name("signal-2020-10-26-163832.jpg"),
            Some(dt(2020, 10, 26, 16, 38, 32))
        );
    }

    #[test]
    fn test_fully_dashed_name() {
        assert_eq!(
            guess_from_name("2020-10-26-16-38-32.jpg"),
            Some(dt(2020, 10, 26, 16, 38, 32))
        );
    }

    #[test]
    fn test_underscored_name() {
        assert_eq!(
            guess_from_name("2016_01_30_11_49_15.mp4"),
            Some(dt(2016, 1, 30, 11, 49, 15))
        );
    }

    #[test]
    fn test_whatsapp_name_defaults_to_noon() {
        assert_eq!(
            guess_from_name("IMG-20230615-WA0001.jpg"),
            Some(dt(2023, 6, 15, 12, 0, 0))
        );
        assert_eq!(
            guess_from_name("VID-20211224-WA0042.mp4"),
            Some(dt(2021, 12, 24, 12, 0, 0))
        );
    }

    #[test]
    fn test_bare_compact_name() {
        assert_eq!(
            guess_from_name("20230615143022.jpg"),
            Some(dt(2023, 6, 15, 14, 30, 22))
        );
    }

    #[test]
    fn test_out_of_range_fields_rejected() {
        // Month 13
        assert_eq!(guess_from_name("IMG_20231315_143022.jpg"), None);
        // February 30th
        assert_eq!(guess_from_name("IMG_20230230_143022.jpg"), None);
        // Hour 25
        assert_eq!(guess_from_name("IMG_20230615_253022.jpg"), None);
    }

    #[test]
    fn test_no_pattern() {
        assert_eq!(guess_from_name("random_photo.jpg"), None);
        assert_eq!(guess_from_name("DSC.jpg"), None);
    }

    #[test]
    fn test_pattern_attribution() {
        assert_eq!(match_pattern("IMG_20230615_143022.jpg").unwrap().0, "compact-underscore");
        assert_eq!(match_pattern("Screenshot_20190919-053857.jpg").unwrap().0, "compact-dash");
        assert_eq!(match_pattern("signal-2020-10-26-163832.jpg").unwrap().0, "dashed-compact-time");
        assert_eq!(match_pattern("IMG-20230615-WA0001.jpg").unwrap().0, "whatsapp");
        assert_eq!(match_pattern("20230615143022.jpg").unwrap().0, "compact");
    }
}
