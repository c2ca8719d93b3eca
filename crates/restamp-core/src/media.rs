use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::date::ResolvedDate;

/// A candidate file produced by discovery. Immutable; the resolve phase
/// consumes it and produces a [`MediaItem`].
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Absolute path of the media file
    pub path: PathBuf,
    /// Album grouping the file was found under, `None` for year folders
    /// and files directly under the input root
    pub album: Option<String>,
    /// File size in bytes
    pub size: u64,
}

/// The unit of work flowing through dedup and organize.
///
/// `albums` maps each grouping (album name, or `None` for "no album") to the
/// file instance filed under it. A fresh item has exactly one entry; the map
/// grows only when the consolidator merges byte-identical items.
#[derive(Debug, Clone)]
pub struct MediaItem {
    pub albums: BTreeMap<Option<String>, PathBuf>,
    /// The first-registered file; used for hashing, size and reading
    pub primary_file: PathBuf,
    pub size: u64,
    pub date: Option<ResolvedDate>,
}

impl MediaItem {
    pub fn new(file: DiscoveredFile, date: Option<ResolvedDate>) -> Self {
        let mut albums = BTreeMap::new();
        albums.insert(file.album, file.path.clone());
        Self {
            albums,
            primary_file: file.path,
            size: file.size,
            date,
        }
    }

    /// Album names (excluding the `None` grouping) this item appears under.
    pub fn album_names(&self) -> impl Iterator<Item = &str> {
        self.albums.keys().filter_map(|k| k.as_deref())
    }
}

/// Record of one placed file, produced by the mover. Report-only.
#[derive(Debug, Clone)]
pub struct OrganizedFile {
    pub source_file: PathBuf,
    pub target_file: PathBuf,
    pub date: Option<ResolvedDate>,
}
