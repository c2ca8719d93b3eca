use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::media::MediaItem;

#[derive(Serialize)]
struct AlbumFile {
    filename: String,
    output_path: String,
}

#[derive(Serialize)]
struct AlbumInfo {
    files: Vec<AlbumFile>,
}

#[derive(Serialize)]
struct AlbumsJson {
    albums: BTreeMap<String, AlbumInfo>,
}

/// Write an `albums.json` manifest mapping album names to the organized
/// files that belong to them. The `None` grouping is not an album and never
/// appears here.
pub fn write_albums_json(
    items: &[MediaItem],
    placed: &[Option<PathBuf>],
    output_dir: &Path,
    manifest_path: &Path,
) -> anyhow::Result<()> {
    let mut albums: BTreeMap<String, Vec<AlbumFile>> = BTreeMap::new();

    for (item, dest) in items.iter().zip(placed.iter()) {
        let Some(dest) = dest else { continue };
        let filename = dest
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        for album_name in item.album_names() {
            let relative = dest
                .strip_prefix(output_dir)
                .unwrap_or(dest)
                .to_string_lossy()
                .replace('\\', "/");
            albums
                .entry(album_name.to_string())
                .or_default()
                .push(AlbumFile {
                    filename: filename.clone(),
                    output_path: relative,
                });
        }
    }

    let json = AlbumsJson {
        albums: albums
            .into_iter()
            .map(|(name, files)| (name, AlbumInfo { files }))
            .collect(),
    };

    let file = std::fs::File::create(manifest_path)?;
    serde_json::to_writer_pretty(file, &json)?;

    Ok(())
}
