use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use rayon::prelude::*;

use crate::errors::{ErrorLog, Severity};
use crate::hash::{self, ContentDigest};
use crate::media::MediaItem;
use crate::{ThrottledProgress, DEDUP_SPAN};

pub struct DedupOutcome {
    /// Surviving canonical items, discovery order preserved
    pub items: Vec<MediaItem>,
    pub duplicates_merged: u64,
}

/// Collapse byte-identical items into canonical ones.
///
/// Two-level bucketing keeps hashing cheap: items are grouped by exact size
/// first, and only multi-member size buckets are hashed at all. Oversized
/// files get the [`ContentDigest::TooLargeToHash`] marker and are excluded
/// from merging entirely; the marker cannot discriminate distinct files.
pub fn consolidate(
    mut items: Vec<MediaItem>,
    progress: &ThrottledProgress,
    errors: &ErrorLog,
) -> DedupOutcome {
    // Level 1: size buckets. Singletons are unique without any I/O.
    let mut size_groups: HashMap<u64, Vec<usize>> = HashMap::new();
    for (i, m) in items.iter().enumerate() {
        size_groups.entry(m.size).or_default().push(i);
    }

    let needs_hash: Vec<usize> = size_groups
        .values()
        .filter(|indices| indices.len() > 1)
        .flatten()
        .copied()
        .collect();

    // Level 2: hash the remaining candidates in parallel.
    let mut digests: HashMap<usize, ContentDigest> = HashMap::new();
    if !needs_hash.is_empty() {
        let total = needs_hash.len() as u64;
        let counter = AtomicU64::new(0);
        let hashed: Vec<(usize, Option<ContentDigest>)> = needs_hash
            .par_iter()
            .map(|&i| {
                let m = &items[i];
                let digest = match hash::digest_file(&m.primary_file, m.size) {
                    Ok(d) => Some(d),
                    Err(e) => {
                        // Unreadable candidates stay unique rather than
                        // killing the phase.
                        errors.record_io(Severity::Warning, &m.primary_file, &e, "failed to hash");
                        None
                    }
                };
                let current = counter.fetch_add(1, Ordering::Relaxed);
                progress.report_span(DEDUP_SPAN, current, total, "Hashing duplicate candidates");
                (i, digest)
            })
            .collect();
        for (i, digest) in hashed {
            if let Some(d) = digest {
                digests.insert(i, d);
            }
        }
    }

    // Bucket by (size, digest). Sentinel-tagged items never co-bucket.
    let mut groups: HashMap<(u64, String), Vec<usize>> = HashMap::new();
    for (&i, digest) in &digests {
        if let ContentDigest::Hashed(hex) = digest {
            groups
                .entry((items[i].size, hex.clone()))
                .or_default()
                .push(i);
        }
    }

    // Merge each bucket into its first-seen member.
    let mut removed: Vec<usize> = Vec::new();
    let mut duplicates_merged = 0u64;
    for indices in groups.values_mut() {
        if indices.len() < 2 {
            continue;
        }
        indices.sort_unstable();
        let canon_idx = indices[0];
        for &dup_idx in &indices[1..] {
            let (albums, date) = {
                let dup = &mut items[dup_idx];
                (std::mem::take(&mut dup.albums), dup.date.take())
            };
            let canon = &mut items[canon_idx];
            // Album union; the first-seen file reference wins per grouping.
            for (key, file) in albums {
                canon.albums.entry(key).or_insert(file);
            }
            // Lowest accuracy rank wins; ties keep the first-seen date.
            if let Some(d) = date {
                match canon.date {
                    Some(existing) if existing.accuracy <= d.accuracy => {}
                    _ => canon.date = Some(d),
                }
            }
            removed.push(dup_idx);
            duplicates_merged += 1;
        }
    }

    let mut keep = vec![true; items.len()];
    for &i in &removed {
        keep[i] = false;
    }
    let items = items
        .into_iter()
        .enumerate()
        .filter(|(i, _)| keep[*i])
        .map(|(_, item)| item)
        .collect();

    DedupOutcome {
        items,
        duplicates_merged,
    }
}
