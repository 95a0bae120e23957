use std::collections::HashMap;

use anyhow::Context as _;

use crate::cli::MergeArgs;
use crate::formats::{LevelAssignment, MergedDataset, MergedSong, RawSongEntry, SourceDescriptor};
use crate::layout::ProjectLayout;

const LAST_UPDATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Counters describing one merge pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub tables_merged: usize,
    pub tables_skipped: usize,
    pub tables_failed: usize,
    pub records_merged: usize,
    pub records_dropped: usize,
    /// sha256-filed songs left out of the output because a later record
    /// backfilled an md5 into them.
    pub sha256_songs_excluded: usize,
}

pub fn run(args: MergeArgs) -> anyhow::Result<()> {
    let layout = ProjectLayout::new(&args.root);
    let catalog = crate::catalog::load(&layout.catalog_path())?;

    let last_update = chrono::Local::now().format(LAST_UPDATE_FORMAT).to_string();
    let (dataset, report) = merge(
        &catalog,
        |source| {
            crate::store::load_table_songs(&layout.raw_table_path(&source.internal_file_name))
        },
        last_update,
    );

    tracing::info!(
        tables = report.tables_merged,
        skipped = report.tables_skipped,
        failed = report.tables_failed,
        records = report.records_merged,
        dropped = report.records_dropped,
        songs = dataset.songs.len(),
        "merge finished"
    );
    if report.sha256_songs_excluded > 0 {
        tracing::warn!(
            count = report.sha256_songs_excluded,
            "sha256-only songs gained an md5 during merge and were left out"
        );
    }

    let out_path = layout.merged_output_path();
    crate::store::write_json_pretty(&out_path, &dataset)
        .with_context(|| format!("write merged tables: {}", out_path.display()))?;
    tracing::info!(out = %out_path.display(), "wrote merged tables");

    Ok(())
}

/// Folds every mergeable table of `catalog` into one dataset.
///
/// Records are identified by md5 when they have one and by sha256 otherwise.
/// A song filed under sha256 is never re-filed under md5: a later record
/// carrying both that sha256 and an md5 starts (or joins) a separate md5-filed
/// song, so the same chart can appear twice in the output.
///
/// `load` is called once per non-skipped table; an error skips that table.
pub fn merge<F>(
    catalog: &[SourceDescriptor],
    mut load: F,
    last_update: String,
) -> (MergedDataset, MergeReport)
where
    F: FnMut(&SourceDescriptor) -> anyhow::Result<Vec<RawSongEntry>>,
{
    let mut index = SongIndex::default();
    let mut tables = Vec::new();
    let mut report = MergeReport::default();

    for source in catalog {
        if source.skip_merge {
            tracing::info!(table = source.display_name(), "skipMerge set; skipping");
            report.tables_skipped += 1;
            continue;
        }
        if source.internal_file_name.trim().is_empty() {
            tracing::warn!(
                table = source.display_name(),
                "catalog entry has no internalFileName; skipping"
            );
            report.tables_failed += 1;
            continue;
        }

        let songs = match load(source) {
            Ok(songs) => songs,
            Err(err) => {
                tracing::warn!(
                    table = %source.internal_file_name,
                    error = %format!("{err:#}"),
                    "could not load table; skipping"
                );
                report.tables_failed += 1;
                continue;
            }
        };

        tables.push(source.internal_file_name.clone());
        report.tables_merged += 1;

        let mut dropped = 0usize;
        for song in songs {
            if index.insert(source, song) {
                report.records_merged += 1;
            } else {
                dropped += 1;
            }
        }
        if dropped > 0 {
            tracing::warn!(
                table = %source.internal_file_name,
                dropped,
                "records without md5 or sha256 were dropped"
            );
        }
        report.records_dropped += dropped;
        tracing::debug!(table = %source.internal_file_name, "merged table");
    }

    let (mut songs, excluded) = index.into_songs();
    report.sha256_songs_excluded = excluded;
    songs.sort_by(|a, b| title_key(a).cmp(title_key(b)));

    let dataset = MergedDataset {
        last_update,
        tables,
        songs,
    };
    (dataset, report)
}

fn title_key(song: &MergedSong) -> &str {
    song.title.as_deref().unwrap_or("")
}

/// Songs filed by md5 and by sha256, each kept in first-seen order.
#[derive(Debug, Default)]
struct SongIndex {
    by_md5: Vec<MergedSong>,
    md5_slots: HashMap<String, usize>,
    by_sha256: Vec<MergedSong>,
    sha256_slots: HashMap<String, usize>,
}

impl SongIndex {
    /// Returns `false` when the record has no identity and was dropped.
    fn insert(&mut self, source: &SourceDescriptor, song: RawSongEntry) -> bool {
        let level = LevelAssignment {
            level: song.level,
            table: source.internal_file_name.clone(),
            short_name: source.short_name.clone(),
        };

        let existing = if let Some(md5) = &song.md5 {
            match self.md5_slots.get(md5) {
                Some(&slot) => self.by_md5.get_mut(slot),
                None => None,
            }
        } else if let Some(sha256) = &song.sha256 {
            match self.sha256_slots.get(sha256) {
                Some(&slot) => self.by_sha256.get_mut(slot),
                None => None,
            }
        } else {
            tracing::debug!(
                table = %source.internal_file_name,
                "record has neither md5 nor sha256"
            );
            return false;
        };

        if let Some(existing) = existing {
            existing.levels.push(level);
            fill_if_unset(&mut existing.title, song.title);
            fill_if_unset(&mut existing.artist, song.artist);
            fill_if_unset(&mut existing.md5, song.md5);
            fill_if_unset(&mut existing.sha256, song.sha256);
            return true;
        }

        let merged = MergedSong {
            md5: song.md5,
            sha256: song.sha256,
            title: song.title,
            artist: song.artist,
            levels: vec![level],
        };
        if let Some(md5) = &merged.md5 {
            self.md5_slots.insert(md5.clone(), self.by_md5.len());
            self.by_md5.push(merged);
        } else if let Some(sha256) = &merged.sha256 {
            self.sha256_slots.insert(sha256.clone(), self.by_sha256.len());
            self.by_sha256.push(merged);
        }
        true
    }

    /// md5-filed songs first, then sha256-filed songs that still lack an md5.
    fn into_songs(self) -> (Vec<MergedSong>, usize) {
        let mut songs = self.by_md5;
        let mut excluded = 0usize;
        for song in self.by_sha256 {
            if song.md5.is_some() {
                excluded += 1;
                continue;
            }
            songs.push(song);
        }
        (songs, excluded)
    }
}

fn fill_if_unset(slot: &mut Option<String>, candidate: Option<String>) {
    if slot.is_none() {
        *slot = candidate;
    }
}
