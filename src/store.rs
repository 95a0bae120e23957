use std::io::Write as _;
use std::path::Path;

use anyhow::Context as _;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::formats::RawSongEntry;

pub fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse json: {}", path.display()))
}

/// Writes `value` as 4-space indented JSON. Non-ASCII text is written as-is.
///
/// The file is staged next to its destination and renamed into place, so
/// readers never observe a half-written file.
pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let parent_dir = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("output path must have parent: {}", path.display()))?;
    std::fs::create_dir_all(parent_dir)
        .with_context(|| format!("create output dir: {}", parent_dir.display()))?;

    let mut staged = tempfile::NamedTempFile::new_in(parent_dir)
        .with_context(|| format!("create temp file in {}", parent_dir.display()))?;

    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut staged, formatter);
    value
        .serialize(&mut serializer)
        .with_context(|| format!("serialize json: {}", path.display()))?;
    staged.write_all(b"\n").context("write trailing newline")?;
    staged.flush().context("flush temp file")?;

    staged
        .persist(path)
        .map_err(|err| anyhow::anyhow!("persist {}: {}", path.display(), err.error))?;
    Ok(())
}

/// Reads a per-source file and returns its song records.
///
/// Fails when the file is missing, is not JSON, has no `songs` key, or when
/// `songs` is not an array of objects.
pub fn load_table_songs(path: &Path) -> anyhow::Result<Vec<RawSongEntry>> {
    let table: serde_json::Value = read_json(path)?;
    let serde_json::Value::Object(mut table) = table else {
        anyhow::bail!("table file is not a JSON object: {}", path.display());
    };
    let Some(songs) = table.remove("songs") else {
        anyhow::bail!("missing `songs` key: {}", path.display());
    };
    if !songs.is_array() {
        anyhow::bail!("`songs` is not an array: {}", path.display());
    }

    // The file's own `shortName` is ignored; levels take it from the catalog.
    serde_json::from_value(songs)
        .with_context(|| format!("parse song records: {}", path.display()))
}
