use std::path::Path;

use anyhow::Context as _;

use crate::formats::SourceDescriptor;

/// Loads `difficulty_tables.json`. Any failure here is fatal for the run.
pub fn load(path: &Path) -> anyhow::Result<Vec<SourceDescriptor>> {
    let catalog: Vec<SourceDescriptor> =
        crate::store::read_json(path).context("load difficulty table catalog")?;
    tracing::debug!(path = %path.display(), tables = catalog.len(), "loaded catalog");
    Ok(catalog)
}

/// Checks the fields a phase cannot work without. Returns the reason the entry
/// must be skipped, if any.
pub fn missing_required_field(source: &SourceDescriptor) -> Option<&'static str> {
    if source.internal_file_name.trim().is_empty() {
        return Some("internalFileName");
    }
    if source.url.trim().is_empty() {
        return Some("url");
    }
    None
}
