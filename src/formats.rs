use serde::{Deserialize, Deserializer, Serialize};

/// One entry of `difficulty_tables.json`.
///
/// Every field is read leniently: a missing, `null` or wrongly typed value
/// falls back to its default, and `catalog::missing_required_field` decides
/// whether the entry is usable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDescriptor {
    #[serde(default, deserialize_with = "lenient_text")]
    pub internal_file_name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub short_name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub url: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub table_full_name: String,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub skip_merge: bool,
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(present_text(deserializer)?.unwrap_or_default())
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Bool(flag) => flag,
        serde_json::Value::String(s) => {
            let s = s.trim();
            s.eq_ignore_ascii_case("true") || s == "1"
        }
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    })
}

impl SourceDescriptor {
    /// Name used in log lines; falls back to the file stem when the catalog
    /// omits the full name.
    pub fn display_name(&self) -> &str {
        if self.table_full_name.trim().is_empty() {
            &self.internal_file_name
        } else {
            &self.table_full_name
        }
    }
}

/// `<internalFileName>.json` as written by `fetch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTableFile {
    #[serde(default)]
    pub short_name: String,
    pub songs: serde_json::Value,
}

/// The fields of an upstream song record that the merger reads. Everything
/// else in the record is ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawSongEntry {
    #[serde(default, deserialize_with = "present_text")]
    pub md5: Option<String>,
    #[serde(default, deserialize_with = "present_text")]
    pub sha256: Option<String>,
    #[serde(default, deserialize_with = "present_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present_text")]
    pub artist: Option<String>,
    #[serde(default)]
    pub level: serde_json::Value,
}

// Upstream tables disagree on types: accept strings and numbers, treat
// everything else (and the empty string) as absent.
fn present_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelAssignment {
    pub level: serde_json::Value,
    pub table: String,
    #[serde(rename = "shortName")]
    pub short_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedSong {
    pub md5: Option<String>,
    pub sha256: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub levels: Vec<LevelAssignment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedDataset {
    #[serde(rename = "Last Update")]
    pub last_update: String,
    pub tables: Vec<String>,
    pub songs: Vec<MergedSong>,
}
