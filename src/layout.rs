use std::path::{Path, PathBuf};

const RAW_DIR: &str = "raw_difficulty_table_data";
const MERGED_DIR: &str = "difficulty_table_data";
const CATALOG_FILE: &str = "difficulty_tables.json";
const MERGED_FILE: &str = "merged_difficulty_tables.json";

/// Where every file of a project lives, relative to its root directory.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.root.join(RAW_DIR)
    }

    pub fn merged_dir(&self) -> PathBuf {
        self.root.join(MERGED_DIR)
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.raw_dir().join(CATALOG_FILE)
    }

    pub fn raw_table_path(&self, internal_file_name: &str) -> PathBuf {
        self.raw_dir().join(format!("{internal_file_name}.json"))
    }

    pub fn merged_output_path(&self) -> PathBuf {
        self.merged_dir().join(MERGED_FILE)
    }
}
