use crate::domain::error::{AppError, Result};
use crate::domain::table::Table;
use crate::infrastructure::tabular::{TableWriter, TabularFormat};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]").unwrap());

const WINDOWS_DEVICE_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

pub const CLEANED_PREFIX: &str = "cleaned_";

/// Name and location of a file written by [`UploadStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub name: String,
    pub path: PathBuf,
}

/// Flat directory holding uploaded originals and their cleaned derivatives.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ensure(&self) -> Result<()> {
        ensure_dir(&self.root)?;
        Ok(())
    }

    pub fn path_of(&self, stored_name: &str) -> PathBuf {
        self.root.join(secure_filename(stored_name))
    }

    /// Write raw upload bytes under a sanitised version of `original_name`.
    /// An existing file with the same sanitised name is replaced.
    pub fn save(&self, bytes: &[u8], original_name: &str) -> Result<StoredFile> {
        let name = secure_filename(original_name);
        if name.is_empty() {
            return Err(AppError::ValidationError(format!(
                "'{}' is not a usable file name",
                original_name
            )));
        }

        self.ensure()?;
        let path = self.root.join(&name);
        fs::write(&path, bytes)
            .map_err(|e| AppError::IoError(format!("Failed to write {}: {}", path.display(), e)))?;

        Ok(StoredFile { name, path })
    }

    /// Persist a cleaned table next to its source, in the source's format.
    pub fn save_table(&self, table: &Table, source_name: &str) -> Result<StoredFile> {
        let name = cleaned_name(source_name)?;
        self.ensure()?;
        let path = self.root.join(&name);
        TableWriter::write(table, &path)?;
        Ok(StoredFile { name, path })
    }
}

/// `cleaned_<name>`; legacy `.xls` sources become `.xlsx`.
pub fn cleaned_name(source_name: &str) -> Result<String> {
    let source_name = secure_filename(source_name);
    let name = match TabularFormat::from_filename(&source_name)? {
        TabularFormat::Xls => {
            let stem = &source_name[..source_name.len() - ".xls".len()];
            format!("{}.{}", stem, TabularFormat::Xlsx.extension())
        }
        _ => source_name,
    };
    Ok(format!("{}{}", CLEANED_PREFIX, name))
}

/// Reduce a client-supplied name to a single safe path component:
/// non-ASCII dropped, separators and whitespace collapsed to `_`, anything
/// outside `[A-Za-z0-9_.-]` removed, leading/trailing `.`/`_` stripped.
pub fn secure_filename(name: &str) -> String {
    let ascii: String = name.chars().filter(|c| c.is_ascii()).collect();
    let spaced = ascii.replace(['/', '\\'], " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(&joined, "");
    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_').to_string();

    let stem = trimmed.split('.').next().unwrap_or_default().to_ascii_uppercase();
    if WINDOWS_DEVICE_NAMES.contains(&stem.as_str()) {
        return format!("_{}", trimmed);
    }

    trimmed
}

fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}
