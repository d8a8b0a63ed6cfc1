use crate::domain::error::{AppError, Result};
use std::path::Path;

/// File formats the service can load into a [`Table`](crate::domain::table::Table).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabularFormat {
    Csv,
    Xlsx,
    Xls,
}

impl TabularFormat {
    pub fn from_filename(filename: &str) -> Result<Self> {
        let extension = extension_of(filename).ok_or_else(|| {
            AppError::UnsupportedFormat(format!("'{}' has no file extension", filename))
        })?;
        Self::from_extension(&extension)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AppError::UnsupportedFormat(format!("{}", path.display())))?;
        Self::from_filename(name)
    }

    pub fn from_extension(extension: &str) -> Result<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "csv" => Ok(TabularFormat::Csv),
            "xlsx" => Ok(TabularFormat::Xlsx),
            "xls" => Ok(TabularFormat::Xls),
            other => Err(AppError::UnsupportedFormat(format!(
                "unsupported file extension '{}'",
                other
            ))),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            TabularFormat::Csv => "csv",
            TabularFormat::Xlsx => "xlsx",
            TabularFormat::Xls => "xls",
        }
    }
}

/// Lowercased text after the last `.`, if any.
pub fn extension_of(filename: &str) -> Option<String> {
    let (_, extension) = filename.rsplit_once('.')?;
    if extension.is_empty() {
        return None;
    }
    Some(extension.to_ascii_lowercase())
}
