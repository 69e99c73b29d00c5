//! Saving summaries returned by the upload endpoint.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::core::constants::SUMMARY_SUFFIX;

/// File name shown to the user and sent to the backend for `path`.
pub fn upload_file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// `informe.pdf` becomes `informe.pdf_resumen.txt`.
pub fn summary_file_name(original: &str) -> String {
    format!("{original}{SUMMARY_SUFFIX}")
}

/// Write `payload` to `dir/file_name`, replacing any previous file atomically.
pub fn save_summary(dir: &Path, file_name: &str, payload: &[u8]) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let target = dir.join(file_name);

    let mut temp_file = NamedTempFile::new_in(dir)?;
    temp_file.write_all(payload)?;
    temp_file.as_file_mut().sync_all()?;
    temp_file.persist(&target).map_err(|err| err.error)?;
    Ok(target)
}
