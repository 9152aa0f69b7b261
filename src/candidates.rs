//! Input file discovery and output naming.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use glob::glob;
use log::{debug, info};

use crate::error::SplitError;

/// Lists the files under `work_dir` matching `pattern`, sorted by path.
///
/// Files whose name already contains `suffix` are results of an earlier run and
/// are skipped. Finding nothing is an error.
pub fn find_candidates(work_dir: &Path, pattern: &str, suffix: &str) -> Result<Vec<PathBuf>> {
    let full_pattern = work_dir.join(pattern);
    let full_pattern = full_pattern.to_string_lossy();
    info!("Searching for input files matching '{full_pattern}'");

    let entries =
        glob(&full_pattern).with_context(|| format!("Invalid glob pattern '{full_pattern}'"))?;
    let mut files = Vec::new();
    for entry in entries {
        let path =
            entry.with_context(|| format!("Reading glob entry for pattern '{full_pattern}'"))?;
        if !path.is_file() {
            continue;
        }
        if is_split_result(&path, suffix) {
            debug!("Skipping {path:?}: already carries the result suffix");
            continue;
        }
        files.push(path);
    }
    files.sort();

    if files.is_empty() {
        return Err(SplitError::NoInputFiles(full_pattern.into_owned()).into());
    }
    info!(
        "Found {} file(s): {}",
        files.len(),
        files
            .iter()
            .map(|path| path.display().to_string())
            .collect::<Vec<_>>()
            .join(" ")
    );
    Ok(files)
}

pub fn is_split_result(path: &Path, suffix: &str) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().contains(suffix))
        .unwrap_or(false)
}

/// `dir/name.ext` becomes `dir/name<suffix>.ext`.
pub fn output_path_for(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_stem()
        .map(|stem| stem.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    path.with_file_name(OsString::from(name))
}
