use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;

use crate::markdown;
use crate::meta::DocMeta;

/// One row of the blog index. `date` is the display form, empty when the
/// post has no date. Serialized as-is into the `blogEntries` template key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlogEntry {
    pub slug: String,
    pub title: String,
    pub date: String,
}

#[derive(Debug)]
pub enum BlogError {
    Io { dir: PathBuf, source: std::io::Error },
}

impl fmt::Display for BlogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlogError::Io { dir, source } => {
                write!(f, "failed to read blog directory {}: {}", dir.display(), source)
            }
        }
    }
}

impl std::error::Error for BlogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BlogError::Io { source, .. } => Some(source),
        }
    }
}

/// Builds the blog index by scanning `dir` on every call.
///
/// Subdirectories and non-`.md` entries are skipped. Each remaining file
/// is rendered and its metadata extracted; a file that fails to read or
/// carries a malformed date is skipped with a warning rather than taking
/// the whole index down. Entries come back sorted: dateless posts first,
/// then ascending by date, stable within equal keys.
pub fn scan<P: AsRef<Path>>(dir: P) -> Result<Vec<BlogEntry>, BlogError> {
    let dir = dir.as_ref();
    let read_dir = std::fs::read_dir(dir).map_err(|source| BlogError::Io {
        dir: dir.to_path_buf(),
        source,
    })?;

    let mut dated: Vec<(Option<NaiveDate>, BlogEntry)> = Vec::new();
    let mut paths: Vec<PathBuf> = read_dir
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .collect();
    // Directory iteration order is platform-dependent; fix it so equal
    // sort keys come out in a deterministic order.
    paths.sort();

    for path in paths {
        if path.is_dir() || path.extension().map(|ext| ext != "md").unwrap_or(true) {
            continue;
        }
        let Some(slug) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
            continue;
        };

        let result = match markdown::render_file(&path) {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!("skipping {}: {}", path.display(), err);
                continue;
            }
        };
        let meta = match DocMeta::from_fields(&result.fields) {
            Ok(meta) => meta,
            Err(err) => {
                tracing::warn!("skipping {}: {}", path.display(), err);
                continue;
            }
        };

        let ordinal = meta.date.as_ref().map(|d| d.ordinal());
        dated.push((
            ordinal,
            BlogEntry {
                slug,
                title: meta.title.unwrap_or_default(),
                date: meta.date.map(|d| d.display().to_string()).unwrap_or_default(),
            },
        ));
    }

    dated.sort_by_key(|(ordinal, _)| *ordinal);
    Ok(dated.into_iter().map(|(_, entry)| entry).collect())
}
