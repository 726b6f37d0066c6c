//! On-the-fly concatenation of mapfile fragments.
//!
//! Fragments contain map body statements only. The combined file wraps them
//! in exactly one `MAP` / `END` pair and is written next to the first
//! fragment so relative paths inside the fragments keep resolving.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::MapfileError;
use crate::lexer::tokenize;

/// Join fragment texts into one mapfile, in the given order.
pub fn concatenate_sources<S: AsRef<str>>(fragments: &[S]) -> Result<String, MapfileError> {
    if fragments.is_empty() {
        return Err(MapfileError::NoFragments);
    }

    let mut output = String::from("MAP\n");
    for (index, fragment) in fragments.iter().enumerate() {
        let fragment = fragment.as_ref();
        let starts_with_map = tokenize(fragment)?
            .first()
            .map(|token| token.is_keyword("MAP"))
            .unwrap_or(false);
        if starts_with_map {
            return Err(MapfileError::FragmentHasWrapper { index });
        }

        output.push_str(fragment);
        if !fragment.ends_with('\n') {
            output.push('\n');
        }
    }
    output.push_str("END\n");
    Ok(output)
}

/// File name of the combined mapfile: `_<stem1>_<stem2>....map`.
pub fn concatenated_file_name<P: AsRef<Path>>(fragments: &[P]) -> String {
    let mut name = String::new();
    for fragment in fragments {
        let stem = fragment
            .as_ref()
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        name.push('_');
        name.push_str(&stem);
    }
    name.push_str(".map");
    name
}

/// A combined mapfile on disk, removed when dropped.
#[derive(Debug)]
pub struct ConcatenatedMapfile {
    path: PathBuf,
}

impl ConcatenatedMapfile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ConcatenatedMapfile {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => info!(path = %self.path.display(), "Removed concatenated mapfile"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove concatenated mapfile"),
        }
    }
}

/// Concatenate mapfile fragments into a new file beside the first one.
pub fn concatenate_files<P: AsRef<Path>>(fragments: &[P]) -> Result<ConcatenatedMapfile, MapfileError> {
    let first: &Path = fragments.first().ok_or(MapfileError::NoFragments)?.as_ref();

    let sources = fragments
        .iter()
        .map(|path| {
            let path: &Path = path.as_ref();
            fs::read_to_string(path).map_err(|source| MapfileError::Io {
                path: path.to_path_buf(),
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let combined = concatenate_sources(&sources)?;

    let directory = first
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let directory = directory.canonicalize().map_err(|source| MapfileError::Io {
        path: directory.to_path_buf(),
        source,
    })?;
    let path = directory.join(concatenated_file_name(fragments));

    fs::write(&path, combined).map_err(|source| MapfileError::Io {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), fragments = fragments.len(), "Wrote concatenated mapfile");

    Ok(ConcatenatedMapfile { path })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name() {
        let name = concatenated_file_name(&["map/base.map", "map/layers.map"]);
        assert_eq!(name, "_base_layers.map");
    }

    #[test]
    fn test_wrapper_rejected() {
        let err = concatenate_sources(&["NAME a", "MAP LAYER END END"]).unwrap_err();
        assert!(matches!(err, MapfileError::FragmentHasWrapper { index: 1 }));
    }

    #[test]
    fn test_empty_list() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            concatenate_sources(&empty),
            Err(MapfileError::NoFragments)
        ));
    }
}
