//! Topology files on disk.
//!
//! Saving serializes the whole topology first, writes it to a temporary file
//! next to the destination, and atomically renames it into place, so a
//! failed save never leaves a partial file behind.

use crate::error::StoreError;
use crate::topology::{self, Topology};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append `.json` unless the path already carries that extension.
pub fn with_json_extension(path: &Path) -> PathBuf {
    match path.extension() {
        Some(ext) if ext == "json" => path.to_path_buf(),
        _ => {
            let mut os = path.as_os_str().to_owned();
            os.push(".json");
            PathBuf::from(os)
        }
    }
}

/// Write the canonical form of `topology` to `path` (with `.json`
/// appended if missing). Returns the path actually written.
pub fn save_topology(path: &Path, topology: &Topology) -> Result<PathBuf, StoreError> {
    let path = with_json_extension(path);
    let bytes = topology::save(topology);

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let io_err = |source| StoreError::Io {
        path: path.clone(),
        source,
    };

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(io_err)?;
    tmp.write_all(&bytes).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(&path).map_err(|e| StoreError::Persist {
        path: path.clone(),
        source: e.error,
    })?;

    log::info!("saved {} edge(s) to {}", topology.canonicalize().len(), path.display());
    Ok(path)
}

/// Read and validate a topology file.
pub fn load_topology(path: &Path) -> Result<Topology, StoreError> {
    let bytes = fs::read(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let topo = topology::load(&bytes).map_err(|source| StoreError::Format {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("loaded {} edge(s) from {}", topo.len(), path.display());
    Ok(topo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::generate_flat;
    use pretty_assertions::assert_eq;

    #[test]
    fn extension_is_appended_once() {
        assert_eq!(with_json_extension(Path::new("a/b")), PathBuf::from("a/b.json"));
        assert_eq!(with_json_extension(Path::new("a/b.json")), PathBuf::from("a/b.json"));
        assert_eq!(with_json_extension(Path::new("a/b.txt")), PathBuf::from("a/b.txt.json"));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let topo = generate_flat(4, 1);

        let written = save_topology(&dir.path().join("flat"), &topo).unwrap();
        assert_eq!(written, dir.path().join("flat.json"));

        let text = fs::read_to_string(&written).unwrap();
        assert!(text.starts_with("[\n   [\"h1\", \"s1\"],\n"));

        let loaded = load_topology(&written).unwrap();
        assert!(loaded.equivalent(&topo));
    }

    #[test]
    fn save_overwrites_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.json");
        save_topology(&path, &generate_flat(5, 1)).unwrap();
        save_topology(&path, &generate_flat(1, 1)).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[\n   [\"h1\", \"s1\"]\n]\n");
        // No temporary files left behind.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_topology(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    fn invalid_file_is_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"[["h1","x9"]]"#).unwrap();
        let err = load_topology(&path).unwrap_err();
        assert!(matches!(err, StoreError::Format { .. }));
    }

    #[test]
    fn save_into_missing_directory_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let err = save_topology(&dir.path().join("missing/t.json"), &generate_flat(1, 1)).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }
}
