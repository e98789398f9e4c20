//! Timestep discovery and component file alignment.
//!
//! A source tree holds primary files named `gravityCasting_<timestep>.vtk`
//! in its root, plus one optional subdirectory per sub-component with that
//! component's file sequence:
//!
//! ```text
//! VTK/
//!   gravityCasting_0.vtk
//!   gravityCasting_1.vtk
//!   inlet/
//!     inlet_a.vtk
//!     inlet_b.vtk
//!   model/
//!   riser/
//! ```
//!
//! Timesteps come from primary file names only, never from listing order.
//! Component sequences are aligned to timesteps by list index; the lists
//! are sorted lexicographically by file name. Nothing validates that a
//! component sequence is actually time-ordered, so inconsistently named
//! component files pair with the wrong timestep silently.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::component::ComponentKind;

/// Literal prefix of primary file names.
pub const PRIMARY_PREFIX: &str = "gravityCasting_";
/// Extension of the input mesh files.
pub const MESH_EXTENSION: &str = "vtk";

/// Error type for source-tree scanning.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Directory listing failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The root path is not a directory.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Aligned view of a source tree.
#[derive(Debug, Clone)]
pub struct TimestepIndex {
    primaries: BTreeMap<u32, PathBuf>,
    components: Vec<(ComponentKind, Vec<PathBuf>)>,
}

impl TimestepIndex {
    /// Scan a source tree.
    ///
    /// Primary files are the root entries matching
    /// `gravityCasting_*.vtk`; each contributes the timestep embedded in
    /// its name, with 0 for names whose suffix is not a plain decimal
    /// number. When two primaries claim the same timestep the
    /// lexicographically later name wins. Component lists come from the
    /// fixed sub-component directories; a missing directory is an empty
    /// list.
    pub fn scan(root: &Path) -> Result<TimestepIndex, IndexError> {
        if !root.is_dir() {
            return Err(IndexError::NotADirectory(root.to_path_buf()));
        }

        println!("=== Scanning for VTK files in: {} ===", root.display());

        let mut primary_names = Vec::new();
        for entry in std::fs::read_dir(root)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(PRIMARY_PREFIX) && name.ends_with(&format!(".{MESH_EXTENSION}")) {
                primary_names.push((name, path));
            }
        }
        // Sorted insertion keeps the same-timestep winner deterministic.
        primary_names.sort();

        let n_primary = primary_names.len();
        let mut primaries = BTreeMap::new();
        for (name, path) in primary_names {
            let timestep = extract_timestep(&name).unwrap_or(0);
            primaries.insert(timestep, path);
        }

        println!("Found {} primary gravityCasting files", n_primary);
        println!(
            "Timesteps: {:?}",
            primaries.keys().copied().collect::<Vec<_>>()
        );

        let mut components = Vec::new();
        for kind in ComponentKind::SUB_COMPONENTS {
            let dir = root.join(kind.label());
            let mut files = Vec::new();
            if dir.is_dir() {
                for entry in std::fs::read_dir(&dir)? {
                    let entry = entry?;
                    let path = entry.path();
                    if path.is_file()
                        && path
                            .extension()
                            .is_some_and(|ext| ext.eq_ignore_ascii_case(MESH_EXTENSION))
                    {
                        files.push(path);
                    }
                }
                files.sort_by_key(|path| path.file_name().map(|n| n.to_os_string()));
                println!("{}: {} files", kind.label(), files.len());
            } else {
                println!("{}: directory not found", kind.label());
            }
            components.push((kind, files));
        }

        Ok(TimestepIndex {
            primaries,
            components,
        })
    }

    /// Distinct timesteps in ascending order.
    pub fn timesteps(&self) -> Vec<u32> {
        self.primaries.keys().copied().collect()
    }

    /// Primary file for a timestep.
    pub fn primary(&self, timestep: u32) -> Option<&Path> {
        self.primaries.get(&timestep).map(PathBuf::as_path)
    }

    /// Ordered file list of a sub-component (empty when the directory is
    /// absent).
    pub fn component_files(&self, kind: ComponentKind) -> &[PathBuf] {
        self.components
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, files)| files.as_slice())
            .unwrap_or(&[])
    }

    /// Number of primary files discovered.
    pub fn n_primaries(&self) -> usize {
        self.primaries.len()
    }
}

/// Timestep embedded in a primary file name.
///
/// `gravityCasting_0042.vtk` yields 42; names without the literal prefix,
/// the `.vtk` extension, or a plain decimal suffix yield `None`.
pub fn extract_timestep(file_name: &str) -> Option<u32> {
    let stem = file_name.strip_suffix(&format!(".{MESH_EXTENSION}"))?;
    let digits = stem.strip_prefix(PRIMARY_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_extract_timestep_matches() {
        assert_eq!(extract_timestep("gravityCasting_0.vtk"), Some(0));
        assert_eq!(extract_timestep("gravityCasting_0042.vtk"), Some(42));
        assert_eq!(extract_timestep("gravityCasting_117.vtk"), Some(117));
    }

    #[test]
    fn test_extract_timestep_rejects() {
        assert_eq!(extract_timestep("gravityCasting_.vtk"), None);
        assert_eq!(extract_timestep("gravityCasting_final.vtk"), None);
        assert_eq!(extract_timestep("gravityCasting_1.vtu"), None);
        assert_eq!(extract_timestep("other_1.vtk"), None);
        // Overflowing digit strings are not plain timesteps.
        assert_eq!(extract_timestep("gravityCasting_99999999999.vtk"), None);
    }

    #[test]
    fn test_scan_collects_primaries_and_components() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("gravityCasting_0.vtk"));
        touch(&dir.path().join("gravityCasting_2.vtk"));
        touch(&dir.path().join("notes.txt"));

        fs::create_dir(dir.path().join("inlet")).unwrap();
        touch(&dir.path().join("inlet/inlet_b.vtk"));
        touch(&dir.path().join("inlet/inlet_a.vtk"));
        touch(&dir.path().join("inlet/readme.md"));

        let index = TimestepIndex::scan(dir.path()).unwrap();

        assert_eq!(index.timesteps(), vec![0, 2]);
        assert!(index.primary(0).is_some());
        assert!(index.primary(1).is_none());

        let inlet = index.component_files(ComponentKind::Inlet);
        assert_eq!(inlet.len(), 2);
        // Lexicographic order by file name.
        assert!(inlet[0].ends_with("inlet_a.vtk"));
        assert!(inlet[1].ends_with("inlet_b.vtk"));

        assert!(index.component_files(ComponentKind::Model).is_empty());
        assert!(index.component_files(ComponentKind::Riser).is_empty());
    }

    #[test]
    fn test_non_matching_primary_defaults_to_zero() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("gravityCasting_final.vtk"));

        let index = TimestepIndex::scan(dir.path()).unwrap();
        assert_eq!(index.timesteps(), vec![0]);
    }

    #[test]
    fn test_missing_root_is_error() {
        assert!(matches!(
            TimestepIndex::scan(Path::new("/nonexistent/tree")),
            Err(IndexError::NotADirectory(_))
        ));
    }
}
