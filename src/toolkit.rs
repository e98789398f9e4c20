//! Mesh-format capability.
//!
//! [`MeshToolkit`] bundles the ordered read strategies and the surface
//! writer behind one object, constructed once at startup and passed by
//! reference to everything that touches mesh files. There is no global
//! availability flag; the capability either exists or the program never
//! started.
//!
//! Reading tries each strategy in order and accepts the first non-empty
//! mesh. Every strategy error is converted into a per-file
//! [`ReadFailure`]; a raw parse error never escapes to the caller.

use std::path::Path;

use thiserror::Error;

use crate::io::legacy::{LegacyDataSetReader, LegacyError, LegacyUnstructuredReader};
use crate::io::vtp::{write_vtp, VtpError};
use crate::io::xml::{XmlError, XmlPolyDataReader};
use crate::mesh::{RawMesh, SurfaceMesh};

/// Error from a single read strategy.
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error(transparent)]
    Legacy(#[from] LegacyError),
    #[error(transparent)]
    Xml(#[from] XmlError),
}

/// One way to parse bytes into a mesh.
///
/// Strategies are capability-checked: `can_read` is a cheap header sniff
/// that lets the toolkit skip strategies that cannot apply, and `read`
/// does the full parse.
pub trait ReadStrategy {
    /// Short name for diagnostics.
    fn name(&self) -> &'static str;

    /// Cheap applicability check on the raw bytes.
    fn can_read(&self, bytes: &[u8]) -> bool;

    /// Full parse.
    fn read(&self, bytes: &[u8]) -> Result<RawMesh, StrategyError>;
}

/// Why a file produced no mesh.
#[derive(Debug, Error)]
pub enum ReadFailure {
    /// The file could not be read at all.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Every strategy failed or produced an empty mesh.
    #[error("no strategy produced a non-empty mesh ({})", attempts.join("; "))]
    Exhausted {
        /// Outcome of each strategy, in try order.
        attempts: Vec<String>,
    },
}

/// The mesh-format capability object.
pub struct MeshToolkit {
    strategies: Vec<Box<dyn ReadStrategy>>,
}

impl MeshToolkit {
    /// Capability with the standard strategy order: strict legacy, lenient
    /// unstructured legacy, XML polydata.
    pub fn new() -> Self {
        Self {
            strategies: vec![
                Box::new(LegacyDataSetReader),
                Box::new(LegacyUnstructuredReader),
                Box::new(XmlPolyDataReader),
            ],
        }
    }

    /// Read a mesh file, trying each strategy in order.
    ///
    /// The first strategy that parses a mesh with at least one point wins.
    /// The file is read once and released before parsing starts.
    pub fn read_mesh(&self, path: &Path) -> Result<RawMesh, ReadFailure> {
        let bytes = std::fs::read(path)?;

        let mut attempts = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            if !strategy.can_read(&bytes) {
                attempts.push(format!("{}: not applicable", strategy.name()));
                continue;
            }
            match strategy.read(&bytes) {
                Ok(mesh) if mesh.n_points() > 0 => return Ok(mesh),
                Ok(_) => attempts.push(format!("{}: empty mesh", strategy.name())),
                Err(error) => attempts.push(format!("{}: {}", strategy.name(), error)),
            }
        }
        Err(ReadFailure::Exhausted { attempts })
    }

    /// Serialize a surface to a VTP file.
    pub fn write_surface(&self, mesh: &SurfaceMesh, path: &Path) -> Result<(), VtpError> {
        write_vtp(mesh, path)
    }
}

impl Default for MeshToolkit {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_reads_legacy_ascii() {
        let file = write_temp(
            "# vtk DataFile Version 3.0\n\
             tet\n\
             ASCII\n\
             DATASET UNSTRUCTURED_GRID\n\
             POINTS 4 float\n\
             0 0 0  1 0 0  0 1 0  0 0 1\n\
             CELLS 1 5\n\
             4 0 1 2 3\n\
             CELL_TYPES 1\n\
             10\n",
        );

        let toolkit = MeshToolkit::new();
        let mesh = toolkit.read_mesh(file.path()).unwrap();
        assert_eq!(mesh.n_points(), 4);
    }

    #[test]
    fn test_lenient_strategy_recovers_odd_file() {
        // Unknown section makes the strict parse fail; the lenient
        // unstructured strategy skips it.
        let file = write_temp(
            "# vtk DataFile Version 3.0\n\
             odd\n\
             ASCII\n\
             DATASET UNSTRUCTURED_GRID\n\
             POINTS 3 float\n\
             0 0 0  1 0 0  0 1 0\n\
             BOUNDARY_MARKERS on\n\
             CELLS 1 4\n\
             3 0 1 2\n\
             CELL_TYPES 1\n\
             5\n",
        );

        let toolkit = MeshToolkit::new();
        let mesh = toolkit.read_mesh(file.path()).unwrap();
        assert_eq!(mesh.n_points(), 3);
    }

    #[test]
    fn test_garbage_exhausts_strategies() {
        let file = write_temp("not a mesh at all\n");

        let toolkit = MeshToolkit::new();
        let result = toolkit.read_mesh(file.path());
        let Err(ReadFailure::Exhausted { attempts }) = result else {
            panic!("expected exhaustion");
        };
        assert_eq!(attempts.len(), 3);
    }

    #[test]
    fn test_empty_mesh_counts_as_failure() {
        let file = write_temp(
            "# vtk DataFile Version 3.0\n\
             empty\n\
             ASCII\n\
             DATASET UNSTRUCTURED_GRID\n\
             POINTS 0 float\n\
             CELLS 0 0\n\
             CELL_TYPES 0\n",
        );

        let toolkit = MeshToolkit::new();
        assert!(matches!(
            toolkit.read_mesh(file.path()),
            Err(ReadFailure::Exhausted { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_io_failure() {
        let toolkit = MeshToolkit::new();
        assert!(matches!(
            toolkit.read_mesh(Path::new("/nonexistent/file.vtk")),
            Err(ReadFailure::Io(_))
        ));
    }
}
