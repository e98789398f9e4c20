//! # vtk2vtp
//!
//! Batch conversion of per-component legacy VTK time series into combined
//! per-timestep VTP surface meshes for time-series visualization.
//!
//! The merge pipeline is built from:
//! - Timestep discovery and index alignment across component file sets
//! - Tolerant multi-strategy legacy VTK reading
//! - Normalization of volumetric and unstructured data to polygonal
//!   surfaces
//! - Per-point component provenance tagging
//! - Geometric append of component surfaces into one mesh per timestep
//! - Self-describing ASCII VTP output with a time annotation
//!
//! All per-file and per-timestep failures are recovered locally; a run
//! converts as many timesteps as the inputs allow.

pub mod component;
pub mod index;
pub mod io;
pub mod mesh;
pub mod pipeline;
pub mod toolkit;

// Re-export main types for convenience
pub use component::{
    component_id_for_label, tag_surface, ComponentKind, COMPONENT_ID_ARRAY, COMPONENT_NAME_ARRAY,
};
pub use index::{extract_timestep, IndexError, TimestepIndex};
pub use io::{write_pvd, write_vtp, LegacyError, VtpError, XmlError};
pub use mesh::{append_surfaces, normalize_to_surface, AttributeData, RawMesh, SurfaceMesh};
pub use pipeline::{
    combine_timestep, run_pipeline, PipelineError, RunTally, COLLECTION_FILE_NAME,
    OUTPUT_DIR_NAME, TIME_VALUE_FIELD,
};
pub use toolkit::{MeshToolkit, ReadFailure, ReadStrategy, StrategyError};
