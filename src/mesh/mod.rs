//! Mesh data model: parsed raw datasets, polygonal surfaces, surface
//! normalization, and geometric append.

mod append;
mod normalize;
pub mod raw;
mod surface;

pub use append::append_surfaces;
pub use normalize::normalize_to_surface;
pub use raw::{Cell, RawMesh, StructuredGrid, UnstructuredGrid};
pub use surface::{AttributeData, SurfaceMesh};
