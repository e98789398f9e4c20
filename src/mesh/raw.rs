//! Raw datasets as produced by a format parse, before surface normalization.
//!
//! The legacy format stores several topological kinds; everything a reader
//! can hand to the normalizer is one of the [`RawMesh`] variants. A raw mesh
//! lives only between one read and one normalization, so the variants keep
//! the parsed data as-is rather than indexing it.

use crate::mesh::surface::{AttributeData, SurfaceMesh};

/// VTK cell type codes carried by unstructured datasets.
pub mod cell_type {
    pub const VERTEX: u8 = 1;
    pub const POLY_VERTEX: u8 = 2;
    pub const LINE: u8 = 3;
    pub const POLY_LINE: u8 = 4;
    pub const TRIANGLE: u8 = 5;
    pub const TRIANGLE_STRIP: u8 = 6;
    pub const POLYGON: u8 = 7;
    pub const PIXEL: u8 = 8;
    pub const QUAD: u8 = 9;
    pub const TETRA: u8 = 10;
    pub const VOXEL: u8 = 11;
    pub const HEXAHEDRON: u8 = 12;
    pub const WEDGE: u8 = 13;
    pub const PYRAMID: u8 = 14;
}

/// One explicit cell of an unstructured grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// VTK cell type code.
    pub cell_type: u8,
    /// Point indices, in the ordering the cell type defines.
    pub points: Vec<u32>,
}

/// Explicit-topology dataset (unstructured grid).
#[derive(Debug, Clone, Default)]
pub struct UnstructuredGrid {
    /// Point coordinates.
    pub points: Vec<[f64; 3]>,
    /// Explicit cells.
    pub cells: Vec<Cell>,
    /// Named per-point arrays.
    pub point_data: Vec<(String, AttributeData)>,
}

/// Lattice-topology dataset.
///
/// Structured points, structured grids, and rectilinear grids all normalize
/// to this at parse time: an i-fastest lattice of `dims` points per axis
/// with explicit coordinates.
#[derive(Debug, Clone)]
pub struct StructuredGrid {
    /// Points per axis.
    pub dims: [usize; 3],
    /// Point coordinates, x varying fastest.
    pub points: Vec<[f64; 3]>,
    /// Named per-point arrays.
    pub point_data: Vec<(String, AttributeData)>,
}

impl StructuredGrid {
    /// Flat point index of lattice position (i, j, k).
    pub fn point_index(&self, i: usize, j: usize, k: usize) -> usize {
        i + self.dims[0] * (j + self.dims[1] * k)
    }
}

/// A parsed dataset of any topological kind.
#[derive(Debug, Clone)]
pub enum RawMesh {
    /// Already-polygonal data.
    Surface(SurfaceMesh),
    /// Explicit cells with VTK cell types.
    Unstructured(UnstructuredGrid),
    /// Point lattice.
    Structured(StructuredGrid),
}

impl RawMesh {
    /// Number of points in the dataset.
    pub fn n_points(&self) -> usize {
        match self {
            RawMesh::Surface(mesh) => mesh.n_points(),
            RawMesh::Unstructured(grid) => grid.points.len(),
            RawMesh::Structured(grid) => grid.points.len(),
        }
    }

    /// Short name of the topological kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            RawMesh::Surface(_) => "polydata",
            RawMesh::Unstructured(_) => "unstructured grid",
            RawMesh::Structured(_) => "structured grid",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_point_index_is_x_fastest() {
        let grid = StructuredGrid {
            dims: [3, 4, 5],
            points: Vec::new(),
            point_data: Vec::new(),
        };
        assert_eq!(grid.point_index(0, 0, 0), 0);
        assert_eq!(grid.point_index(1, 0, 0), 1);
        assert_eq!(grid.point_index(0, 1, 0), 3);
        assert_eq!(grid.point_index(0, 0, 1), 12);
        assert_eq!(grid.point_index(2, 3, 4), 2 + 3 * 3 + 12 * 4);
    }

    #[test]
    fn test_n_points_per_kind() {
        let surface = SurfaceMesh::with_points(vec![[0.0; 3]; 4]);
        assert_eq!(RawMesh::Surface(surface).n_points(), 4);

        let grid = UnstructuredGrid {
            points: vec![[0.0; 3]; 7],
            ..Default::default()
        };
        assert_eq!(RawMesh::Unstructured(grid).n_points(), 7);
    }
}
