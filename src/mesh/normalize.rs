//! Conversion of arbitrary datasets to polygonal surfaces.
//!
//! Already-polygonal data passes through unchanged. Cell-based data goes
//! through two extraction strategies in order:
//!
//! 1. Geometry extraction: volumetric cells contribute their external
//!    boundary faces (faces used by exactly one cell), planar cells pass
//!    through as polygons. Lattice datasets are expanded to hexahedral
//!    cells first, so their boundary shell falls out of the same face
//!    accounting.
//! 2. Exhaustive fallback, when the first strategy yields no points: every
//!    face of every volumetric cell plus all planar cells, with no sharing
//!    analysis.
//!
//! Unused points are compacted and per-point attributes are sliced to the
//! surviving points. Malformed cells are skipped, never fatal.

use std::collections::HashMap;

use crate::mesh::raw::{cell_type, Cell, RawMesh, StructuredGrid, UnstructuredGrid};
use crate::mesh::surface::SurfaceMesh;

/// Normalize a parsed dataset to a polygonal surface.
///
/// Returns `None` when no strategy produces geometry with at least one
/// point.
pub fn normalize_to_surface(raw: RawMesh) -> Option<SurfaceMesh> {
    match raw {
        RawMesh::Surface(surface) => (!surface.is_empty()).then_some(surface),
        RawMesh::Unstructured(grid) => normalize_cells(grid),
        RawMesh::Structured(grid) => normalize_cells(lattice_to_cells(grid)?),
    }
}

fn normalize_cells(grid: UnstructuredGrid) -> Option<SurfaceMesh> {
    let primary = extract_geometry(&grid, true);
    let surface = if primary.is_empty() {
        extract_geometry(&grid, false)
    } else {
        primary
    };
    (!surface.is_empty()).then_some(surface)
}

/// True for cell types with 3D topology.
fn is_volumetric(cell_type_code: u8) -> bool {
    matches!(
        cell_type_code,
        cell_type::TETRA
            | cell_type::VOXEL
            | cell_type::HEXAHEDRON
            | cell_type::WEDGE
            | cell_type::PYRAMID
    )
}

/// Faces of a volumetric cell, as local vertex index lists.
fn local_faces(cell_type_code: u8) -> &'static [&'static [usize]] {
    match cell_type_code {
        cell_type::TETRA => &[&[0, 1, 3], &[1, 2, 3], &[2, 0, 3], &[0, 2, 1]],
        cell_type::HEXAHEDRON => &[
            &[0, 4, 7, 3],
            &[1, 2, 6, 5],
            &[0, 1, 5, 4],
            &[3, 7, 6, 2],
            &[0, 3, 2, 1],
            &[4, 5, 6, 7],
        ],
        cell_type::VOXEL => &[
            &[0, 4, 6, 2],
            &[1, 3, 7, 5],
            &[0, 1, 5, 4],
            &[2, 6, 7, 3],
            &[0, 2, 3, 1],
            &[4, 5, 7, 6],
        ],
        cell_type::WEDGE => &[
            &[0, 1, 2],
            &[3, 5, 4],
            &[0, 3, 4, 1],
            &[1, 4, 5, 2],
            &[2, 5, 3, 0],
        ],
        cell_type::PYRAMID => &[
            &[0, 3, 2, 1],
            &[0, 1, 4],
            &[1, 2, 4],
            &[2, 3, 4],
            &[3, 0, 4],
        ],
        _ => &[],
    }
}

/// Expected point count for a fixed-arity cell type, if fixed.
fn fixed_arity(cell_type_code: u8) -> Option<usize> {
    match cell_type_code {
        cell_type::TRIANGLE => Some(3),
        cell_type::PIXEL | cell_type::QUAD | cell_type::TETRA => Some(4),
        cell_type::PYRAMID => Some(5),
        cell_type::WEDGE => Some(6),
        cell_type::VOXEL | cell_type::HEXAHEDRON => Some(8),
        _ => None,
    }
}

/// Faces of a volumetric cell in global point indices.
///
/// Cells whose arity does not match their type yield no faces.
fn cell_faces(cell: &Cell) -> Vec<Vec<u32>> {
    if let Some(arity) = fixed_arity(cell.cell_type) {
        if cell.points.len() != arity {
            return Vec::new();
        }
    }
    local_faces(cell.cell_type)
        .iter()
        .map(|face| face.iter().map(|&local| cell.points[local]).collect())
        .collect()
}

/// Polygons contributed directly by a planar cell.
fn cell_polygons(cell: &Cell) -> Vec<Vec<u32>> {
    match cell.cell_type {
        cell_type::TRIANGLE | cell_type::QUAD => {
            if fixed_arity(cell.cell_type) == Some(cell.points.len()) {
                vec![cell.points.clone()]
            } else {
                Vec::new()
            }
        }
        cell_type::POLYGON => {
            if cell.points.len() >= 3 {
                vec![cell.points.clone()]
            } else {
                Vec::new()
            }
        }
        cell_type::PIXEL => {
            if cell.points.len() == 4 {
                let p = &cell.points;
                vec![vec![p[0], p[1], p[3], p[2]]]
            } else {
                Vec::new()
            }
        }
        cell_type::TRIANGLE_STRIP => {
            let p = &cell.points;
            let mut polys = Vec::new();
            for i in 0..p.len().saturating_sub(2) {
                // Alternate orientation so the strip stays consistently wound.
                if i % 2 == 0 {
                    polys.push(vec![p[i], p[i + 1], p[i + 2]]);
                } else {
                    polys.push(vec![p[i + 1], p[i], p[i + 2]]);
                }
            }
            polys
        }
        _ => Vec::new(),
    }
}

/// Extract a surface from explicit cells.
///
/// With `external_only`, volumetric faces used by more than one cell are
/// suppressed; otherwise every face is emitted.
fn extract_geometry(grid: &UnstructuredGrid, external_only: bool) -> SurfaceMesh {
    let n_points = grid.points.len();

    let mut face_counts: HashMap<Vec<u32>, usize> = HashMap::new();
    if external_only {
        for cell in &grid.cells {
            if !is_volumetric(cell.cell_type) {
                continue;
            }
            for face in cell_faces(cell) {
                let mut key = face;
                key.sort_unstable();
                *face_counts.entry(key).or_insert(0) += 1;
            }
        }
    }

    // Second pass emits in cell order, keeping the output deterministic.
    let mut polys: Vec<Vec<u32>> = Vec::new();
    for cell in &grid.cells {
        if is_volumetric(cell.cell_type) {
            for face in cell_faces(cell) {
                if external_only {
                    let mut key = face.clone();
                    key.sort_unstable();
                    if face_counts.get(&key).copied().unwrap_or(0) != 1 {
                        continue;
                    }
                }
                polys.push(face);
            }
        } else {
            polys.extend(cell_polygons(cell));
        }
    }

    polys.retain(|poly| poly.iter().all(|&index| (index as usize) < n_points));

    compact_surface(grid, &polys)
}

/// Build a surface from polygons in global indices, keeping only the points
/// the polygons reference and slicing attributes to match.
fn compact_surface(grid: &UnstructuredGrid, polys: &[Vec<u32>]) -> SurfaceMesh {
    let mut remap: Vec<Option<u32>> = vec![None; grid.points.len()];
    let mut used: Vec<usize> = Vec::new();

    let mut surface = SurfaceMesh::new();
    for poly in polys {
        let mut indices = Vec::with_capacity(poly.len());
        for &old in poly {
            let old = old as usize;
            let new = match remap[old] {
                Some(new) => new,
                None => {
                    let new = used.len() as u32;
                    remap[old] = Some(new);
                    used.push(old);
                    new
                }
            };
            indices.push(new);
        }
        surface.push_poly(&indices);
    }

    surface.points = used.iter().map(|&old| grid.points[old]).collect();
    surface.point_data = grid
        .point_data
        .iter()
        .map(|(name, data)| (name.clone(), data.subset(&used)))
        .collect();
    surface
}

/// Expand a point lattice into hexahedral (or planar quad) cells.
///
/// Lattices with fewer than two axes of extent carry no surface and yield
/// `None`.
fn lattice_to_cells(grid: StructuredGrid) -> Option<UnstructuredGrid> {
    let [nx, ny, nz] = grid.dims;
    if grid.points.len() != nx.saturating_mul(ny).saturating_mul(nz) {
        return None;
    }

    let extents = [nx, ny, nz];
    let varying = extents.iter().filter(|&&n| n > 1).count();
    if varying < 2 {
        return None;
    }

    let mut cells = Vec::new();
    if varying == 2 {
        // Single sheet: quads over the two varying axes.
        for k in 0..nz.max(1) {
            for j in 0..ny.max(1) {
                for i in 0..nx.max(1) {
                    let (di, dj, dk) = (
                        usize::from(nx > 1),
                        usize::from(ny > 1),
                        usize::from(nz > 1),
                    );
                    if i + di >= nx.max(1) && di > 0 {
                        continue;
                    }
                    if j + dj >= ny.max(1) && dj > 0 {
                        continue;
                    }
                    if k + dk >= nz.max(1) && dk > 0 {
                        continue;
                    }
                    // Corner offsets along the two varying axes.
                    let p00 = grid.point_index(i, j, k);
                    let (p10, p11, p01) = if nx > 1 && ny > 1 {
                        (
                            grid.point_index(i + 1, j, k),
                            grid.point_index(i + 1, j + 1, k),
                            grid.point_index(i, j + 1, k),
                        )
                    } else if nx > 1 {
                        (
                            grid.point_index(i + 1, j, k),
                            grid.point_index(i + 1, j, k + 1),
                            grid.point_index(i, j, k + 1),
                        )
                    } else {
                        (
                            grid.point_index(i, j + 1, k),
                            grid.point_index(i, j + 1, k + 1),
                            grid.point_index(i, j, k + 1),
                        )
                    };
                    cells.push(Cell {
                        cell_type: cell_type::QUAD,
                        points: vec![p00 as u32, p10 as u32, p11 as u32, p01 as u32],
                    });
                }
            }
        }
    } else {
        for k in 0..nz - 1 {
            for j in 0..ny - 1 {
                for i in 0..nx - 1 {
                    let points = vec![
                        grid.point_index(i, j, k) as u32,
                        grid.point_index(i + 1, j, k) as u32,
                        grid.point_index(i + 1, j + 1, k) as u32,
                        grid.point_index(i, j + 1, k) as u32,
                        grid.point_index(i, j, k + 1) as u32,
                        grid.point_index(i + 1, j, k + 1) as u32,
                        grid.point_index(i + 1, j + 1, k + 1) as u32,
                        grid.point_index(i, j + 1, k + 1) as u32,
                    ];
                    cells.push(Cell {
                        cell_type: cell_type::HEXAHEDRON,
                        points,
                    });
                }
            }
        }
    }

    Some(UnstructuredGrid {
        points: grid.points,
        cells,
        point_data: grid.point_data,
    })
}
