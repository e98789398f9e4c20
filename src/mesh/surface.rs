//! Polygonal surface mesh with named per-point attributes.
//!
//! A [`SurfaceMesh`] stores point coordinates, VTP-style polygon topology
//! (flat connectivity plus cumulative offsets), named per-point attribute
//! arrays, and named global field values. Per-point arrays must have one
//! tuple per point; the append operation and the VTP writer rely on this
//! alignment.

/// Payload of a named attribute array.
///
/// The variants mirror the data array types the VTP output declares, so an
/// array survives a write/read cycle with its type intact.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeData {
    /// 32-bit signed integers, one per tuple.
    Int32(Vec<i32>),
    /// 32-bit floats, `components` values per tuple.
    Float32 { components: usize, values: Vec<f32> },
    /// 64-bit floats, `components` values per tuple.
    Float64 { components: usize, values: Vec<f64> },
    /// One string per tuple.
    String(Vec<String>),
}

impl AttributeData {
    /// Single-component Float32 array.
    pub fn scalars_f32(values: Vec<f32>) -> Self {
        AttributeData::Float32 {
            components: 1,
            values,
        }
    }

    /// Single-component Float64 array.
    pub fn scalars_f64(values: Vec<f64>) -> Self {
        AttributeData::Float64 {
            components: 1,
            values,
        }
    }

    /// Number of tuples in the array.
    pub fn len(&self) -> usize {
        match self {
            AttributeData::Int32(values) => values.len(),
            AttributeData::Float32 { components, values } => {
                if *components == 0 {
                    0
                } else {
                    values.len() / components
                }
            }
            AttributeData::Float64 { components, values } => {
                if *components == 0 {
                    0
                } else {
                    values.len() / components
                }
            }
            AttributeData::String(values) => values.len(),
        }
    }

    /// True when the array holds no tuples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Values per tuple.
    pub fn components(&self) -> usize {
        match self {
            AttributeData::Int32(_) | AttributeData::String(_) => 1,
            AttributeData::Float32 { components, .. }
            | AttributeData::Float64 { components, .. } => *components,
        }
    }

    /// Type tag used when serializing and when matching arrays across meshes.
    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeData::Int32(_) => "Int32",
            AttributeData::Float32 { .. } => "Float32",
            AttributeData::Float64 { .. } => "Float64",
            AttributeData::String(_) => "String",
        }
    }

    /// Append another array of the same type and component count.
    ///
    /// Returns false (leaving self untouched) when the types or component
    /// counts differ.
    pub fn append(&mut self, other: &AttributeData) -> bool {
        match (self, other) {
            (AttributeData::Int32(a), AttributeData::Int32(b)) => {
                a.extend_from_slice(b);
                true
            }
            (
                AttributeData::Float32 {
                    components: ca,
                    values: a,
                },
                AttributeData::Float32 {
                    components: cb,
                    values: b,
                },
            ) if ca == cb => {
                a.extend_from_slice(b);
                true
            }
            (
                AttributeData::Float64 {
                    components: ca,
                    values: a,
                },
                AttributeData::Float64 {
                    components: cb,
                    values: b,
                },
            ) if ca == cb => {
                a.extend_from_slice(b);
                true
            }
            (AttributeData::String(a), AttributeData::String(b)) => {
                a.extend_from_slice(b);
                true
            }
            _ => false,
        }
    }

    /// Gather the tuples at `indices` into a new array of the same type.
    ///
    /// Out-of-range indices contribute nothing.
    pub fn subset(&self, indices: &[usize]) -> AttributeData {
        match self {
            AttributeData::Int32(values) => AttributeData::Int32(
                indices
                    .iter()
                    .filter_map(|&i| values.get(i).copied())
                    .collect(),
            ),
            AttributeData::Float32 { components, values } => {
                let mut out = Vec::with_capacity(indices.len() * components);
                for &i in indices {
                    let start = i * components;
                    if start + components <= values.len() {
                        out.extend_from_slice(&values[start..start + components]);
                    }
                }
                AttributeData::Float32 {
                    components: *components,
                    values: out,
                }
            }
            AttributeData::Float64 { components, values } => {
                let mut out = Vec::with_capacity(indices.len() * components);
                for &i in indices {
                    let start = i * components;
                    if start + components <= values.len() {
                        out.extend_from_slice(&values[start..start + components]);
                    }
                }
                AttributeData::Float64 {
                    components: *components,
                    values: out,
                }
            }
            AttributeData::String(values) => AttributeData::String(
                indices
                    .iter()
                    .filter_map(|&i| values.get(i).cloned())
                    .collect(),
            ),
        }
    }
}

/// Polygonal surface mesh.
///
/// Topology uses the VTP convention: `connectivity` holds the point indices
/// of every polygon back to back, and `offsets[p]` is the cumulative end of
/// polygon `p` within `connectivity`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceMesh {
    /// Point coordinates.
    pub points: Vec<[f64; 3]>,
    /// Flat polygon connectivity, indices into `points`.
    pub connectivity: Vec<u32>,
    /// Cumulative end offset of each polygon in `connectivity`.
    pub offsets: Vec<u32>,
    /// Named per-point arrays, in insertion order.
    pub point_data: Vec<(String, AttributeData)>,
    /// Named global scalar values, in insertion order.
    pub field_data: Vec<(String, f32)>,
}

impl SurfaceMesh {
    /// Empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mesh with points and no topology yet.
    pub fn with_points(points: Vec<[f64; 3]>) -> Self {
        Self {
            points,
            ..Self::default()
        }
    }

    /// Number of points.
    pub fn n_points(&self) -> usize {
        self.points.len()
    }

    /// Number of polygons.
    pub fn n_polys(&self) -> usize {
        self.offsets.len()
    }

    /// True when the mesh has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Append one polygon given its point indices.
    pub fn push_poly(&mut self, indices: &[u32]) {
        self.connectivity.extend_from_slice(indices);
        self.offsets.push(self.connectivity.len() as u32);
    }

    /// Point indices of polygon `p`.
    pub fn poly(&self, p: usize) -> &[u32] {
        let end = self.offsets[p] as usize;
        let start = if p == 0 {
            0
        } else {
            self.offsets[p - 1] as usize
        };
        &self.connectivity[start..end]
    }

    /// Insert or replace a named per-point array.
    pub fn set_point_array(&mut self, name: &str, data: AttributeData) {
        if let Some(entry) = self.point_data.iter_mut().find(|(n, _)| n == name) {
            entry.1 = data;
        } else {
            self.point_data.push((name.to_string(), data));
        }
    }

    /// Named per-point array, if present.
    pub fn point_array(&self, name: &str) -> Option<&AttributeData> {
        self.point_data
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data)
    }

    /// Insert or replace a named global field value.
    pub fn set_field_value(&mut self, name: &str, value: f32) {
        if let Some(entry) = self.field_data.iter_mut().find(|(n, _)| n == name) {
            entry.1 = value;
        } else {
            self.field_data.push((name.to_string(), value));
        }
    }

    /// Named global field value, if present.
    pub fn field_value(&self, name: &str) -> Option<f32> {
        self.field_data
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| *value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_poly_tracks_offsets() {
        let mut mesh = SurfaceMesh::with_points(vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
        ]);
        mesh.push_poly(&[0, 1, 2]);
        mesh.push_poly(&[1, 3, 2]);

        assert_eq!(mesh.n_polys(), 2);
        assert_eq!(mesh.offsets, vec![3, 6]);
        assert_eq!(mesh.poly(0), &[0, 1, 2]);
        assert_eq!(mesh.poly(1), &[1, 3, 2]);
    }

    #[test]
    fn test_set_point_array_replaces_same_name() {
        let mut mesh = SurfaceMesh::with_points(vec![[0.0; 3], [1.0; 3]]);
        mesh.set_point_array("id", AttributeData::Int32(vec![1, 1]));
        mesh.set_point_array("id", AttributeData::Int32(vec![2, 2]));

        assert_eq!(mesh.point_data.len(), 1);
        assert_eq!(
            mesh.point_array("id"),
            Some(&AttributeData::Int32(vec![2, 2]))
        );
    }

    #[test]
    fn test_field_values() {
        let mut mesh = SurfaceMesh::new();
        mesh.set_field_value("TimeValue", 3.0);
        assert_eq!(mesh.field_value("TimeValue"), Some(3.0));
        assert_eq!(mesh.field_value("missing"), None);
    }

    #[test]
    fn test_attribute_append_type_mismatch() {
        let mut a = AttributeData::Int32(vec![1, 2]);
        let b = AttributeData::scalars_f32(vec![1.0]);
        assert!(!a.append(&b));
        assert_eq!(a.len(), 2);

        let c = AttributeData::Int32(vec![3]);
        assert!(a.append(&c));
        assert_eq!(a, AttributeData::Int32(vec![1, 2, 3]));
    }

    #[test]
    fn test_attribute_append_component_mismatch() {
        let mut a = AttributeData::Float64 {
            components: 3,
            values: vec![0.0; 6],
        };
        let b = AttributeData::scalars_f64(vec![1.0]);
        assert!(!a.append(&b));
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_attribute_subset_gathers_tuples() {
        let a = AttributeData::Float64 {
            components: 2,
            values: vec![0.0, 0.1, 1.0, 1.1, 2.0, 2.1],
        };
        let sub = a.subset(&[2, 0]);
        assert_eq!(
            sub,
            AttributeData::Float64 {
                components: 2,
                values: vec![2.0, 2.1, 0.0, 0.1],
            }
        );

        let s = AttributeData::String(vec!["a".into(), "b".into()]);
        assert_eq!(
            s.subset(&[1]),
            AttributeData::String(vec!["b".to_string()])
        );
    }
}
