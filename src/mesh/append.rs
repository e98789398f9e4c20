//! Geometric append of surface meshes.
//!
//! Appending concatenates the point lists of all inputs in registration
//! order and renumbers each input's polygon connectivity by its point base
//! offset, so no polygon ever references a point outside the range its own
//! input contributed.
//!
//! Per-point attribute arrays follow intersection semantics: an array
//! survives only when every input carries it under the same name, type, and
//! component count. That keeps every surviving array position-aligned with
//! the concatenated point list. Arrays missing from some input are dropped
//! with a console note. Input field values are not carried over; the caller
//! stamps the combined result.

use crate::mesh::surface::SurfaceMesh;

/// Append surfaces into one mesh.
///
/// Returns `None` for an empty input list. Point count of the result is the
/// sum of the input point counts.
pub fn append_surfaces(inputs: Vec<SurfaceMesh>) -> Option<SurfaceMesh> {
    let first = inputs.first()?;

    // Arrays kept: present in every input with matching type and shape.
    let kept_names: Vec<String> = first
        .point_data
        .iter()
        .filter(|(name, data)| {
            inputs.iter().all(|mesh| {
                mesh.point_array(name).is_some_and(|other| {
                    other.type_name() == data.type_name()
                        && other.components() == data.components()
                })
            })
        })
        .map(|(name, _)| name.clone())
        .collect();

    for mesh in &inputs {
        for (name, _) in &mesh.point_data {
            if !kept_names.iter().any(|kept| kept == name) {
                println!("  dropping point array '{name}': not present on every input");
            }
        }
    }

    let mut result = SurfaceMesh::new();
    for mesh in inputs {
        let base = result.points.len() as u32;

        result
            .connectivity
            .extend(mesh.connectivity.iter().map(|&index| index + base));
        let conn_base = if let Some(&last) = result.offsets.last() {
            last
        } else {
            0
        };
        result
            .offsets
            .extend(mesh.offsets.iter().map(|&offset| offset + conn_base));
        result.points.extend_from_slice(&mesh.points);

        for name in &kept_names {
            // Lookup cannot fail: kept names were verified on every input.
            let Some(data) = mesh.point_array(name) else {
                continue;
            };
            match result.point_data.iter_mut().find(|(n, _)| n == name) {
                Some((_, existing)) => {
                    existing.append(data);
                }
                None => result.point_data.push((name.clone(), data.clone())),
            }
        }
    }

    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::surface::AttributeData;

    fn triangle(origin: f64) -> SurfaceMesh {
        let mut mesh = SurfaceMesh::with_points(vec![
            [origin, 0.0, 0.0],
            [origin + 1.0, 0.0, 0.0],
            [origin, 1.0, 0.0],
        ]);
        mesh.push_poly(&[0, 1, 2]);
        mesh
    }

    #[test]
    fn test_empty_input_yields_none() {
        assert!(append_surfaces(Vec::new()).is_none());
    }

    #[test]
    fn test_points_concatenate_in_order() {
        let combined = append_surfaces(vec![triangle(0.0), triangle(10.0)]).unwrap();

        assert_eq!(combined.n_points(), 6);
        assert_eq!(combined.points[0], [0.0, 0.0, 0.0]);
        assert_eq!(combined.points[3], [10.0, 0.0, 0.0]);
    }

    #[test]
    fn test_connectivity_renumbered_per_input() {
        let combined = append_surfaces(vec![triangle(0.0), triangle(10.0)]).unwrap();

        assert_eq!(combined.n_polys(), 2);
        assert_eq!(combined.poly(0), &[0, 1, 2]);
        assert_eq!(combined.poly(1), &[3, 4, 5]);
        assert_eq!(combined.offsets, vec![3, 6]);
    }

    #[test]
    fn test_shared_arrays_concatenate() {
        let mut a = triangle(0.0);
        a.set_point_array("ComponentID", AttributeData::Int32(vec![1; 3]));
        let mut b = triangle(10.0);
        b.set_point_array("ComponentID", AttributeData::Int32(vec![2; 3]));

        let combined = append_surfaces(vec![a, b]).unwrap();

        assert_eq!(
            combined.point_array("ComponentID"),
            Some(&AttributeData::Int32(vec![1, 1, 1, 2, 2, 2]))
        );
    }

    #[test]
    fn test_unshared_arrays_dropped() {
        let mut a = triangle(0.0);
        a.set_point_array("Temperature", AttributeData::scalars_f32(vec![300.0; 3]));
        let b = triangle(10.0);

        let combined = append_surfaces(vec![a, b]).unwrap();

        assert!(combined.point_array("Temperature").is_none());
        assert_eq!(combined.n_points(), 6);
    }

    #[test]
    fn test_type_mismatch_drops_array() {
        let mut a = triangle(0.0);
        a.set_point_array("v", AttributeData::scalars_f32(vec![1.0; 3]));
        let mut b = triangle(10.0);
        b.set_point_array("v", AttributeData::scalars_f64(vec![1.0; 3]));

        let combined = append_surfaces(vec![a, b]).unwrap();
        assert!(combined.point_array("v").is_none());
    }

    #[test]
    fn test_single_input_passes_through() {
        let mut a = triangle(0.0);
        a.set_point_array("ComponentID", AttributeData::Int32(vec![3; 3]));

        let combined = append_surfaces(vec![a.clone()]).unwrap();
        assert_eq!(combined.points, a.points);
        assert_eq!(combined.connectivity, a.connectivity);
        assert_eq!(
            combined.point_array("ComponentID"),
            a.point_array("ComponentID")
        );
    }
}
