//! Component taxonomy and provenance tagging.
//!
//! A casting simulation run is split across a primary dataset plus a fixed
//! set of named sub-components, each stored under its own subdirectory.
//! Tagging attaches uniform per-point identity arrays to a surface so
//! downstream filters can select points by the component that contributed
//! them.

use crate::mesh::{AttributeData, SurfaceMesh};

/// Point-data array holding the integer component identifier.
pub const COMPONENT_ID_ARRAY: &str = "ComponentID";
/// Point-data array holding the component label.
pub const COMPONENT_NAME_ARRAY: &str = "ComponentName";

/// The fixed set of components a source tree may contain.
///
/// `GravityCasting` is the primary per-timestep dataset in the source root;
/// the remaining kinds live under subdirectories named after their label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// Primary per-timestep dataset.
    GravityCasting,
    /// Inlet geometry.
    Inlet,
    /// Cast model geometry.
    Model,
    /// Riser geometry.
    Riser,
}

impl ComponentKind {
    /// Sub-components stored under their own subdirectories, in processing
    /// order.
    pub const SUB_COMPONENTS: [ComponentKind; 3] = [
        ComponentKind::Inlet,
        ComponentKind::Model,
        ComponentKind::Riser,
    ];

    /// Integer identifier written to the `ComponentID` array.
    pub fn id(&self) -> i32 {
        match self {
            ComponentKind::GravityCasting => 1,
            ComponentKind::Inlet => 2,
            ComponentKind::Model => 3,
            ComponentKind::Riser => 4,
        }
    }

    /// Label text, also the subdirectory name for sub-components.
    pub fn label(&self) -> &'static str {
        match self {
            ComponentKind::GravityCasting => "gravityCasting",
            ComponentKind::Inlet => "inlet",
            ComponentKind::Model => "model",
            ComponentKind::Riser => "riser",
        }
    }

    /// Kind for a label, if the label is in the taxonomy.
    pub fn from_label(label: &str) -> Option<ComponentKind> {
        match label {
            "gravityCasting" => Some(ComponentKind::GravityCasting),
            "inlet" => Some(ComponentKind::Inlet),
            "model" => Some(ComponentKind::Model),
            "riser" => Some(ComponentKind::Riser),
            _ => None,
        }
    }
}

/// Identifier for a label, 0 for anything outside the fixed taxonomy.
pub fn component_id_for_label(label: &str) -> i32 {
    ComponentKind::from_label(label)
        .map(|kind| kind.id())
        .unwrap_or(0)
}

/// Attach uniform `ComponentID` and `ComponentName` point arrays.
///
/// Both arrays get one tuple per point, every tuple carrying the same
/// value. Empty meshes and empty labels are left untouched.
pub fn tag_surface(mesh: &mut SurfaceMesh, label: &str) {
    let n = mesh.n_points();
    if n == 0 || label.is_empty() {
        return;
    }

    let id = component_id_for_label(label);
    mesh.set_point_array(COMPONENT_ID_ARRAY, AttributeData::Int32(vec![id; n]));
    mesh.set_point_array(
        COMPONENT_NAME_ARRAY,
        AttributeData::String(vec![label.to_string(); n]),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers_are_fixed() {
        assert_eq!(ComponentKind::GravityCasting.id(), 1);
        assert_eq!(ComponentKind::Inlet.id(), 2);
        assert_eq!(ComponentKind::Model.id(), 3);
        assert_eq!(ComponentKind::Riser.id(), 4);
    }

    #[test]
    fn test_label_round_trip() {
        for kind in [ComponentKind::GravityCasting, ComponentKind::Inlet] {
            assert_eq!(ComponentKind::from_label(kind.label()), Some(kind));
        }
        assert_eq!(ComponentKind::from_label("mold"), None);
    }

    #[test]
    fn test_unknown_label_maps_to_zero() {
        assert_eq!(component_id_for_label("gravityCasting"), 1);
        assert_eq!(component_id_for_label("mold"), 0);
        assert_eq!(component_id_for_label(""), 0);
    }

    #[test]
    fn test_tag_attaches_uniform_arrays() {
        let mut mesh = SurfaceMesh::with_points(vec![[0.0; 3]; 3]);
        tag_surface(&mut mesh, "riser");

        assert_eq!(
            mesh.point_array(COMPONENT_ID_ARRAY),
            Some(&AttributeData::Int32(vec![4, 4, 4]))
        );
        assert_eq!(
            mesh.point_array(COMPONENT_NAME_ARRAY),
            Some(&AttributeData::String(vec!["riser".to_string(); 3]))
        );
    }

    #[test]
    fn test_tag_skips_empty_mesh_and_label() {
        let mut empty = SurfaceMesh::new();
        tag_surface(&mut empty, "inlet");
        assert!(empty.point_data.is_empty());

        let mut mesh = SurfaceMesh::with_points(vec![[0.0; 3]]);
        tag_surface(&mut mesh, "");
        assert!(mesh.point_data.is_empty());
    }
}
