//! Integration tests for the conversion pipeline.
//!
//! These tests verify:
//! - Per-timestep combination of primary and sub-component files
//! - Index alignment of component sequences to timesteps
//! - Recovery from unreadable files
//! - Idempotent, deterministic output
//! - The collection index

use std::fs;
use std::path::Path;

use tempfile::tempdir;

use vtk2vtp::{
    run_pipeline, AttributeData, MeshToolkit, RawMesh, COLLECTION_FILE_NAME, COMPONENT_ID_ARRAY,
    COMPONENT_NAME_ARRAY, OUTPUT_DIR_NAME, TIME_VALUE_FIELD,
};

/// One tetrahedron (4 points) shifted along x, in legacy ASCII.
fn tet_vtk(origin: f64) -> String {
    format!(
        "# vtk DataFile Version 3.0\n\
         solidification data\n\
         ASCII\n\
         DATASET UNSTRUCTURED_GRID\n\
         POINTS 4 float\n\
         {o} 0 0\n\
         {x} 0 0\n\
         {o} 1 0\n\
         {o} 0 1\n\
         CELLS 1 5\n\
         4 0 1 2 3\n\
         CELL_TYPES 1\n\
         10\n",
        o = origin,
        x = origin + 1.0
    )
}

fn read_output(toolkit: &MeshToolkit, path: &Path) -> vtk2vtp::SurfaceMesh {
    let RawMesh::Surface(surface) = toolkit.read_mesh(path).unwrap() else {
        panic!("output should read back as polydata");
    };
    surface
}

#[test]
fn test_primary_plus_one_component() {
    let dir = tempdir().unwrap();
    let root = dir.path();

    // Two timesteps of primary data, two inlet files, model and riser
    // absent.
    fs::write(root.join("gravityCasting_0.vtk"), tet_vtk(0.0)).unwrap();
    fs::write(root.join("gravityCasting_1.vtk"), tet_vtk(1.0)).unwrap();
    fs::create_dir(root.join("inlet")).unwrap();
    fs::write(root.join("inlet/inlet_000.vtk"), tet_vtk(10.0)).unwrap();
    fs::write(root.join("inlet/inlet_001.vtk"), tet_vtk(11.0)).unwrap();

    let toolkit = MeshToolkit::new();
    let tally = run_pipeline(&toolkit, root).unwrap();

    assert_eq!(tally.timesteps, 2);
    assert_eq!(tally.written, 2);

    let out_dir = root.join(OUTPUT_DIR_NAME);
    for timestep in [0u32, 1] {
        let path = out_dir.join(format!("combined_timestep_{:04}.vtp", timestep));
        assert!(path.exists(), "missing output for timestep {timestep}");

        let surface = read_output(&toolkit, &path);
        // Primary tet + inlet tet.
        assert_eq!(surface.n_points(), 8);
        assert_eq!(surface.field_value(TIME_VALUE_FIELD), Some(timestep as f32));

        let Some(AttributeData::Int32(ids)) = surface.point_array(COMPONENT_ID_ARRAY) else {
            panic!("missing ComponentID array");
        };
        assert_eq!(&ids[..4], &[1, 1, 1, 1]);
        assert_eq!(&ids[4..], &[2, 2, 2, 2]);

        let Some(AttributeData::String(names)) = surface.point_array(COMPONENT_NAME_ARRAY)
        else {
            panic!("missing ComponentName array");
        };
        assert_eq!(names[0], "gravityCasting");
        assert_eq!(names[7], "inlet");
    }
}

#[test]
fn test_point_count_is_sum_of_components() {
    let dir = tempdir().unwrap();
    let root = dir.path();

    fs::write(root.join("gravityCasting_0.vtk"), tet_vtk(0.0)).unwrap();
    for kind in ["inlet", "model", "riser"] {
        fs::create_dir(root.join(kind)).unwrap();
        fs::write(root.join(kind).join("part_0.vtk"), tet_vtk(5.0)).unwrap();
    }

    let toolkit = MeshToolkit::new();
    let tally = run_pipeline(&toolkit, root).unwrap();
    assert_eq!(tally.written, 1);

    let surface = read_output(
        &toolkit,
        &root.join(OUTPUT_DIR_NAME).join("combined_timestep_0000.vtp"),
    );
    // Four tets of four points each.
    assert_eq!(surface.n_points(), 16);

    let Some(AttributeData::Int32(ids)) = surface.point_array(COMPONENT_ID_ARRAY) else {
        panic!("missing ComponentID array");
    };
    let mut seen: Vec<i32> = ids.clone();
    seen.dedup();
    assert_eq!(seen, vec![1, 2, 3, 4]);
}

#[test]
fn test_short_component_sequence_is_skipped() {
    let dir = tempdir().unwrap();
    let root = dir.path();

    // Timestep 5 exists but the inlet sequence has a single file: index 5
    // is out of range, so only the primary contributes.
    fs::write(root.join("gravityCasting_5.vtk"), tet_vtk(0.0)).unwrap();
    fs::create_dir(root.join("inlet")).unwrap();
    fs::write(root.join("inlet/inlet_000.vtk"), tet_vtk(10.0)).unwrap();

    let toolkit = MeshToolkit::new();
    let tally = run_pipeline(&toolkit, root).unwrap();
    assert_eq!(tally.written, 1);

    let surface = read_output(
        &toolkit,
        &root.join(OUTPUT_DIR_NAME).join("combined_timestep_0005.vtp"),
    );
    assert_eq!(surface.n_points(), 4);
    assert_eq!(surface.field_value(TIME_VALUE_FIELD), Some(5.0));
}

#[test]
fn test_corrupt_primary_produces_no_output() {
    let dir = tempdir().unwrap();
    let root = dir.path();

    fs::write(root.join("gravityCasting_0.vtk"), tet_vtk(0.0)).unwrap();
    fs::write(root.join("gravityCasting_1.vtk"), "not a mesh\n").unwrap();

    let toolkit = MeshToolkit::new();
    let tally = run_pipeline(&toolkit, root).unwrap();

    assert_eq!(tally.timesteps, 2);
    assert_eq!(tally.written, 1);

    let out_dir = root.join(OUTPUT_DIR_NAME);
    assert!(out_dir.join("combined_timestep_0000.vtp").exists());
    assert!(!out_dir.join("combined_timestep_0001.vtp").exists());
}

#[test]
fn test_all_inputs_unreadable_still_completes() {
    let dir = tempdir().unwrap();
    let root = dir.path();

    fs::write(root.join("gravityCasting_0.vtk"), "garbage\n").unwrap();

    let toolkit = MeshToolkit::new();
    let tally = run_pipeline(&toolkit, root).unwrap();

    assert_eq!(tally.timesteps, 1);
    assert_eq!(tally.written, 0);
    assert!(!root
        .join(OUTPUT_DIR_NAME)
        .join("combined_timestep_0000.vtp")
        .exists());
}

#[test]
fn test_empty_source_tree_completes() {
    let dir = tempdir().unwrap();

    let toolkit = MeshToolkit::new();
    let tally = run_pipeline(&toolkit, dir.path()).unwrap();

    assert_eq!(tally.timesteps, 0);
    assert_eq!(tally.written, 0);
}

#[test]
fn test_runs_are_idempotent() {
    let dir = tempdir().unwrap();
    let root = dir.path();

    fs::write(root.join("gravityCasting_0.vtk"), tet_vtk(0.0)).unwrap();
    fs::create_dir(root.join("model")).unwrap();
    fs::write(root.join("model/model_000.vtk"), tet_vtk(3.0)).unwrap();

    let toolkit = MeshToolkit::new();
    run_pipeline(&toolkit, root).unwrap();
    let output = root.join(OUTPUT_DIR_NAME).join("combined_timestep_0000.vtp");
    let first = fs::read(&output).unwrap();

    run_pipeline(&toolkit, root).unwrap();
    let second = fs::read(&output).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_collection_lists_written_timesteps() {
    let dir = tempdir().unwrap();
    let root = dir.path();

    fs::write(root.join("gravityCasting_0.vtk"), tet_vtk(0.0)).unwrap();
    fs::write(root.join("gravityCasting_2.vtk"), "broken\n").unwrap();
    fs::write(root.join("gravityCasting_7.vtk"), tet_vtk(7.0)).unwrap();

    let toolkit = MeshToolkit::new();
    let tally = run_pipeline(&toolkit, root).unwrap();
    assert_eq!(tally.written, 2);

    let collection = fs::read_to_string(root.join(OUTPUT_DIR_NAME).join(COLLECTION_FILE_NAME))
        .unwrap();
    assert!(collection.contains("combined_timestep_0000.vtp"));
    assert!(!collection.contains("combined_timestep_0002.vtp"));
    assert!(collection.contains("combined_timestep_0007.vtp"));

    // Entries appear in ascending time order.
    let first = collection.find("timestep=\"0\"").unwrap();
    let second = collection.find("timestep=\"7\"").unwrap();
    assert!(first < second);
}

#[test]
fn test_stale_outputs_are_not_cleaned() {
    let dir = tempdir().unwrap();
    let root = dir.path();

    fs::write(root.join("gravityCasting_0.vtk"), tet_vtk(0.0)).unwrap();
    let out_dir = root.join(OUTPUT_DIR_NAME);
    fs::create_dir(&out_dir).unwrap();
    fs::write(out_dir.join("combined_timestep_9999.vtp"), "stale").unwrap();

    let toolkit = MeshToolkit::new();
    run_pipeline(&toolkit, root).unwrap();

    // The old file survives next to the fresh one.
    assert!(out_dir.join("combined_timestep_9999.vtp").exists());
    assert!(out_dir.join("combined_timestep_0000.vtp").exists());
}
