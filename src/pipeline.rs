//! Per-timestep combination and the batch driver.
//!
//! For every discovered timestep the driver reads the primary file and the
//! index-aligned file of each sub-component, normalizes each to a tagged
//! surface, appends the surfaces into one mesh, stamps the time value, and
//! writes `vtp_output/combined_timestep_<t>.vtp`. Any per-file failure
//! excludes exactly that one input; only a timestep with zero valid inputs
//! produces no output. The run succeeds whenever the sweep completes,
//! whatever the tally says.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::component::{tag_surface, ComponentKind};
use crate::index::{IndexError, TimestepIndex};
use crate::io::vtp::write_pvd;
use crate::mesh::{append_surfaces, normalize_to_surface, SurfaceMesh};
use crate::toolkit::MeshToolkit;

/// Output directory created under the source root.
pub const OUTPUT_DIR_NAME: &str = "vtp_output";
/// Name of the global time field on combined meshes.
pub const TIME_VALUE_FIELD: &str = "TimeValue";
/// Name of the collection index tying the outputs into a time series.
pub const COLLECTION_FILE_NAME: &str = "combined.pvd";

/// Error type for the batch driver.
///
/// Only environment-level failures surface here; per-file and per-timestep
/// problems are recovered inside the sweep.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Output directory could not be created.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Source tree scan failed.
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Success accounting for one run.
#[derive(Debug, Clone, Default)]
pub struct RunTally {
    /// Timesteps discovered.
    pub timesteps: usize,
    /// Output files written.
    pub written: usize,
    /// Written outputs as (timestep, path), in ascending timestep order.
    pub outputs: Vec<(u32, PathBuf)>,
}

impl RunTally {
    /// Print the end-of-run summary.
    pub fn print_summary(&self, output_dir: &Path) {
        println!();
        println!("=== Conversion complete ===");
        println!(
            "Successfully created {} of {} combined VTP files",
            self.written, self.timesteps
        );
        println!("Output directory: {}", output_dir.display());
    }
}

/// Read one component file and turn it into a tagged surface.
///
/// Every failure path logs and returns `None`; nothing here aborts the
/// timestep.
fn load_component_surface(
    toolkit: &MeshToolkit,
    path: &Path,
    label: &str,
) -> Option<SurfaceMesh> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let raw = match toolkit.read_mesh(path) {
        Ok(raw) => {
            println!("  Reading: {} ... OK ({} points)", file_name, raw.n_points());
            raw
        }
        Err(error) => {
            println!("  Reading: {} ... FAILED", file_name);
            eprintln!("Warning: {}: {}", path.display(), error);
            return None;
        }
    };

    let Some(mut surface) = normalize_to_surface(raw) else {
        println!("  {} has no surface geometry, skipping", file_name);
        return None;
    };
    tag_surface(&mut surface, label);
    Some(surface)
}

/// Combine all components of one timestep into a single surface.
///
/// Sub-component sequences contribute their file at list index `timestep`;
/// a sequence shorter than that contributes nothing (no wraparound, no
/// nearest substitute).
pub fn combine_timestep(
    toolkit: &MeshToolkit,
    index: &TimestepIndex,
    timestep: u32,
) -> Option<SurfaceMesh> {
    let mut surfaces = Vec::new();

    if let Some(primary) = index.primary(timestep) {
        if let Some(surface) =
            load_component_surface(toolkit, primary, ComponentKind::GravityCasting.label())
        {
            surfaces.push(surface);
        }
    }

    for kind in ComponentKind::SUB_COMPONENTS {
        let files = index.component_files(kind);
        let Some(file) = files.get(timestep as usize) else {
            continue;
        };
        if let Some(surface) = load_component_surface(toolkit, file, kind.label()) {
            surfaces.push(surface);
        }
    }

    if surfaces.is_empty() {
        println!("  No valid data for timestep {}", timestep);
        return None;
    }

    let n_components = surfaces.len();
    let total_points: usize = surfaces.iter().map(SurfaceMesh::n_points).sum();

    let mut combined = append_surfaces(surfaces)?;
    combined.set_field_value(TIME_VALUE_FIELD, timestep as f32);

    println!(
        "  Combined: {} components, {} total points",
        n_components, total_points
    );
    Some(combined)
}

/// Run the full conversion over a source tree.
///
/// Returns the tally on any completed sweep, including one with zero
/// successful conversions.
pub fn run_pipeline(toolkit: &MeshToolkit, source_root: &Path) -> Result<RunTally, PipelineError> {
    let index = TimestepIndex::scan(source_root)?;

    let output_dir = source_root.join(OUTPUT_DIR_NAME);
    std::fs::create_dir_all(&output_dir)?;

    let timesteps = index.timesteps();
    let mut tally = RunTally {
        timesteps: timesteps.len(),
        ..RunTally::default()
    };

    if timesteps.is_empty() {
        println!("No timesteps found");
        return Ok(tally);
    }

    println!();
    println!(
        "=== Converting {} timesteps to combined VTP files ===",
        timesteps.len()
    );

    for timestep in timesteps {
        println!();
        println!("--- Processing timestep {} ---", timestep);

        let Some(combined) = combine_timestep(toolkit, &index, timestep) else {
            continue;
        };

        let file_name = format!("combined_timestep_{:04}.vtp", timestep);
        let path = output_dir.join(&file_name);
        match toolkit.write_surface(&combined, &path) {
            Ok(()) => {
                println!("  Saved: {}", file_name);
                tally.written += 1;
                tally.outputs.push((timestep, path));
            }
            Err(error) => {
                eprintln!("Warning: failed to write {}: {}", path.display(), error);
            }
        }
    }

    // Collection index for time-series playback; losing it does not undo
    // the sweep.
    let entries: Vec<(u32, String)> = tally
        .outputs
        .iter()
        .map(|(timestep, _)| (*timestep, format!("combined_timestep_{:04}.vtp", timestep)))
        .collect();
    if !entries.is_empty() {
        let collection_path = output_dir.join(COLLECTION_FILE_NAME);
        if let Err(error) = write_pvd(&collection_path, &entries) {
            eprintln!(
                "Warning: failed to write {}: {}",
                collection_path.display(),
                error
            );
        }
    }

    tally.print_summary(&output_dir);
    Ok(tally)
}
