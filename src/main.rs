//! Command-line driver.
//!
//! Takes one positional argument, the source directory, and runs the full
//! conversion sweep. The process exits 0 whenever the sweep completes,
//! even if some (or all) timesteps yielded no output; it exits non-zero
//! for a missing argument, a non-existent source directory, or an
//! orchestration failure.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use vtk2vtp::{run_pipeline, MeshToolkit};

/// Combine per-component legacy VTK time series into per-timestep VTP
/// surface meshes.
#[derive(Debug, Parser)]
#[command(name = "vtk2vtp", version, about)]
struct Args {
    /// Source directory containing gravityCasting_<timestep>.vtk files and
    /// optional inlet/, model/, riser/ subdirectories
    source: PathBuf,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if !args.source.is_dir() {
        eprintln!(
            "Error: directory '{}' does not exist",
            args.source.display()
        );
        return ExitCode::FAILURE;
    }

    let toolkit = MeshToolkit::new();
    match run_pipeline(&toolkit, &args.source) {
        Ok(_tally) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: conversion failed: {}", error);
            ExitCode::FAILURE
        }
    }
}
