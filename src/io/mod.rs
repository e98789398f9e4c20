//! Mesh file I/O.
//!
//! This module provides:
//! - **Legacy VTK input**: strict and lenient parsers over the serial
//!   legacy format, ASCII and binary
//! - **VTP output**: self-describing ASCII XML PolyData, plus the ParaView
//!   collection index for time-series playback
//! - **VTP input**: reader for the ASCII subset the writer produces
//!
//! The parsers are exposed as read strategies; [`crate::toolkit`] owns the
//! order they are tried in.

pub mod legacy;
pub mod vtp;
pub mod xml;

pub use legacy::{LegacyDataSetReader, LegacyError, LegacyUnstructuredReader};
pub use vtp::{write_pvd, write_vtp, VtpError};
pub use xml::{XmlError, XmlPolyDataReader};
