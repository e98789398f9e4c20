//! VTP (XML PolyData) output.
//!
//! Writes combined surfaces in the self-describing ASCII VTP format so
//! downstream tools can look up the provenance arrays and the time value
//! by name. Also writes the ParaView collection index that ties the
//! per-timestep files into one time series.
//!
//! Floats are written in shortest round-trip scientific notation, so a
//! written file re-reads to bit-identical values and repeated runs produce
//! byte-identical output.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use crate::mesh::{AttributeData, SurfaceMesh};

/// Error type for VTP output.
#[derive(Debug, Error)]
pub enum VtpError {
    /// I/O error during file operations.
    #[error("VTP I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Mesh bookkeeping violated (attribute array out of step with points).
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),
}

/// XML writer helper.
struct XmlWriter<W: Write> {
    writer: BufWriter<W>,
    indent: usize,
}

impl<W: Write> XmlWriter<W> {
    fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            indent: 0,
        }
    }

    fn write_indent(&mut self) -> std::io::Result<()> {
        for _ in 0..self.indent {
            write!(self.writer, "  ")?;
        }
        Ok(())
    }

    fn write_header(&mut self, file_type: &str) -> std::io::Result<()> {
        writeln!(self.writer, "<?xml version=\"1.0\"?>")?;
        writeln!(
            self.writer,
            "<VTKFile type=\"{}\" version=\"0.1\" byte_order=\"LittleEndian\">",
            file_type
        )?;
        self.indent += 1;
        Ok(())
    }

    fn write_footer(&mut self) -> std::io::Result<()> {
        self.indent -= 1;
        writeln!(self.writer, "</VTKFile>")?;
        self.writer.flush()?;
        Ok(())
    }

    fn start_element(&mut self, name: &str, attrs: &[(&str, &str)]) -> std::io::Result<()> {
        self.write_indent()?;
        write!(self.writer, "<{}", name)?;
        for (key, value) in attrs {
            write!(self.writer, " {}=\"{}\"", key, value)?;
        }
        writeln!(self.writer, ">")?;
        self.indent += 1;
        Ok(())
    }

    fn end_element(&mut self, name: &str) -> std::io::Result<()> {
        self.indent -= 1;
        self.write_indent()?;
        writeln!(self.writer, "</{}>", name)?;
        Ok(())
    }

    fn empty_element(&mut self, name: &str, attrs: &[(&str, &str)]) -> std::io::Result<()> {
        self.write_indent()?;
        write!(self.writer, "<{}", name)?;
        for (key, value) in attrs {
            write!(self.writer, " {}=\"{}\"", key, value)?;
        }
        writeln!(self.writer, "/>")?;
        Ok(())
    }

    /// Write space-separated values, wrapped every `per_line` entries.
    fn write_wrapped<T: std::fmt::Display>(
        &mut self,
        values: impl ExactSizeIterator<Item = T>,
        per_line: usize,
    ) -> std::io::Result<()> {
        let n = values.len();
        if n == 0 {
            return Ok(());
        }
        self.write_indent()?;
        for (i, value) in values.enumerate() {
            write!(self.writer, "{}", value)?;
            if i + 1 < n {
                if (i + 1) % per_line == 0 {
                    writeln!(self.writer)?;
                    self.write_indent()?;
                } else {
                    write!(self.writer, " ")?;
                }
            }
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn open_data_array(
        &mut self,
        type_name: &str,
        name: Option<&str>,
        extra: &[(&str, String)],
    ) -> std::io::Result<()> {
        self.write_indent()?;
        write!(self.writer, "<DataArray type=\"{}\"", type_name)?;
        if let Some(name) = name {
            write!(self.writer, " Name=\"{}\"", name)?;
        }
        for (key, value) in extra {
            write!(self.writer, " {}=\"{}\"", key, value)?;
        }
        writeln!(self.writer, " format=\"ascii\">")?;
        self.indent += 1;
        Ok(())
    }

    fn close_data_array(&mut self) -> std::io::Result<()> {
        self.indent -= 1;
        self.write_indent()?;
        writeln!(self.writer, "</DataArray>")?;
        Ok(())
    }

    fn write_attribute_array(
        &mut self,
        name: &str,
        data: &AttributeData,
    ) -> std::io::Result<()> {
        match data {
            AttributeData::Int32(values) => {
                self.open_data_array("Int32", Some(name), &[])?;
                self.write_wrapped(values.iter(), 20)?;
            }
            AttributeData::Float32 { components, values } => {
                let extra = components_attr(*components);
                self.open_data_array("Float32", Some(name), &extra)?;
                self.write_wrapped(values.iter().map(|v| format!("{:e}", v)), 6)?;
            }
            AttributeData::Float64 { components, values } => {
                let extra = components_attr(*components);
                self.open_data_array("Float64", Some(name), &extra)?;
                self.write_wrapped(values.iter().map(|v| format!("{:e}", v)), 6)?;
            }
            AttributeData::String(values) => {
                // The XML convention for string arrays: decimal character
                // codes, each string terminated by 0.
                self.open_data_array("String", Some(name), &[])?;
                let codes: Vec<u32> = values
                    .iter()
                    .flat_map(|s| s.bytes().map(u32::from).chain(std::iter::once(0)))
                    .collect();
                self.write_wrapped(codes.iter(), 20)?;
            }
        }
        self.close_data_array()
    }
}

fn components_attr(components: usize) -> Vec<(&'static str, String)> {
    if components > 1 {
        vec![("NumberOfComponents", components.to_string())]
    } else {
        Vec::new()
    }
}

/// Write a surface mesh as an ASCII VTP file.
pub fn write_vtp(mesh: &SurfaceMesh, path: &Path) -> Result<(), VtpError> {
    let n_points = mesh.n_points();
    for (name, data) in &mesh.point_data {
        if data.len() != n_points {
            return Err(VtpError::InvalidMesh(format!(
                "point array '{}' has {} tuples for {} points",
                name,
                data.len(),
                n_points
            )));
        }
    }

    let file = File::create(path)?;
    let mut xml = XmlWriter::new(file);

    xml.write_header("PolyData")?;
    xml.start_element("PolyData", &[])?;
    xml.start_element(
        "Piece",
        &[
            ("NumberOfPoints", &n_points.to_string()),
            ("NumberOfVerts", "0"),
            ("NumberOfLines", "0"),
            ("NumberOfStrips", "0"),
            ("NumberOfPolys", &mesh.n_polys().to_string()),
        ],
    )?;

    xml.start_element("Points", &[])?;
    xml.open_data_array(
        "Float64",
        None,
        &[("NumberOfComponents", "3".to_string())],
    )?;
    xml.write_wrapped(
        mesh.points
            .iter()
            .flat_map(|p| p.iter())
            .map(|v| format!("{:e}", v))
            .collect::<Vec<_>>()
            .into_iter(),
        6,
    )?;
    xml.close_data_array()?;
    xml.end_element("Points")?;

    xml.start_element("PointData", &[])?;
    for (name, data) in &mesh.point_data {
        xml.write_attribute_array(name, data)?;
    }
    xml.end_element("PointData")?;

    xml.start_element("Polys", &[])?;
    xml.open_data_array("Int64", Some("connectivity"), &[])?;
    xml.write_wrapped(mesh.connectivity.iter(), 20)?;
    xml.close_data_array()?;
    xml.open_data_array("Int64", Some("offsets"), &[])?;
    xml.write_wrapped(mesh.offsets.iter(), 20)?;
    xml.close_data_array()?;
    xml.end_element("Polys")?;

    xml.end_element("Piece")?;

    // Global values ride as field data next to the piece.
    xml.start_element("FieldData", &[])?;
    for (name, value) in &mesh.field_data {
        xml.open_data_array(
            "Float32",
            Some(name),
            &[("NumberOfTuples", "1".to_string())],
        )?;
        xml.write_wrapped(std::iter::once(format!("{:e}", value)), 1)?;
        xml.close_data_array()?;
    }
    xml.end_element("FieldData")?;

    xml.end_element("PolyData")?;
    xml.write_footer()?;
    Ok(())
}

/// Write a ParaView collection (`.pvd`) referencing one file per timestep.
///
/// `entries` pairs each timestep with its file name relative to the
/// collection.
pub fn write_pvd(path: &Path, entries: &[(u32, String)]) -> Result<(), VtpError> {
    let file = File::create(path)?;
    let mut xml = XmlWriter::new(file);

    xml.write_header("Collection")?;
    xml.start_element("Collection", &[])?;
    for (timestep, file_name) in entries {
        xml.empty_element(
            "DataSet",
            &[
                ("timestep", &timestep.to_string()),
                ("group", ""),
                ("part", "0"),
                ("file", file_name),
            ],
        )?;
    }
    xml.end_element("Collection")?;
    xml.write_footer()?;
    Ok(())
}
