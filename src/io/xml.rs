//! Reading of ASCII VTP files.
//!
//! Covers the subset of XML PolyData this tool writes: one piece, ASCII
//! data arrays, polygon topology, named point arrays, and field data.
//! Reading back the combiner's own output makes the write path verifiable
//! with the same capability that reads the inputs.

use thiserror::Error;

use crate::mesh::{AttributeData, RawMesh, SurfaceMesh};
use crate::toolkit::{ReadStrategy, StrategyError};

/// Error type for VTP reading.
#[derive(Debug, Error)]
pub enum XmlError {
    /// Missing or foreign file marker.
    #[error("not a VTP file")]
    NotVtp,

    /// Malformed content.
    #[error("VTP parse error: {0}")]
    Parse(String),
}

/// Reader for the ASCII VTP subset the writer produces.
pub struct XmlPolyDataReader;

impl ReadStrategy for XmlPolyDataReader {
    fn name(&self) -> &'static str {
        "xml polydata"
    }

    fn can_read(&self, bytes: &[u8]) -> bool {
        let head = &bytes[..bytes.len().min(256)];
        String::from_utf8_lossy(head).contains("<VTKFile")
    }

    fn read(&self, bytes: &[u8]) -> Result<RawMesh, StrategyError> {
        Ok(parse_vtp(bytes)?)
    }
}

/// One element: its attribute text and inner body.
fn find_element<'a>(text: &'a str, tag: &str) -> Option<(&'a str, &'a str)> {
    let open = format!("<{tag}");
    let mut search = 0;
    loop {
        let start = search + text[search..].find(&open)?;
        let after = &text[start + open.len()..];
        // Reject prefix matches such as <PointData for tag Points.
        let boundary = after.chars().next()?;
        if boundary.is_ascii_alphanumeric() {
            search = start + open.len();
            continue;
        }
        let gt = after.find('>')?;
        let attrs = after[..gt].trim_end_matches('/').trim();
        if after[..gt].trim_end().ends_with('/') {
            return Some((attrs, ""));
        }
        let body = &after[gt + 1..];
        let close = format!("</{tag}>");
        let end = body.find(&close)?;
        return Some((attrs, &body[..end]));
    }
}

/// `key="value"` pairs of an attribute string.
///
/// The subset written by this tool never quotes whitespace, so pairs split
/// on whitespace.
fn parse_attrs(attrs: &str) -> Vec<(String, String)> {
    attrs
        .split_whitespace()
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            Some((key.to_string(), value.trim_matches('"').to_string()))
        })
        .collect()
}

fn attr<'a>(attrs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// All DataArray elements of a section body, in document order.
fn data_arrays(body: &str) -> Vec<(Vec<(String, String)>, &str)> {
    let mut arrays = Vec::new();
    let mut rest = body;
    while let Some((attrs, array_body)) = find_element(rest, "DataArray") {
        arrays.push((parse_attrs(attrs), array_body));
        // Continue after this array's closing tag.
        let close = "</DataArray>";
        match rest.find(close) {
            Some(at) => rest = &rest[at + close.len()..],
            None => break,
        }
    }
    arrays
}

fn parse_numbers<T: std::str::FromStr>(body: &str, what: &str) -> Result<Vec<T>, XmlError> {
    body.split_whitespace()
        .map(|token| {
            token
                .parse::<T>()
                .map_err(|_| XmlError::Parse(format!("invalid {what} value: {token}")))
        })
        .collect()
}

/// Decode a String data array: decimal character codes, each string
/// terminated by 0.
fn parse_string_array(body: &str) -> Result<Vec<String>, XmlError> {
    let codes: Vec<u32> = parse_numbers(body, "string code")?;
    let mut strings = Vec::new();
    let mut current = Vec::new();
    for code in codes {
        if code == 0 {
            strings.push(String::from_utf8_lossy(&current).into_owned());
            current.clear();
        } else {
            current.push(code.min(255) as u8);
        }
    }
    if !current.is_empty() {
        strings.push(String::from_utf8_lossy(&current).into_owned());
    }
    Ok(strings)
}

fn parse_attribute_array(
    attrs: &[(String, String)],
    body: &str,
) -> Result<Option<(String, AttributeData)>, XmlError> {
    let Some(name) = attr(attrs, "Name") else {
        return Ok(None);
    };
    let type_name = attr(attrs, "type").unwrap_or("Float32");
    let components: usize = attr(attrs, "NumberOfComponents")
        .and_then(|v| v.parse().ok())
        .unwrap_or(1);

    let data = match type_name {
        "Int32" | "Int64" | "UInt8" => AttributeData::Int32(parse_numbers(body, "integer")?),
        "Float32" => AttributeData::Float32 {
            components,
            values: parse_numbers(body, "float")?,
        },
        "Float64" => AttributeData::Float64 {
            components,
            values: parse_numbers(body, "float")?,
        },
        "String" => AttributeData::String(parse_string_array(body)?),
        other => {
            return Err(XmlError::Parse(format!("unsupported array type: {other}")));
        }
    };
    Ok(Some((name.to_string(), data)))
}

/// Parse an ASCII VTP document.
pub(crate) fn parse_vtp(bytes: &[u8]) -> Result<RawMesh, XmlError> {
    let text = std::str::from_utf8(bytes).map_err(|_| XmlError::NotVtp)?;

    let (file_attrs, file_body) = find_element(text, "VTKFile").ok_or(XmlError::NotVtp)?;
    let file_attrs = parse_attrs(file_attrs);
    if attr(&file_attrs, "type") != Some("PolyData") {
        return Err(XmlError::NotVtp);
    }

    let (_, polydata) =
        find_element(file_body, "PolyData").ok_or_else(|| XmlError::Parse("no PolyData".into()))?;
    let (_, piece) =
        find_element(polydata, "Piece").ok_or_else(|| XmlError::Parse("no Piece".into()))?;

    let mut surface = SurfaceMesh::new();

    let (_, points_body) =
        find_element(piece, "Points").ok_or_else(|| XmlError::Parse("no Points".into()))?;
    if let Some((_, coords_body)) = find_element(points_body, "DataArray") {
        let coords: Vec<f64> = parse_numbers(coords_body, "coordinate")?;
        if coords.len() % 3 != 0 {
            return Err(XmlError::Parse(format!(
                "coordinate count {} not divisible by 3",
                coords.len()
            )));
        }
        surface.points = coords
            .chunks_exact(3)
            .map(|xyz| [xyz[0], xyz[1], xyz[2]])
            .collect();
    }

    if let Some((_, polys_body)) = find_element(piece, "Polys") {
        for (attrs, body) in data_arrays(polys_body) {
            match attr(&attrs, "Name") {
                Some("connectivity") => {
                    let values: Vec<i64> = parse_numbers(body, "connectivity")?;
                    surface.connectivity = values.into_iter().map(|v| v as u32).collect();
                }
                Some("offsets") => {
                    let values: Vec<i64> = parse_numbers(body, "offset")?;
                    surface.offsets = values.into_iter().map(|v| v as u32).collect();
                }
                _ => {}
            }
        }
    }

    if let Some((_, point_data_body)) = find_element(piece, "PointData") {
        for (attrs, body) in data_arrays(point_data_body) {
            if let Some((name, data)) = parse_attribute_array(&attrs, body)? {
                surface.point_data.push((name, data));
            }
        }
    }

    if let Some((_, field_body)) = find_element(polydata, "FieldData") {
        for (attrs, body) in data_arrays(field_body) {
            let Some(name) = attr(&attrs, "Name") else {
                continue;
            };
            let values: Vec<f32> = parse_numbers(body, "field")?;
            if let Some(&value) = values.first() {
                surface.set_field_value(name, value);
            }
        }
    }

    Ok(RawMesh::Surface(surface))
}
