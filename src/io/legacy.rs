//! Legacy VTK file reading.
//!
//! Parses the serial legacy format in both ASCII and BINARY data modes
//! (binary payloads are big-endian, per the format). All five dataset
//! types are handled; lattice types normalize to [`StructuredGrid`] at
//! parse time.
//!
//! ```text
//! # vtk DataFile Version 3.0
//! solidification output
//! ASCII
//! DATASET UNSTRUCTURED_GRID
//! POINTS 4 float
//! 0 0 0  1 0 0  0 1 0  0 0 1
//! CELLS 1 5
//! 4 0 1 2 3
//! CELL_TYPES 1
//! 10
//! POINT_DATA 4
//! SCALARS Temperature float 1
//! LOOKUP_TABLE default
//! 620.0 615.5 611.2 604.8
//! ```
//!
//! Two read strategies are exposed:
//! - [`LegacyDataSetReader`]: the strict full-format parser.
//! - [`LegacyUnstructuredReader`]: a lenient fallback that assumes
//!   unstructured topology, skips sections it does not recognize, and
//!   infers cell types from arity when `CELL_TYPES` is missing.

use thiserror::Error;

use crate::mesh::raw::{cell_type, Cell, StructuredGrid, UnstructuredGrid};
use crate::mesh::{AttributeData, RawMesh, SurfaceMesh};
use crate::toolkit::{ReadStrategy, StrategyError};

/// Error type for legacy parsing.
#[derive(Debug, Error)]
pub enum LegacyError {
    /// Missing or foreign file header.
    #[error("not a legacy VTK file")]
    NotLegacy,

    /// File ended inside a declared section.
    #[error("truncated file while reading {0}")]
    Truncated(&'static str),

    /// Malformed content.
    #[error("parse error: {0}")]
    Parse(String),

    /// Dataset type outside the legacy set.
    #[error("unsupported dataset type: {0}")]
    UnsupportedDataset(String),
}

/// How forgiving the parse is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Strictness {
    /// Fail on anything outside the format.
    Strict,
    /// Assume unstructured topology, skip unknown sections, infer missing
    /// cell types.
    LenientUnstructured,
}

/// Strict reader over the full legacy format.
pub struct LegacyDataSetReader;

impl ReadStrategy for LegacyDataSetReader {
    fn name(&self) -> &'static str {
        "legacy dataset"
    }

    fn can_read(&self, bytes: &[u8]) -> bool {
        bytes.starts_with(b"# vtk DataFile")
    }

    fn read(&self, bytes: &[u8]) -> Result<RawMesh, StrategyError> {
        Ok(parse_legacy(bytes, Strictness::Strict)?)
    }
}

/// Lenient unstructured-topology reader, tried when the strict parse
/// yields nothing.
pub struct LegacyUnstructuredReader;

impl ReadStrategy for LegacyUnstructuredReader {
    fn name(&self) -> &'static str {
        "legacy unstructured"
    }

    fn can_read(&self, bytes: &[u8]) -> bool {
        bytes.starts_with(b"# vtk DataFile")
    }

    fn read(&self, bytes: &[u8]) -> Result<RawMesh, StrategyError> {
        Ok(parse_legacy(bytes, Strictness::LenientUnstructured)?)
    }
}

/// Scalar value types of legacy data sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScalarType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl ScalarType {
    fn parse(name: &str) -> Result<ScalarType, LegacyError> {
        match name {
            "bit" | "char" => Ok(ScalarType::I8),
            "unsigned_char" => Ok(ScalarType::U8),
            "short" => Ok(ScalarType::I16),
            "unsigned_short" => Ok(ScalarType::U16),
            "int" => Ok(ScalarType::I32),
            "unsigned_int" => Ok(ScalarType::U32),
            "long" | "vtktypeint64" => Ok(ScalarType::I64),
            "unsigned_long" | "vtktypeuint64" => Ok(ScalarType::U64),
            "float" => Ok(ScalarType::F32),
            "double" => Ok(ScalarType::F64),
            other => Err(LegacyError::Parse(format!("unknown scalar type: {other}"))),
        }
    }

    fn size(&self) -> usize {
        match self {
            ScalarType::I8 | ScalarType::U8 => 1,
            ScalarType::I16 | ScalarType::U16 => 2,
            ScalarType::I32 | ScalarType::U32 | ScalarType::F32 => 4,
            ScalarType::I64 | ScalarType::U64 | ScalarType::F64 => 8,
        }
    }

    fn is_integer(&self) -> bool {
        !matches!(self, ScalarType::F32 | ScalarType::F64)
    }
}

/// Byte cursor over a legacy file.
///
/// Keyword lines are always ASCII text; data sections are either ASCII
/// tokens or raw big-endian payloads depending on the file's data mode.
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
    binary: bool,
    pending: Option<String>,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            binary: false,
            pending: None,
        }
    }

    /// Next line, trimmed. `None` at end of input.
    fn read_line(&mut self) -> Option<String> {
        if let Some(line) = self.pending.take() {
            return Some(line);
        }
        if self.pos >= self.bytes.len() {
            return None;
        }
        let start = self.pos;
        let end = self.bytes[start..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|offset| start + offset)
            .unwrap_or(self.bytes.len());
        self.pos = (end + 1).min(self.bytes.len());
        Some(String::from_utf8_lossy(&self.bytes[start..end]).trim().to_string())
    }

    /// Next non-empty line.
    fn next_keyword_line(&mut self) -> Option<String> {
        loop {
            let line = self.read_line()?;
            if !line.is_empty() {
                return Some(line);
            }
        }
    }

    /// Return a keyword line for the main loop to re-read.
    fn push_back(&mut self, line: String) {
        self.pending = Some(line);
    }

    /// Next whitespace-delimited ASCII token.
    fn next_token(&mut self) -> Option<&'a str> {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        if self.pos >= self.bytes.len() {
            return None;
        }
        let start = self.pos;
        while self.pos < self.bytes.len() && !self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        std::str::from_utf8(&self.bytes[start..self.pos]).ok()
    }

    /// Consume the newline that terminates a binary payload.
    fn skip_payload_newline(&mut self) {
        if self.pos < self.bytes.len() && self.bytes[self.pos] == b'\r' {
            self.pos += 1;
        }
        if self.pos < self.bytes.len() && self.bytes[self.pos] == b'\n' {
            self.pos += 1;
        }
    }

    fn binary_payload(&mut self, n: usize, ty: ScalarType) -> Result<&'a [u8], LegacyError> {
        let total = n
            .checked_mul(ty.size())
            .ok_or_else(|| LegacyError::Parse("value count overflow".to_string()))?;
        if self.pos + total > self.bytes.len() {
            return Err(LegacyError::Truncated("binary data section"));
        }
        let payload = &self.bytes[self.pos..self.pos + total];
        self.pos += total;
        self.skip_payload_newline();
        Ok(payload)
    }

    /// Read `n` values of `ty` as f64, honoring the data mode.
    fn read_values_f64(&mut self, n: usize, ty: ScalarType) -> Result<Vec<f64>, LegacyError> {
        if self.binary {
            let payload = self.binary_payload(n, ty)?;
            let mut values = Vec::with_capacity(n);
            for chunk in payload.chunks_exact(ty.size()) {
                values.push(decode_be_f64(chunk, ty));
            }
            Ok(values)
        } else {
            let mut values = Vec::with_capacity(n.min(1 << 20));
            for _ in 0..n {
                let token = self
                    .next_token()
                    .ok_or(LegacyError::Truncated("ASCII data section"))?;
                let value: f64 = token
                    .parse()
                    .map_err(|_| LegacyError::Parse(format!("invalid number: {token}")))?;
                values.push(value);
            }
            Ok(values)
        }
    }

    /// Read `n` integer values, honoring the data mode.
    fn read_values_i64(&mut self, n: usize, ty: ScalarType) -> Result<Vec<i64>, LegacyError> {
        if self.binary {
            let payload = self.binary_payload(n, ty)?;
            let mut values = Vec::with_capacity(n);
            for chunk in payload.chunks_exact(ty.size()) {
                values.push(decode_be_f64(chunk, ty) as i64);
            }
            Ok(values)
        } else {
            let mut values = Vec::with_capacity(n.min(1 << 20));
            for _ in 0..n {
                let token = self
                    .next_token()
                    .ok_or(LegacyError::Truncated("ASCII data section"))?;
                let value: i64 = token
                    .parse()
                    .map_err(|_| LegacyError::Parse(format!("invalid integer: {token}")))?;
                values.push(value);
            }
            Ok(values)
        }
    }
}

/// Decode one big-endian value to f64.
fn decode_be_f64(chunk: &[u8], ty: ScalarType) -> f64 {
    match ty {
        ScalarType::I8 => chunk[0] as i8 as f64,
        ScalarType::U8 => chunk[0] as f64,
        ScalarType::I16 => i16::from_be_bytes([chunk[0], chunk[1]]) as f64,
        ScalarType::U16 => u16::from_be_bytes([chunk[0], chunk[1]]) as f64,
        ScalarType::I32 => i32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as f64,
        ScalarType::U32 => u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as f64,
        ScalarType::I64 => i64::from_be_bytes([
            chunk[0], chunk[1], chunk[2], chunk[3], chunk[4], chunk[5], chunk[6], chunk[7],
        ]) as f64,
        ScalarType::U64 => u64::from_be_bytes([
            chunk[0], chunk[1], chunk[2], chunk[3], chunk[4], chunk[5], chunk[6], chunk[7],
        ]) as f64,
        ScalarType::F32 => f32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as f64,
        ScalarType::F64 => f64::from_be_bytes([
            chunk[0], chunk[1], chunk[2], chunk[3], chunk[4], chunk[5], chunk[6], chunk[7],
        ]),
    }
}

/// Parse a legacy file into a raw dataset.
pub(crate) fn parse_legacy(bytes: &[u8], strictness: Strictness) -> Result<RawMesh, LegacyError> {
    let lenient = strictness == Strictness::LenientUnstructured;
    let mut cur = Cursor::new(bytes);

    let header = cur.read_line().ok_or(LegacyError::NotLegacy)?;
    if !header.starts_with("# vtk DataFile") {
        return Err(LegacyError::NotLegacy);
    }
    let _title = cur.read_line().ok_or(LegacyError::Truncated("title line"))?;

    let mode = cur
        .next_keyword_line()
        .ok_or(LegacyError::Truncated("data mode line"))?;
    match mode.to_ascii_uppercase().as_str() {
        "ASCII" => cur.binary = false,
        "BINARY" => cur.binary = true,
        other => {
            if !lenient {
                return Err(LegacyError::Parse(format!("unknown data mode: {other}")));
            }
            cur.binary = false;
            cur.push_back(mode);
        }
    }

    let dataset_line = cur
        .next_keyword_line()
        .ok_or(LegacyError::Truncated("dataset line"))?;
    let mut parts = dataset_line.split_whitespace();
    let kind = if parts.next().map(str::to_ascii_uppercase).as_deref() == Some("DATASET") {
        parts.next().unwrap_or("").to_ascii_uppercase()
    } else if lenient {
        cur.push_back(dataset_line);
        "UNSTRUCTURED_GRID".to_string()
    } else {
        return Err(LegacyError::Parse(format!(
            "expected DATASET line, got: {dataset_line}"
        )));
    };

    match kind.as_str() {
        "POLYDATA" if !lenient => parse_polydata(&mut cur),
        "UNSTRUCTURED_GRID" => parse_unstructured(&mut cur, lenient),
        "STRUCTURED_POINTS" if !lenient => parse_structured_points(&mut cur),
        "STRUCTURED_GRID" if !lenient => parse_structured_grid(&mut cur),
        "RECTILINEAR_GRID" if !lenient => parse_rectilinear(&mut cur),
        _ if lenient => parse_unstructured(&mut cur, true),
        other => Err(LegacyError::UnsupportedDataset(other.to_string())),
    }
}

/// Parse `POINTS n type` given the rest of the keyword line.
fn read_points(cur: &mut Cursor, line: &str) -> Result<Vec<[f64; 3]>, LegacyError> {
    let mut parts = line.split_whitespace().skip(1);
    let n: usize = parts
        .next()
        .and_then(|token| token.parse().ok())
        .ok_or_else(|| LegacyError::Parse(format!("invalid POINTS line: {line}")))?;
    let ty = ScalarType::parse(parts.next().unwrap_or("float"))?;

    let count = n
        .checked_mul(3)
        .ok_or_else(|| LegacyError::Parse("point count overflow".to_string()))?;
    let values = cur.read_values_f64(count, ty)?;
    Ok(values
        .chunks_exact(3)
        .map(|xyz| [xyz[0], xyz[1], xyz[2]])
        .collect())
}

/// Decode a count-prefixed cell list section (`CELLS`, `POLYGONS`, ...).
fn read_cell_lists(
    cur: &mut Cursor,
    line: &str,
    lenient: bool,
) -> Result<Vec<Vec<u32>>, LegacyError> {
    let mut parts = line.split_whitespace().skip(1);
    let n: usize = parts
        .next()
        .and_then(|token| token.parse().ok())
        .ok_or_else(|| LegacyError::Parse(format!("invalid cell section line: {line}")))?;
    let size: usize = parts
        .next()
        .and_then(|token| token.parse().ok())
        .ok_or_else(|| LegacyError::Parse(format!("invalid cell section line: {line}")))?;

    let values = cur.read_values_i64(size, ScalarType::I32)?;
    let mut lists = Vec::with_capacity(n.min(1 << 20));
    let mut at = 0usize;
    while at < values.len() && lists.len() < n {
        let count = values[at];
        at += 1;
        if count < 0 || at + count as usize > values.len() {
            if lenient {
                break;
            }
            return Err(LegacyError::Parse("malformed cell list".to_string()));
        }
        let list = values[at..at + count as usize]
            .iter()
            .map(|&v| v as u32)
            .collect();
        at += count as usize;
        lists.push(list);
    }
    if lists.len() != n && !lenient {
        return Err(LegacyError::Parse(format!(
            "cell section declared {n} cells, found {}",
            lists.len()
        )));
    }
    Ok(lists)
}

/// Parse attribute blocks following `POINT_DATA`/`CELL_DATA`.
///
/// Stops (pushing the line back) at the first keyword that is not an
/// attribute block. With `keep` false the values are read and discarded,
/// which `CELL_DATA` uses for bookkeeping.
fn parse_attribute_blocks(
    cur: &mut Cursor,
    n_tuples: usize,
    keep: bool,
) -> Result<Vec<(String, AttributeData)>, LegacyError> {
    let mut arrays = Vec::new();

    while let Some(line) = cur.next_keyword_line() {
        let mut parts = line.split_whitespace();
        let keyword = parts.next().unwrap_or("").to_ascii_uppercase();
        match keyword.as_str() {
            "SCALARS" => {
                let name = parts.next().unwrap_or("scalars").to_string();
                let ty = ScalarType::parse(parts.next().unwrap_or("float"))?;
                let components: usize = parts
                    .next()
                    .and_then(|token| token.parse().ok())
                    .unwrap_or(1)
                    .clamp(1, 4);
                // Consume the optional LOOKUP_TABLE reference line. The
                // lookahead rewinds by position, never by push-back: the next
                // line may be data, and data reads resume from the byte
                // cursor.
                let mark = cur.pos;
                if let Some(next) = cur.next_keyword_line() {
                    let is_table_ref = next.to_ascii_uppercase().starts_with("LOOKUP_TABLE")
                        && next.split_whitespace().count() == 2;
                    if !is_table_ref {
                        cur.pos = mark;
                    }
                }
                let data = read_typed_array(cur, n_tuples, components, ty)?;
                if keep {
                    arrays.push((name, data));
                }
            }
            "COLOR_SCALARS" => {
                let name = parts.next().unwrap_or("color_scalars").to_string();
                let components: usize = parts
                    .next()
                    .and_then(|token| token.parse().ok())
                    .unwrap_or(3)
                    .max(1);
                // ASCII color scalars are floats in [0,1]; binary ones are bytes.
                let ty = if cur.binary {
                    ScalarType::U8
                } else {
                    ScalarType::F32
                };
                let values = cur.read_values_f64(n_tuples * components, ty)?;
                if keep {
                    arrays.push((
                        name,
                        AttributeData::Float32 {
                            components,
                            values: values.into_iter().map(|v| v as f32).collect(),
                        },
                    ));
                }
            }
            "VECTORS" | "NORMALS" => {
                let name = parts
                    .next()
                    .unwrap_or(if keyword == "VECTORS" { "vectors" } else { "normals" })
                    .to_string();
                let ty = ScalarType::parse(parts.next().unwrap_or("float"))?;
                let data = read_typed_array(cur, n_tuples, 3, ty)?;
                if keep {
                    arrays.push((name, data));
                }
            }
            "TEXTURE_COORDINATES" => {
                let name = parts.next().unwrap_or("tcoords").to_string();
                let components: usize = parts
                    .next()
                    .and_then(|token| token.parse().ok())
                    .unwrap_or(2)
                    .clamp(1, 3);
                let ty = ScalarType::parse(parts.next().unwrap_or("float"))?;
                let data = read_typed_array(cur, n_tuples, components, ty)?;
                if keep {
                    arrays.push((name, data));
                }
            }
            "TENSORS" => {
                let name = parts.next().unwrap_or("tensors").to_string();
                let ty = ScalarType::parse(parts.next().unwrap_or("float"))?;
                let data = read_typed_array(cur, n_tuples, 9, ty)?;
                if keep {
                    arrays.push((name, data));
                }
            }
            "LOOKUP_TABLE" => {
                // Standalone sized table: read and discard the RGBA entries.
                let _name = parts.next();
                let size: usize = parts.next().and_then(|token| token.parse().ok()).unwrap_or(0);
                let ty = if cur.binary {
                    ScalarType::U8
                } else {
                    ScalarType::F32
                };
                let _ = cur.read_values_f64(size * 4, ty)?;
            }
            "FIELD" => {
                let _name = parts.next();
                let count: usize = parts
                    .next()
                    .and_then(|token| token.parse().ok())
                    .unwrap_or(0);
                for _ in 0..count {
                    let Some(array_line) = cur.next_keyword_line() else {
                        return Err(LegacyError::Truncated("FIELD array"));
                    };
                    let mut array_parts = array_line.split_whitespace();
                    let array_name = array_parts.next().unwrap_or("field").to_string();
                    let components: usize = array_parts
                        .next()
                        .and_then(|token| token.parse().ok())
                        .ok_or_else(|| {
                            LegacyError::Parse(format!("invalid FIELD array line: {array_line}"))
                        })?;
                    let tuples: usize = array_parts
                        .next()
                        .and_then(|token| token.parse().ok())
                        .ok_or_else(|| {
                            LegacyError::Parse(format!("invalid FIELD array line: {array_line}"))
                        })?;
                    let ty = ScalarType::parse(array_parts.next().unwrap_or("float"))?;
                    let data = read_typed_array(cur, tuples, components, ty)?;
                    // Dataset-level FIELD blocks pass n_tuples 0 and keep
                    // every array; data-section FIELD arrays must match the
                    // section's tuple count.
                    if keep && (n_tuples == 0 || tuples == n_tuples) {
                        arrays.push((array_name, data));
                    }
                }
            }
            _ => {
                cur.push_back(line);
                break;
            }
        }
    }

    Ok(arrays)
}

/// Read `tuples * components` values into an array of the scalar's type
/// class (integer types narrow to Int32).
fn read_typed_array(
    cur: &mut Cursor,
    tuples: usize,
    components: usize,
    ty: ScalarType,
) -> Result<AttributeData, LegacyError> {
    let n = tuples
        .checked_mul(components)
        .ok_or_else(|| LegacyError::Parse("array size overflow".to_string()))?;
    if ty.is_integer() && components == 1 {
        let values = cur.read_values_i64(n, ty)?;
        Ok(AttributeData::Int32(
            values.into_iter().map(|v| v as i32).collect(),
        ))
    } else if ty == ScalarType::F64 {
        let values = cur.read_values_f64(n, ty)?;
        Ok(AttributeData::Float64 { components, values })
    } else {
        let values = cur.read_values_f64(n, ty)?;
        Ok(AttributeData::Float32 {
            components,
            values: values.into_iter().map(|v| v as f32).collect(),
        })
    }
}

/// Keep the single-tuple numeric arrays of a dataset-level FIELD as global
/// field values.
fn keep_field_values(surface: &mut SurfaceMesh, arrays: Vec<(String, AttributeData)>) {
    for (name, data) in arrays {
        let value = match &data {
            AttributeData::Float32 { values, .. } if values.len() == 1 => Some(values[0]),
            AttributeData::Float64 { values, .. } if values.len() == 1 => Some(values[0] as f32),
            AttributeData::Int32(values) if values.len() == 1 => Some(values[0] as f32),
            _ => None,
        };
        if let Some(value) = value {
            surface.set_field_value(&name, value);
        }
    }
}

fn parse_polydata(cur: &mut Cursor) -> Result<RawMesh, LegacyError> {
    let mut surface = SurfaceMesh::new();

    while let Some(line) = cur.next_keyword_line() {
        let keyword = line
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_ascii_uppercase();
        match keyword.as_str() {
            "POINTS" => surface.points = read_points(cur, &line)?,
            "POLYGONS" => {
                for poly in read_cell_lists(cur, &line, false)? {
                    surface.push_poly(&poly);
                }
            }
            "TRIANGLE_STRIPS" => {
                for strip in read_cell_lists(cur, &line, false)? {
                    for i in 0..strip.len().saturating_sub(2) {
                        if i % 2 == 0 {
                            surface.push_poly(&[strip[i], strip[i + 1], strip[i + 2]]);
                        } else {
                            surface.push_poly(&[strip[i + 1], strip[i], strip[i + 2]]);
                        }
                    }
                }
            }
            "VERTICES" | "LINES" => {
                // Not surface topology; read past the section.
                let _ = read_cell_lists(cur, &line, false)?;
            }
            "POINT_DATA" => {
                let n = section_count(&line)?;
                surface.point_data = parse_attribute_blocks(cur, n, true)?;
            }
            "CELL_DATA" => {
                let n = section_count(&line)?;
                let _ = parse_attribute_blocks(cur, n, false)?;
            }
            "FIELD" => {
                cur.push_back(line);
                let arrays = parse_attribute_blocks(cur, 0, true)?;
                keep_field_values(&mut surface, arrays);
            }
            "METADATA" => skip_metadata(cur),
            _ => {
                return Err(LegacyError::Parse(format!(
                    "unexpected keyword in POLYDATA: {line}"
                )))
            }
        }
    }

    Ok(RawMesh::Surface(surface))
}

fn parse_unstructured(cur: &mut Cursor, lenient: bool) -> Result<RawMesh, LegacyError> {
    let mut points: Vec<[f64; 3]> = Vec::new();
    let mut lists: Vec<Vec<u32>> = Vec::new();
    let mut types: Option<Vec<i64>> = None;
    let mut point_data: Vec<(String, AttributeData)> = Vec::new();

    while let Some(line) = cur.next_keyword_line() {
        let keyword = line
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_ascii_uppercase();
        match keyword.as_str() {
            "POINTS" => points = read_points(cur, &line)?,
            "CELLS" => lists = read_cell_lists(cur, &line, lenient)?,
            "CELL_TYPES" => {
                let n = section_count(&line)?;
                types = Some(cur.read_values_i64(n, ScalarType::I32)?);
            }
            "POINT_DATA" => {
                let n = section_count(&line)?;
                point_data = parse_attribute_blocks(cur, n, true)?;
            }
            "CELL_DATA" => {
                let n = section_count(&line)?;
                let _ = parse_attribute_blocks(cur, n, false)?;
            }
            "METADATA" => skip_metadata(cur),
            _ => {
                if lenient {
                    continue;
                }
                return Err(LegacyError::Parse(format!(
                    "unexpected keyword in UNSTRUCTURED_GRID: {line}"
                )));
            }
        }
    }

    let cells = match types {
        Some(types) => {
            if types.len() != lists.len() && !lenient {
                return Err(LegacyError::Parse(format!(
                    "CELL_TYPES declares {} cells, CELLS has {}",
                    types.len(),
                    lists.len()
                )));
            }
            lists
                .into_iter()
                .zip(types)
                .map(|(list, ty)| Cell {
                    cell_type: ty.clamp(0, u8::MAX as i64) as u8,
                    points: list,
                })
                .collect()
        }
        None if lenient => lists
            .into_iter()
            .map(|list| Cell {
                cell_type: infer_cell_type(list.len()),
                points: list,
            })
            .collect(),
        None if lists.is_empty() => Vec::new(),
        None => return Err(LegacyError::Parse("missing CELL_TYPES section".to_string())),
    };

    Ok(RawMesh::Unstructured(UnstructuredGrid {
        points,
        cells,
        point_data,
    }))
}

/// Cell type from arity, for files missing `CELL_TYPES`.
///
/// Volumetric arities win the ambiguous cases (4 is a tetrahedron, not a
/// quad): the inputs are solidification volumes.
fn infer_cell_type(arity: usize) -> u8 {
    match arity {
        3 => cell_type::TRIANGLE,
        4 => cell_type::TETRA,
        5 => cell_type::PYRAMID,
        6 => cell_type::WEDGE,
        8 => cell_type::HEXAHEDRON,
        _ => cell_type::POLYGON,
    }
}

fn parse_structured_points(cur: &mut Cursor) -> Result<RawMesh, LegacyError> {
    let mut dims = [0usize; 3];
    let mut origin = [0.0f64; 3];
    let mut spacing = [1.0f64; 3];
    let mut point_data: Vec<(String, AttributeData)> = Vec::new();

    while let Some(line) = cur.next_keyword_line() {
        let mut parts = line.split_whitespace();
        let keyword = parts.next().unwrap_or("").to_ascii_uppercase();
        match keyword.as_str() {
            "DIMENSIONS" => dims = read_triple_usize(&line)?,
            "ORIGIN" => origin = read_triple_f64(&line)?,
            "SPACING" | "ASPECT_RATIO" => spacing = read_triple_f64(&line)?,
            "POINT_DATA" => {
                let n = section_count(&line)?;
                point_data = parse_attribute_blocks(cur, n, true)?;
            }
            "CELL_DATA" => {
                let n = section_count(&line)?;
                let _ = parse_attribute_blocks(cur, n, false)?;
            }
            "METADATA" => skip_metadata(cur),
            _ => {
                return Err(LegacyError::Parse(format!(
                    "unexpected keyword in STRUCTURED_POINTS: {line}"
                )))
            }
        }
    }

    let [nx, ny, nz] = dims;
    let total = nx.saturating_mul(ny).saturating_mul(nz);
    // No declared point count exists to cross-check DIMENSIONS against.
    if total > (1 << 27) {
        return Err(LegacyError::Parse(format!(
            "lattice of {nx}x{ny}x{nz} points is implausibly large"
        )));
    }
    let mut points = Vec::with_capacity(total);
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                points.push([
                    origin[0] + i as f64 * spacing[0],
                    origin[1] + j as f64 * spacing[1],
                    origin[2] + k as f64 * spacing[2],
                ]);
            }
        }
    }

    Ok(RawMesh::Structured(StructuredGrid {
        dims,
        points,
        point_data,
    }))
}

fn parse_structured_grid(cur: &mut Cursor) -> Result<RawMesh, LegacyError> {
    let mut dims = [0usize; 3];
    let mut points: Vec<[f64; 3]> = Vec::new();
    let mut point_data: Vec<(String, AttributeData)> = Vec::new();

    while let Some(line) = cur.next_keyword_line() {
        let keyword = line
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_ascii_uppercase();
        match keyword.as_str() {
            "DIMENSIONS" => dims = read_triple_usize(&line)?,
            "POINTS" => points = read_points(cur, &line)?,
            "POINT_DATA" => {
                let n = section_count(&line)?;
                point_data = parse_attribute_blocks(cur, n, true)?;
            }
            "CELL_DATA" => {
                let n = section_count(&line)?;
                let _ = parse_attribute_blocks(cur, n, false)?;
            }
            "METADATA" => skip_metadata(cur),
            _ => {
                return Err(LegacyError::Parse(format!(
                    "unexpected keyword in STRUCTURED_GRID: {line}"
                )))
            }
        }
    }

    if points.len() != dims[0].saturating_mul(dims[1]).saturating_mul(dims[2]) {
        return Err(LegacyError::Parse(format!(
            "STRUCTURED_GRID declares {}x{}x{} points, found {}",
            dims[0],
            dims[1],
            dims[2],
            points.len()
        )));
    }

    Ok(RawMesh::Structured(StructuredGrid {
        dims,
        points,
        point_data,
    }))
}

fn parse_rectilinear(cur: &mut Cursor) -> Result<RawMesh, LegacyError> {
    let mut dims = [0usize; 3];
    let mut axes: [Vec<f64>; 3] = [Vec::new(), Vec::new(), Vec::new()];
    let mut point_data: Vec<(String, AttributeData)> = Vec::new();

    while let Some(line) = cur.next_keyword_line() {
        let mut parts = line.split_whitespace();
        let keyword = parts.next().unwrap_or("").to_ascii_uppercase();
        let axis = match keyword.as_str() {
            "X_COORDINATES" => Some(0),
            "Y_COORDINATES" => Some(1),
            "Z_COORDINATES" => Some(2),
            _ => None,
        };
        if let Some(axis) = axis {
            let n: usize = parts
                .next()
                .and_then(|token| token.parse().ok())
                .ok_or_else(|| LegacyError::Parse(format!("invalid coordinate line: {line}")))?;
            let ty = ScalarType::parse(parts.next().unwrap_or("float"))?;
            axes[axis] = cur.read_values_f64(n, ty)?;
            continue;
        }
        match keyword.as_str() {
            "DIMENSIONS" => dims = read_triple_usize(&line)?,
            "POINT_DATA" => {
                let n = section_count(&line)?;
                point_data = parse_attribute_blocks(cur, n, true)?;
            }
            "CELL_DATA" => {
                let n = section_count(&line)?;
                let _ = parse_attribute_blocks(cur, n, false)?;
            }
            "METADATA" => skip_metadata(cur),
            _ => {
                return Err(LegacyError::Parse(format!(
                    "unexpected keyword in RECTILINEAR_GRID: {line}"
                )))
            }
        }
    }

    for (axis, coords) in axes.iter().enumerate() {
        if coords.len() != dims[axis] {
            return Err(LegacyError::Parse(format!(
                "axis {axis} declares {} coordinates, found {}",
                dims[axis],
                coords.len()
            )));
        }
    }

    let mut points = Vec::with_capacity(
        dims[0]
            .saturating_mul(dims[1])
            .saturating_mul(dims[2])
            .min(1 << 24),
    );
    for &z in &axes[2] {
        for &y in &axes[1] {
            for &x in &axes[0] {
                points.push([x, y, z]);
            }
        }
    }

    Ok(RawMesh::Structured(StructuredGrid {
        dims,
        points,
        point_data,
    }))
}

/// Tuple count of a `POINT_DATA n` / `CELL_DATA n` / `CELL_TYPES n` line.
fn section_count(line: &str) -> Result<usize, LegacyError> {
    line.split_whitespace()
        .nth(1)
        .and_then(|token| token.parse().ok())
        .ok_or_else(|| LegacyError::Parse(format!("invalid section line: {line}")))
}

fn read_triple_usize(line: &str) -> Result<[usize; 3], LegacyError> {
    let mut parts = line.split_whitespace().skip(1);
    let mut out = [0usize; 3];
    for slot in &mut out {
        *slot = parts
            .next()
            .and_then(|token| token.parse().ok())
            .ok_or_else(|| LegacyError::Parse(format!("invalid triple: {line}")))?;
    }
    Ok(out)
}

fn read_triple_f64(line: &str) -> Result<[f64; 3], LegacyError> {
    let mut parts = line.split_whitespace().skip(1);
    let mut out = [0.0f64; 3];
    for slot in &mut out {
        *slot = parts
            .next()
            .and_then(|token| token.parse().ok())
            .ok_or_else(|| LegacyError::Parse(format!("invalid triple: {line}")))?;
    }
    Ok(out)
}

/// Skip a METADATA block (terminated by a blank line).
fn skip_metadata(cur: &mut Cursor) {
    while let Some(line) = cur.read_line() {
        if line.is_empty() {
            break;
        }
    }
}
