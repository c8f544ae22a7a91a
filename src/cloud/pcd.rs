//! PCD (Point Cloud Data) v0.7 parser.
//!
//! A PCD file is a short text header followed by the point data, either as
//! whitespace-separated text or as packed little-endian records.
//!
//! # Format
//!
//! ```text
//! # .PCD v0.7 - Point Cloud Data file format
//! VERSION 0.7
//! FIELDS x y z rgb
//! SIZE 4 4 4 4
//! TYPE F F F U
//! COUNT 1 1 1 1
//! WIDTH 2
//! HEIGHT 1
//! VIEWPOINT 0 0 0 1 0 0 0
//! POINTS 2
//! DATA ascii
//! 0.1 0.2 0.3 16711680
//! 1.0 1.5 2.0 65280
//! ```
//!
//! `COUNT`, `VIEWPOINT` and `POINTS` may be omitted. `binary_compressed` data
//! is rejected.

use std::path::Path;

use serde::Serialize;

use super::{Cloud, PointXyz, PointXyzRgb, PointXyzSift, RecordKind, SIFT_DESCRIPTOR_LEN};

/// Errors produced while parsing or projecting a PCD file.
#[derive(Debug, thiserror::Error)]
pub enum PcdError {
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Header line {line}: {message}")]
    Header { line: usize, message: String },

    #[error("Header is missing the {0} entry")]
    MissingEntry(&'static str),

    #[error("Unsupported DATA encoding '{0}'")]
    UnsupportedEncoding(String),

    #[error("Point {point}: {message}")]
    Data { point: usize, message: String },

    #[error("Expected {expected} points but the data ends after {found}")]
    Truncated { expected: usize, found: usize },

    #[error("No {kind} data: field '{field}' is missing")]
    MissingField { kind: RecordKind, field: &'static str },
}

/// Storage type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldType {
    #[serde(rename = "F")]
    Float,
    #[serde(rename = "I")]
    Signed,
    #[serde(rename = "U")]
    Unsigned,
}

/// One column of the point layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PcdField {
    pub name: String,
    pub size: usize,
    #[serde(rename = "type")]
    pub kind: FieldType,
    pub count: usize,
}

impl PcdField {
    /// Fields holding a packed 0x00RRGGBB color.
    fn is_packed_color(&self) -> bool {
        self.name == "rgb" || self.name == "rgba"
    }
}

/// How the point data is stored after the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataEncoding {
    Ascii,
    Binary,
    BinaryCompressed,
}

/// Parsed PCD header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PcdHeader {
    pub version: String,
    pub fields: Vec<PcdField>,
    pub width: usize,
    pub height: usize,
    pub viewpoint: [f64; 7],
    pub points: usize,
    pub data: DataEncoding,
}

impl PcdHeader {
    /// Number of scalar values per point (sum of field counts).
    pub fn stride(&self) -> usize {
        self.fields.iter().map(|f| f.count).sum()
    }

    /// Size in bytes of one binary point record.
    pub fn point_size(&self) -> usize {
        self.fields.iter().map(|f| f.size * f.count).sum()
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&PcdField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Offset of a field's first value within a point's scalar row.
    fn value_offset(&self, name: &str) -> Option<usize> {
        let mut offset = 0;
        for field in &self.fields {
            if field.name == name {
                return Some(offset);
            }
            offset += field.count;
        }
        None
    }
}

/// A fully parsed PCD file.
///
/// Values are kept row-major as `f64`, one row of [`PcdHeader::stride`]
/// values per point. Packed color fields are stored as their integer
/// `0x00RRGGBB` value.
#[derive(Debug, Clone, PartialEq)]
pub struct PcdData {
    pub header: PcdHeader,
    values: Vec<f64>,
}

/// Header entries collected before the `DATA` line.
#[derive(Default)]
struct RawHeader {
    version: Option<String>,
    names: Option<Vec<String>>,
    sizes: Option<Vec<usize>>,
    types: Option<Vec<FieldType>>,
    counts: Option<Vec<usize>>,
    width: Option<usize>,
    height: Option<usize>,
    viewpoint: Option<[f64; 7]>,
    points: Option<usize>,
}

fn header_err(line: usize, message: impl Into<String>) -> PcdError {
    PcdError::Header {
        line,
        message: message.into(),
    }
}

fn parse_list<T: std::str::FromStr>(
    line: usize,
    key: &str,
    values: &[&str],
) -> Result<Vec<T>, PcdError> {
    values
        .iter()
        .map(|v| {
            v.parse::<T>()
                .map_err(|_| header_err(line, format!("invalid {} value '{}'", key, v)))
        })
        .collect()
}

fn parse_single<T: std::str::FromStr>(
    line: usize,
    key: &str,
    values: &[&str],
) -> Result<T, PcdError> {
    match values {
        [value] => value
            .parse::<T>()
            .map_err(|_| header_err(line, format!("invalid {} value '{}'", key, value))),
        _ => Err(header_err(line, format!("{} takes exactly one value", key))),
    }
}

impl RawHeader {
    fn apply(&mut self, line: usize, key: &str, values: &[&str]) -> Result<(), PcdError> {
        match key {
            "VERSION" => self.version = Some(values.join(" ")),
            "FIELDS" => self.names = Some(values.iter().map(|v| v.to_string()).collect()),
            "SIZE" => self.sizes = Some(parse_list(line, key, values)?),
            "TYPE" => {
                let types = values
                    .iter()
                    .map(|v| match *v {
                        "F" => Ok(FieldType::Float),
                        "I" => Ok(FieldType::Signed),
                        "U" => Ok(FieldType::Unsigned),
                        other => Err(header_err(line, format!("unknown TYPE '{}'", other))),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                self.types = Some(types);
            }
            "COUNT" => self.counts = Some(parse_list(line, key, values)?),
            "WIDTH" => self.width = Some(parse_single(line, key, values)?),
            "HEIGHT" => self.height = Some(parse_single(line, key, values)?),
            "VIEWPOINT" => {
                let vp: Vec<f64> = parse_list(line, key, values)?;
                let vp: [f64; 7] = vp
                    .try_into()
                    .map_err(|_| header_err(line, "VIEWPOINT takes seven values"))?;
                self.viewpoint = Some(vp);
            }
            "POINTS" => self.points = Some(parse_single(line, key, values)?),
            other => return Err(header_err(line, format!("unknown header entry '{}'", other))),
        }
        Ok(())
    }

    fn finish(self, line: usize, data: DataEncoding) -> Result<PcdHeader, PcdError> {
        let names = self.names.ok_or(PcdError::MissingEntry("FIELDS"))?;
        let sizes = self.sizes.ok_or(PcdError::MissingEntry("SIZE"))?;
        let types = self.types.ok_or(PcdError::MissingEntry("TYPE"))?;
        let counts = self.counts.unwrap_or_else(|| vec![1; names.len()]);
        let width = self.width.ok_or(PcdError::MissingEntry("WIDTH"))?;
        let height = self.height.unwrap_or(1);

        if names.is_empty() {
            return Err(header_err(line, "FIELDS lists no fields"));
        }
        if sizes.len() != names.len() || types.len() != names.len() || counts.len() != names.len() {
            return Err(header_err(
                line,
                format!(
                    "FIELDS lists {} entries but SIZE/TYPE/COUNT list {}/{}/{}",
                    names.len(),
                    sizes.len(),
                    types.len(),
                    counts.len()
                ),
            ));
        }

        let mut fields = Vec::with_capacity(names.len());
        for (((name, size), kind), count) in names.into_iter().zip(sizes).zip(types).zip(counts) {
            let valid_size = match kind {
                FieldType::Float => matches!(size, 4 | 8),
                FieldType::Signed | FieldType::Unsigned => matches!(size, 1 | 2 | 4 | 8),
            };
            if !valid_size {
                return Err(header_err(
                    line,
                    format!("field '{}' has unsupported size {}", name, size),
                ));
            }
            if count == 0 {
                return Err(header_err(line, format!("field '{}' has COUNT 0", name)));
            }
            fields.push(PcdField {
                name,
                size,
                kind,
                count,
            });
        }

        let points = match self.points {
            Some(points) => points,
            None => width
                .checked_mul(height)
                .ok_or_else(|| header_err(line, "WIDTH x HEIGHT is too large"))?,
        };

        // Every count below is bounded by `points * point_size`, so one
        // overflow check here covers the allocations made while parsing.
        let point_size = fields
            .iter()
            .try_fold(0usize, |acc, f| f.size.checked_mul(f.count)?.checked_add(acc))
            .ok_or_else(|| header_err(line, "point record size is too large"))?;
        if points.checked_mul(point_size).is_none() {
            return Err(header_err(line, format!("{} points is too many", points)));
        }

        Ok(PcdHeader {
            version: self.version.unwrap_or_else(|| "0.7".to_string()),
            fields,
            width,
            height,
            viewpoint: self.viewpoint.unwrap_or([0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]),
            points,
            data,
        })
    }
}

/// Parse a packed color written as text: either the integer value or a
/// float whose bit pattern is the packed value.
fn parse_packed_color(token: &str) -> Option<f64> {
    if let Ok(value) = token.parse::<u32>() {
        return Some(value as f64);
    }
    token
        .parse::<f32>()
        .ok()
        .map(|value| value.to_bits() as f64)
}

/// Read one little-endian scalar of the given type and size.
fn read_scalar(bytes: &[u8], field: &PcdField) -> f64 {
    let mut buf = [0u8; 8];
    buf[..field.size].copy_from_slice(&bytes[..field.size]);
    match (field.kind, field.size) {
        (FieldType::Float, 4) if field.is_packed_color() => {
            u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as f64
        }
        (FieldType::Float, 4) => f32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as f64,
        (FieldType::Float, _) => f64::from_le_bytes(buf),
        (FieldType::Signed, 1) => buf[0] as i8 as f64,
        (FieldType::Signed, 2) => i16::from_le_bytes([buf[0], buf[1]]) as f64,
        (FieldType::Signed, 4) => i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as f64,
        (FieldType::Signed, _) => i64::from_le_bytes(buf) as f64,
        (FieldType::Unsigned, 1) => buf[0] as f64,
        (FieldType::Unsigned, 2) => u16::from_le_bytes([buf[0], buf[1]]) as f64,
        (FieldType::Unsigned, 4) => u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as f64,
        (FieldType::Unsigned, _) => u64::from_le_bytes(buf) as f64,
    }
}

impl PcdData {
    /// Parse a PCD file from a filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PcdError> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::parse_bytes(&bytes)
    }

    /// Parse an ascii PCD file held in a string.
    pub fn parse_str(content: &str) -> Result<Self, PcdError> {
        Self::parse_bytes(content.as_bytes())
    }

    /// Parse a PCD file from raw bytes.
    ///
    /// The header is read line by line until the `DATA` entry; everything
    /// after that line is point data in the announced encoding.
    pub fn parse_bytes(bytes: &[u8]) -> Result<Self, PcdError> {
        let mut raw = RawHeader::default();
        let mut pos = 0;
        let mut line_num = 0;

        loop {
            if pos >= bytes.len() {
                return Err(PcdError::MissingEntry("DATA"));
            }
            line_num += 1;
            let end = bytes[pos..]
                .iter()
                .position(|&b| b == b'\n')
                .map_or(bytes.len(), |i| pos + i);
            let line = std::str::from_utf8(&bytes[pos..end])
                .map_err(|_| header_err(line_num, "header is not valid text"))?;
            pos = (end + 1).min(bytes.len());

            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut parts = line.split_whitespace();
            let key = parts.next().unwrap_or_default();
            let values: Vec<&str> = parts.collect();

            if key == "DATA" {
                let encoding = match values.as_slice() {
                    ["ascii"] => DataEncoding::Ascii,
                    ["binary"] => DataEncoding::Binary,
                    ["binary_compressed"] => DataEncoding::BinaryCompressed,
                    _ => return Err(PcdError::UnsupportedEncoding(values.join(" "))),
                };
                let header = raw.finish(line_num, encoding)?;
                let values = match encoding {
                    DataEncoding::Ascii => Self::parse_ascii(&header, &bytes[pos..])?,
                    DataEncoding::Binary => Self::parse_binary(&header, &bytes[pos..])?,
                    DataEncoding::BinaryCompressed => {
                        return Err(PcdError::UnsupportedEncoding(
                            "binary_compressed".to_string(),
                        ))
                    }
                };
                return Ok(PcdData { header, values });
            }

            raw.apply(line_num, key, &values)?;
        }
    }

    fn parse_ascii(header: &PcdHeader, body: &[u8]) -> Result<Vec<f64>, PcdError> {
        let text = std::str::from_utf8(body).map_err(|_| PcdError::Data {
            point: 0,
            message: "ascii data is not valid text".to_string(),
        })?;
        let stride = header.stride();
        // Each value takes at least one character and a separator.
        let mut values = Vec::with_capacity((header.points * stride).min(text.len() / 2 + 1));
        let mut found = 0;

        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if found == header.points {
                break;
            }
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < stride {
                return Err(PcdError::Data {
                    point: found,
                    message: format!("expected {} values, found {}", stride, tokens.len()),
                });
            }

            let mut tokens = tokens.into_iter();
            for field in &header.fields {
                for _ in 0..field.count {
                    let token = tokens.next().unwrap_or_default();
                    let value = if field.is_packed_color() {
                        parse_packed_color(token)
                    } else {
                        token.parse::<f64>().ok()
                    };
                    let value = value.ok_or_else(|| PcdError::Data {
                        point: found,
                        message: format!("invalid value '{}' for field '{}'", token, field.name),
                    })?;
                    values.push(value);
                }
            }
            found += 1;
        }

        if found < header.points {
            return Err(PcdError::Truncated {
                expected: header.points,
                found,
            });
        }
        Ok(values)
    }

    fn parse_binary(header: &PcdHeader, body: &[u8]) -> Result<Vec<f64>, PcdError> {
        let point_size = header.point_size();
        if point_size == 0 {
            return Err(PcdError::Data {
                point: 0,
                message: "point records have no fields".to_string(),
            });
        }
        let available = body.len() / point_size;
        if available < header.points {
            return Err(PcdError::Truncated {
                expected: header.points,
                found: available,
            });
        }

        let mut values = Vec::with_capacity(header.points * header.stride());
        for record in body.chunks_exact(point_size).take(header.points) {
            let mut offset = 0;
            for field in &header.fields {
                for _ in 0..field.count {
                    values.push(read_scalar(&record[offset..], field));
                    offset += field.size;
                }
            }
        }
        Ok(values)
    }

    /// Number of points in the file.
    pub fn len(&self) -> usize {
        self.header.points
    }

    pub fn is_empty(&self) -> bool {
        self.header.points == 0
    }

    /// Scalar row of a single point.
    fn row(&self, point: usize) -> &[f64] {
        let stride = self.header.stride();
        &self.values[point * stride..(point + 1) * stride]
    }

    fn require(&self, kind: RecordKind, field: &'static str) -> Result<usize, PcdError> {
        self.header
            .value_offset(field)
            .ok_or(PcdError::MissingField { kind, field })
    }

    /// Project the parsed data onto a record kind.
    ///
    /// Succeeds whenever the file carries the fields the kind needs; extra
    /// fields are ignored.
    pub fn project(&self, kind: RecordKind) -> Result<Cloud, PcdError> {
        let x = self.require(kind, "x")?;
        let y = self.require(kind, "y")?;
        let z = self.require(kind, "z")?;
        let points = 0..self.len();

        match kind {
            RecordKind::Xyz => Ok(Cloud::Xyz(
                points
                    .map(|i| {
                        let row = self.row(i);
                        PointXyz {
                            x: row[x] as f32,
                            y: row[y] as f32,
                            z: row[z] as f32,
                        }
                    })
                    .collect(),
            )),
            RecordKind::XyzRgb => {
                let color = self
                    .header
                    .value_offset("rgb")
                    .or_else(|| self.header.value_offset("rgba"))
                    .ok_or(PcdError::MissingField { kind, field: "rgb" })?;
                Ok(Cloud::XyzRgb(
                    points
                        .map(|i| {
                            let row = self.row(i);
                            let packed = row[color] as u32;
                            PointXyzRgb {
                                x: row[x] as f32,
                                y: row[y] as f32,
                                z: row[z] as f32,
                                r: ((packed >> 16) & 0xff) as u8,
                                g: ((packed >> 8) & 0xff) as u8,
                                b: (packed & 0xff) as u8,
                            }
                        })
                        .collect(),
                ))
            }
            RecordKind::XyzSift => {
                let descriptor = match self.header.field("descriptor") {
                    Some(field) if field.count == SIFT_DESCRIPTOR_LEN => {
                        self.require(kind, "descriptor")?
                    }
                    _ => {
                        return Err(PcdError::MissingField {
                            kind,
                            field: "descriptor",
                        })
                    }
                };
                let multiplicity = self.header.value_offset("multiplicity");
                let point_id = self.header.value_offset("pointId");
                Ok(Cloud::XyzSift(
                    points
                        .map(|i| {
                            let row = self.row(i);
                            let mut desc = [0.0f32; SIFT_DESCRIPTOR_LEN];
                            for (slot, value) in desc
                                .iter_mut()
                                .zip(&row[descriptor..descriptor + SIFT_DESCRIPTOR_LEN])
                            {
                                *slot = *value as f32;
                            }
                            PointXyzSift {
                                x: row[x] as f32,
                                y: row[y] as f32,
                                z: row[z] as f32,
                                multiplicity: multiplicity.map_or(0, |o| row[o] as i32),
                                point_id: point_id.map_or(0, |o| row[o] as i32),
                                descriptor: desc,
                            }
                        })
                        .collect(),
                ))
            }
        }
    }
}
