/// PLY serialization of composed point records, and a reader for the files it writes.
///
/// Positions are written as `float16`, `float32` or `float64`; every other
/// channel is an unsigned byte quantized by clamping to 0..=255 and truncating.
use crate::compositor::PointBuffer;
use crate::config::{FloatPrecision, PlyFormat};
use crate::error::PlyError;
use constants::channel::{POSITION_PROPERTIES, quantize};
use glam::DVec3;
use half::f16;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

const END_HEADER: &str = "end_header";
const CHANNEL_TYPE: &str = "uchar";

/// Header text for `vertex_count` records, ending with `end_header\n`.
pub fn ply_header(
    vertex_count: usize,
    precision: FloatPrecision,
    format: PlyFormat,
    channel_names: &[&str],
) -> String {
    let mut header = format!(
        "ply\nformat {} 1.0\nelement vertex {}\n",
        format.header_name(),
        vertex_count
    );
    for name in POSITION_PROPERTIES {
        header.push_str(&format!("property {} {}\n", precision.property_type(), name));
    }
    for name in channel_names {
        header.push_str(&format!("property {} {}\n", CHANNEL_TYPE, name));
    }
    header.push_str(END_HEADER);
    header.push('\n');
    header
}

/// Position component rounded to the configured width.
fn at_precision(value: f64, precision: FloatPrecision) -> f64 {
    match precision {
        FloatPrecision::F16 => f16::from_f64(value).to_f64(),
        FloatPrecision::F32 => value as f32 as f64,
        FloatPrecision::F64 => value,
    }
}

fn push_position_bytes(bytes: &mut Vec<u8>, value: f64, precision: FloatPrecision) {
    match precision {
        FloatPrecision::F16 => bytes.extend_from_slice(&f16::from_f64(value).to_le_bytes()),
        FloatPrecision::F32 => bytes.extend_from_slice(&(value as f32).to_le_bytes()),
        FloatPrecision::F64 => bytes.extend_from_slice(&value.to_le_bytes()),
    }
}

/// Packed little-endian payload, one record after another.
fn binary_payload(buffer: &PointBuffer, precision: FloatPrecision) -> Vec<u8> {
    let record_size = 3 * precision.byte_width() + buffer.layout().attribute_count();
    let mut bytes = Vec::with_capacity(buffer.len() * record_size);

    for (position, channels) in buffer.records() {
        for value in position.to_array() {
            push_position_bytes(&mut bytes, value, precision);
        }
        bytes.extend(channels.iter().map(|&value| quantize(value)));
    }

    bytes
}

/// Whitespace-separated payload, one record per line.
fn ascii_payload(buffer: &PointBuffer, precision: FloatPrecision) -> String {
    let mut text = String::new();

    for (position, channels) in buffer.records() {
        let mut fields: Vec<String> = position
            .to_array()
            .iter()
            .map(|&value| format!("{:.6}", at_precision(value, precision)))
            .collect();
        fields.extend(channels.iter().map(|&value| quantize(value).to_string()));
        text.push_str(&fields.join(" "));
        text.push('\n');
    }

    text
}

/// Write a point buffer as a PLY file, creating parent directories as needed.
pub fn write_ply(
    path: &Path,
    buffer: &PointBuffer,
    precision: FloatPrecision,
    format: PlyFormat,
) -> Result<(), PlyError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let names = buffer.layout().property_names();
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(ply_header(buffer.len(), precision, format, &names).as_bytes())?;

    match format {
        PlyFormat::Binary => writer.write_all(&binary_payload(buffer, precision))?,
        PlyFormat::Ascii => writer.write_all(ascii_payload(buffer, precision).as_bytes())?,
    }

    writer.flush()?;
    log::debug!("Saved {} ({} vertices)", path.display(), buffer.len());
    Ok(())
}

/// Decoded contents of a PLY file.
#[derive(Debug, Clone, PartialEq)]
pub struct PlyData {
    pub format: PlyFormat,
    pub precision: FloatPrecision,
    /// Names of the byte channels following x, y, z.
    pub channel_names: Vec<String>,
    pub positions: Vec<DVec3>,
    channels: Vec<u8>,
}

impl PlyData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn channel_count(&self) -> usize {
        self.channel_names.len()
    }

    /// Every property name in file order, positions included.
    pub fn property_names(&self) -> Vec<&str> {
        POSITION_PROPERTIES
            .iter()
            .copied()
            .chain(self.channel_names.iter().map(String::as_str))
            .collect()
    }

    /// Byte channels of vertex `index`.
    pub fn channels(&self, index: usize) -> &[u8] {
        let width = self.channel_count();
        &self.channels[index * width..(index + 1) * width]
    }
}

struct PlyHeader {
    format: PlyFormat,
    precision: FloatPrecision,
    vertex_count: usize,
    channel_names: Vec<String>,
}

fn parse_precision(type_name: &str) -> Result<FloatPrecision, PlyError> {
    match type_name {
        "float16" | "half" => Ok(FloatPrecision::F16),
        "float32" | "float" => Ok(FloatPrecision::F32),
        "float64" | "double" => Ok(FloatPrecision::F64),
        other => Err(PlyError::PropertyType(other.to_string())),
    }
}

fn next_line<R: BufRead>(reader: &mut R) -> Result<String, PlyError> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(PlyError::Header("missing end_header".to_string()));
    }
    Ok(line.trim().to_string())
}

fn read_header<R: BufRead>(reader: &mut R) -> Result<PlyHeader, PlyError> {
    if next_line(reader)? != "ply" {
        return Err(PlyError::Header("missing 'ply' magic".to_string()));
    }

    let mut format = None;
    let mut vertex_count = None;
    let mut position_types = Vec::new();
    let mut channel_names = Vec::new();

    loop {
        let line = next_line(reader)?;
        let tokens: Vec<&str> = line.split_whitespace().collect();

        match tokens.as_slice() {
            [END_HEADER] => break,
            ["comment", ..] | [] => {}
            ["format", "binary_little_endian", _] => format = Some(PlyFormat::Binary),
            ["format", "ascii", _] => format = Some(PlyFormat::Ascii),
            ["format", other, ..] => {
                return Err(PlyError::Header(format!("unsupported format '{}'", other)));
            }
            ["element", "vertex", count] => {
                vertex_count = Some(count.parse::<usize>().map_err(|_| {
                    PlyError::Header(format!("invalid vertex count '{}'", count))
                })?)
            }
            ["property", type_name, name] => {
                if position_types.len() < POSITION_PROPERTIES.len() {
                    let expected = POSITION_PROPERTIES[position_types.len()];
                    if *name != expected {
                        return Err(PlyError::Header(format!(
                            "expected property '{}', found '{}'",
                            expected, name
                        )));
                    }
                    position_types.push(parse_precision(type_name)?);
                } else if *type_name == CHANNEL_TYPE {
                    channel_names.push(name.to_string());
                } else {
                    return Err(PlyError::PropertyType(type_name.to_string()));
                }
            }
            _ => return Err(PlyError::Header(format!("unexpected line '{}'", line))),
        }
    }

    let format = format.ok_or_else(|| PlyError::Header("missing format line".to_string()))?;
    let vertex_count =
        vertex_count.ok_or_else(|| PlyError::Header("missing vertex element".to_string()))?;
    let precision = match position_types.as_slice() {
        [x, y, z] if x == y && y == z => *x,
        [_, _, _] => {
            return Err(PlyError::Header(
                "x, y and z must share one float type".to_string(),
            ));
        }
        _ => return Err(PlyError::Header("missing position properties".to_string())),
    };

    Ok(PlyHeader {
        format,
        precision,
        vertex_count,
        channel_names,
    })
}

fn read_position(bytes: &[u8], precision: FloatPrecision) -> f64 {
    match precision {
        FloatPrecision::F16 => f16::from_le_bytes([bytes[0], bytes[1]]).to_f64(),
        FloatPrecision::F32 => {
            f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64
        }
        FloatPrecision::F64 => {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&bytes[..8]);
            f64::from_le_bytes(raw)
        }
    }
}

fn decode_binary(
    payload: &[u8],
    header: &PlyHeader,
) -> Result<(Vec<DVec3>, Vec<u8>), PlyError> {
    let width = header.precision.byte_width();
    let channel_count = header.channel_names.len();
    let record_size = 3 * width + channel_count;

    let available = payload.len() / record_size;
    if available < header.vertex_count {
        return Err(PlyError::Truncated {
            read: available,
            expected: header.vertex_count,
        });
    }

    let mut positions = Vec::with_capacity(header.vertex_count);
    let mut channels = Vec::with_capacity(header.vertex_count * channel_count);

    for record in payload.chunks_exact(record_size).take(header.vertex_count) {
        let x = read_position(&record[..width], header.precision);
        let y = read_position(&record[width..2 * width], header.precision);
        let z = read_position(&record[2 * width..3 * width], header.precision);
        positions.push(DVec3::new(x, y, z));
        channels.extend_from_slice(&record[3 * width..]);
    }

    Ok((positions, channels))
}

fn decode_ascii(payload: &[u8], header: &PlyHeader) -> Result<(Vec<DVec3>, Vec<u8>), PlyError> {
    let text = String::from_utf8_lossy(payload);
    let channel_count = header.channel_names.len();

    let mut positions = Vec::new();
    let mut channels = Vec::new();

    let rows = text.lines().filter(|line| !line.trim().is_empty());
    for row in rows.take(header.vertex_count) {
        let tokens: Vec<&str> = row.split_whitespace().collect();
        if tokens.len() != 3 + channel_count {
            return Err(PlyError::ChannelCount {
                found: tokens.len().saturating_sub(3),
                expected: channel_count,
            });
        }

        let mut xyz = [0.0; 3];
        for (slot, token) in xyz.iter_mut().zip(&tokens[..3]) {
            *slot = token
                .parse()
                .map_err(|_| PlyError::AsciiValue(token.to_string()))?;
        }
        positions.push(DVec3::from_array(xyz));

        for token in &tokens[3..] {
            channels.push(
                token
                    .parse()
                    .map_err(|_| PlyError::AsciiValue(token.to_string()))?,
            );
        }
    }

    if positions.len() < header.vertex_count {
        return Err(PlyError::Truncated {
            read: positions.len(),
            expected: header.vertex_count,
        });
    }

    Ok((positions, channels))
}

/// Read a PLY file in either payload format.
pub fn read_ply(path: &Path) -> Result<PlyData, PlyError> {
    let mut reader = BufReader::new(File::open(path)?);
    let header = read_header(&mut reader)?;

    let mut payload = Vec::new();
    reader.read_to_end(&mut payload)?;

    let (positions, channels) = match header.format {
        PlyFormat::Binary => decode_binary(&payload, &header)?,
        PlyFormat::Ascii => decode_ascii(&payload, &header)?,
    };

    Ok(PlyData {
        format: header.format,
        precision: header.precision,
        channel_names: header.channel_names,
        positions,
        channels,
    })
}
