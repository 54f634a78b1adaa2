//! Layer encodings for voxel data.
//!
//! A structure is stored one Z layer at a time, each layer `X*Y` bytes of
//! palette indices in X-fastest order.

use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use serde::{Deserialize, Serialize};
use voxsim_types::{VoxsimError, VoxsimResult};

/// Offset added to each byte by the readable encoding (`'0'`).
const ASCII_OFFSET: u32 = 48;

/// How layer bytes are written into the document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    /// One character per voxel, `'0' + index`.
    AsciiReadable,
    /// Base64 of the raw bytes.
    Base64,
    /// Zlib-compressed bytes, then base64.
    #[default]
    Zlib,
    /// Bytes as characters. Deprecated; read only.
    Raw,
}

impl Compression {
    /// Attribute value used in the document.
    pub fn tag(&self) -> &'static str {
        match self {
            Compression::AsciiReadable => "ASCII_READABLE",
            Compression::Base64 => "BASE64",
            Compression::Zlib => "ZLIB",
            Compression::Raw => "RAW_DATA",
        }
    }

    /// Parses the document attribute. Unknown or absent values mean the
    /// readable encoding.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "BASE64" => Compression::Base64,
            "ZLIB" | "QT_ZLIB" => Compression::Zlib,
            "RAW_DATA" => Compression::Raw,
            _ => Compression::AsciiReadable,
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Compression {
    type Err = VoxsimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ascii" | "ascii_readable" => Ok(Compression::AsciiReadable),
            "base64" => Ok(Compression::Base64),
            "zlib" => Ok(Compression::Zlib),
            other => Err(VoxsimError::InvalidConfig(format!(
                "unknown compression '{other}' (expected ascii, base64 or zlib)"
            ))),
        }
    }
}

/// Encodes one layer of voxel bytes.
pub fn encode_layer(bytes: &[u8], compression: Compression) -> VoxsimResult<String> {
    match compression {
        Compression::AsciiReadable => Ok(bytes
            .iter()
            .filter_map(|&b| char::from_u32(b as u32 + ASCII_OFFSET))
            .collect()),
        Compression::Base64 => Ok(STANDARD.encode(bytes)),
        Compression::Zlib => {
            let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(bytes)?;
            Ok(STANDARD.encode(encoder.finish()?))
        }
        Compression::Raw => Err(VoxsimError::Serialization(
            "raw layer data is deprecated; choose another compression".into(),
        )),
    }
}

/// Decodes one layer and checks it holds exactly `expected` bytes.
pub fn decode_layer(
    text: &str,
    compression: Compression,
    expected: usize,
) -> VoxsimResult<Vec<u8>> {
    let bytes = match compression {
        Compression::AsciiReadable => text
            .chars()
            .map(|c| {
                u8::try_from((c as u32).wrapping_sub(ASCII_OFFSET)).map_err(|_| {
                    VoxsimError::Parse(format!("character {c:?} is not a readable voxel value"))
                })
            })
            .collect::<VoxsimResult<Vec<u8>>>()?,
        Compression::Base64 => decode_base64(text)?,
        Compression::Zlib => {
            let packed = decode_base64(text)?;
            // one byte past `expected` is enough to detect an oversized layer
            let limit = u64::try_from(expected).unwrap_or(u64::MAX).saturating_add(1);
            let mut out = Vec::new();
            ZlibDecoder::new(packed.as_slice())
                .take(limit)
                .read_to_end(&mut out)
                .map_err(|e| VoxsimError::Parse(format!("zlib layer data: {e}")))?;
            out
        }
        Compression::Raw => text.chars().filter_map(|c| u8::try_from(c as u32).ok()).collect(),
    };
    if bytes.len() != expected {
        return Err(layer_size_error());
    }
    Ok(bytes)
}

fn decode_base64(text: &str) -> VoxsimResult<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| VoxsimError::Parse(format!("base64 layer data: {e}")))
}

pub(crate) fn layer_size_error() -> VoxsimError {
    VoxsimError::Parse("Voxel layer data not present or does not match expected size.".into())
}

/// Comma-separated values of one auxiliary layer.
pub fn encode_values(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Parses a comma-separated layer. Missing or malformed cells read as zero.
pub fn decode_values(text: &str, expected: usize) -> Vec<f64> {
    let mut out: Vec<f64> = text
        .split(',')
        .take(expected)
        .map(|s| s.trim().parse().unwrap_or(0.0))
        .collect();
    out.resize(expected, 0.0);
    out
}
