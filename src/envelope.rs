//! Versioned binary container for whole save files.
//!
//! A save file is a three-tier envelope: a magic tag and format version,
//! an engine/content version block (round-tripped verbatim so field
//! decoders can apply forward-compatible rules), and the payload bytes of
//! the root object. Files written before versioning was introduced carry
//! no tag at all; decoding falls back to parsing them as a bare
//! `root type + payload` pair, never as an error.
//!
//! Compression is an independent outer layer: [`compress`]/[`decompress`]
//! wrap the encoded bytes in a zlib stream, and [`decode`] never needs to
//! know whether that happened. The storage layer decides, based on the
//! slot's compressed flag.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use crate::types::SaveError;

/// Magic tag identifying a versioned save container.
pub const SAVE_FILE_TAG: u32 = 0x5341_5647;

/// First versioned format.
pub const FORMAT_VERSION_INITIAL: u32 = 1;
/// Added the custom-version block after the engine version.
pub const FORMAT_VERSION_CUSTOM_VERSIONS: u32 = 2;
/// Format written by [`encode`].
pub const FORMAT_VERSION_LATEST: u32 = FORMAT_VERSION_CUSTOM_VERSIONS;

/// Current content-system version written into new files.
pub const CONTENT_VERSION: u32 = 1;

/// Serialization format tag for the custom-version block.
const CUSTOM_VERSION_FORMAT: u32 = 1;

/// Engine/content version record. Opaque to the save system; it is
/// written on encode and handed back verbatim on decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineVersion {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
    pub changelist: u32,
    pub branch: String,
}

impl EngineVersion {
    pub fn current() -> Self {
        EngineVersion {
            major: env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0),
            minor: env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0),
            patch: env!("CARGO_PKG_VERSION_PATCH").parse().unwrap_or(0),
            changelist: 0,
            branch: String::new(),
        }
    }

    fn zero() -> Self {
        EngineVersion { major: 0, minor: 0, patch: 0, changelist: 0, branch: String::new() }
    }
}

/// One (namespace, version) pair from the custom-version block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomVersion {
    pub key: u32,
    pub version: u32,
}

/// Everything the header of a versioned file carries besides the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub format_version: u32,
    pub content_version: u32,
    pub engine: EngineVersion,
    pub custom_versions: Vec<CustomVersion>,
}

impl VersionInfo {
    /// Version info written into new files.
    pub fn current() -> Self {
        VersionInfo {
            format_version: FORMAT_VERSION_LATEST,
            content_version: CONTENT_VERSION,
            engine: EngineVersion::current(),
            custom_versions: Vec::new(),
        }
    }

    /// Version info assumed for tagless legacy files.
    pub fn legacy() -> Self {
        VersionInfo {
            format_version: FORMAT_VERSION_INITIAL,
            content_version: 0,
            engine: EngineVersion::zero(),
            custom_versions: Vec::new(),
        }
    }
}

/// A decoded save container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub info: VersionInfo,
    pub root_type: String,
    pub payload: Vec<u8>,
}

// All integers are little-endian, matching the single fixed byte order of
// the on-disk format.

fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_string(out: &mut Vec<u8>, value: &str) {
    put_u32(out, value.len() as u32);
    out.extend_from_slice(value.as_bytes());
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Reader { bytes, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], SaveError> {
        if self.bytes.len() - self.pos < len {
            return Err(SaveError::Corrupted(format!(
                "unexpected end of data at offset {}",
                self.pos
            )));
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn read_u16(&mut self) -> Result<u16, SaveError> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn read_u32(&mut self) -> Result<u32, SaveError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_string(&mut self) -> Result<String, SaveError> {
        let len = self.read_u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| SaveError::Corrupted("string is not valid UTF-8".to_string()))
    }

    fn rest(self) -> Vec<u8> {
        self.bytes[self.pos..].to_vec()
    }
}

/// Encode a payload into the latest versioned container format.
pub fn encode(payload: &[u8], info: &VersionInfo, root_type: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 64);
    put_u32(&mut out, SAVE_FILE_TAG);
    put_u32(&mut out, info.format_version);
    put_u32(&mut out, info.content_version);
    put_u16(&mut out, info.engine.major);
    put_u16(&mut out, info.engine.minor);
    put_u16(&mut out, info.engine.patch);
    put_u32(&mut out, info.engine.changelist);
    put_string(&mut out, &info.engine.branch);
    if info.format_version >= FORMAT_VERSION_CUSTOM_VERSIONS {
        put_u32(&mut out, CUSTOM_VERSION_FORMAT);
        put_u32(&mut out, info.custom_versions.len() as u32);
        for version in &info.custom_versions {
            put_u32(&mut out, version.key);
            put_u32(&mut out, version.version);
        }
    }
    put_string(&mut out, root_type);
    out.extend_from_slice(payload);
    out
}

/// Decode a container, auto-detecting the legacy tagless format.
pub fn decode(bytes: &[u8]) -> Result<Envelope, SaveError> {
    let mut reader = Reader::new(bytes);
    match reader.read_u32() {
        Ok(tag) if tag == SAVE_FILE_TAG => {}
        // No tag at offset 0: an old save written before versioning.
        _ => return decode_legacy(bytes),
    }

    let format_version = reader.read_u32()?;
    let content_version = reader.read_u32()?;
    let engine = EngineVersion {
        major: reader.read_u16()?,
        minor: reader.read_u16()?,
        patch: reader.read_u16()?,
        changelist: reader.read_u32()?,
        branch: reader.read_string()?,
    };

    let mut custom_versions = Vec::new();
    if format_version >= FORMAT_VERSION_CUSTOM_VERSIONS {
        let _format = reader.read_u32()?;
        let count = reader.read_u32()?;
        for _ in 0..count {
            custom_versions.push(CustomVersion {
                key: reader.read_u32()?,
                version: reader.read_u32()?,
            });
        }
    }

    let root_type = reader.read_string()?;
    Ok(Envelope {
        info: VersionInfo { format_version, content_version, engine, custom_versions },
        root_type,
        payload: reader.rest(),
    })
}

/// Parse a legacy, unversioned container: the whole file is the root type
/// identifier followed by the raw payload.
pub fn decode_legacy(bytes: &[u8]) -> Result<Envelope, SaveError> {
    let mut reader = Reader::new(bytes);
    let root_type = reader.read_string()?;
    Ok(Envelope {
        info: VersionInfo::legacy(),
        root_type,
        payload: reader.rest(),
    })
}

/// Compress container bytes with zlib. Lossless for any input, including
/// an empty one.
pub fn compress(bytes: &[u8]) -> Result<Vec<u8>, SaveError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    Ok(encoder.finish()?)
}

/// Reverse of [`compress`].
pub fn decompress(bytes: &[u8]) -> Result<Vec<u8>, SaveError> {
    let mut decoder = ZlibDecoder::new(bytes);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}
