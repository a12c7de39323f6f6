//! The 132-byte fixed header: 128 bytes of profile metadata (ICC.1:2010
//! §7.2) followed by the 4-byte tag count.
//!
//! [`Header::parse`] only extracts fields; it does not apply the
//! preamble/size/version/illuminant validation rules from spec step 5–6 —
//! those live in [`crate::Profile::parse`], since they interact with values
//! (buffer length, tag directory bounds) that aren't known to the header
//! decoder alone.

use crate::bytes::{read_u32, read_u64};
use crate::types::{DateTime, Signature, XyzTriple};

/// Fixed header size in bytes, not counting the trailing tag count.
pub const HEADER_SIZE: usize = 128;

/// Fixed header size plus the 4-byte tag count that immediately follows it.
pub const HEADER_AND_COUNT_SIZE: usize = HEADER_SIZE + 4;

/// Decoded fields of the 128-byte header plus the tag count at offset 128.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Header {
    pub size: u32,
    pub cmm_type: u32,
    pub version_raw: u32,
    pub device_class: Signature,
    pub data_color_space: Signature,
    pub pcs: Signature,
    pub creation_date: DateTime,
    pub signature: Signature,
    pub platform: u32,
    pub flags: u32,
    pub manufacturer: u32,
    pub model: u32,
    pub attributes: u64,
    pub rendering_intent: u32,
    pub illuminant: XyzTriple,
    pub creator: u32,
    pub profile_id: [u8; 16],
    pub tag_count: u32,
}

impl Header {
    /// Major version number, i.e. `version_raw >> 24`.
    pub fn version_major(&self) -> u8 {
        (self.version_raw >> 24) as u8
    }

    /// Decodes the header and tag count from `data`. Returns `None` only if
    /// `data` is shorter than [`HEADER_AND_COUNT_SIZE`]; field values are not
    /// otherwise validated.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < HEADER_AND_COUNT_SIZE {
            return None;
        }

        Some(Self {
            size: read_u32(data, 0)?,
            cmm_type: read_u32(data, 4)?,
            version_raw: read_u32(data, 8)?,
            device_class: Signature(read_u32(data, 12)?),
            data_color_space: Signature(read_u32(data, 16)?),
            pcs: Signature(read_u32(data, 20)?),
            creation_date: DateTime::parse(data, 24)?,
            signature: Signature(read_u32(data, 36)?),
            platform: read_u32(data, 40)?,
            flags: read_u32(data, 44)?,
            manufacturer: read_u32(data, 48)?,
            model: read_u32(data, 52)?,
            attributes: read_u64(data, 56)?,
            rendering_intent: read_u32(data, 64)?,
            illuminant: XyzTriple::parse(data, 68)?,
            creator: read_u32(data, 80)?,
            profile_id: {
                let mut id = [0u8; 16];
                id.copy_from_slice(data.get(84..100)?);
                id
            },
            tag_count: read_u32(data, 128)?,
        })
    }
}

/// D50 illuminant as ICC.1:2010 specifies it, and the per-axis tolerance
/// used to accept a header's declared PCS illuminant.
pub const D50_ILLUMINANT: [f64; 3] = [0.9642, 1.0000, 0.8249];
pub const D50_TOLERANCE: f64 = 0.01;

/// True when `xyz` matches [`D50_ILLUMINANT`] within [`D50_TOLERANCE`] on
/// every axis.
pub fn is_d50(xyz: XyzTriple) -> bool {
    (xyz.x - D50_ILLUMINANT[0]).abs() <= D50_TOLERANCE
        && (xyz.y - D50_ILLUMINANT[1]).abs() <= D50_TOLERANCE
        && (xyz.z - D50_ILLUMINANT[2]).abs() <= D50_TOLERANCE
}
