//! Small value types shared across the header, directory, and tag decoders.

/// A 4-byte ICC signature, compared as a raw `u32` (big-endian byte order).
///
/// Used for both tag signatures (`rTRC`, `A2B1`, ...) and type signatures
/// (`curv`, `para`, `mAB `, ...) — ICC.1:2010 uses the same 4-character-code
/// convention for both, so one newtype covers both roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature(pub u32);

impl Signature {
    /// Builds a signature from its 4 ASCII bytes, e.g. `Signature::new(b"acsp")`.
    pub const fn new(b: &[u8; 4]) -> Self {
        Self(u32::from_be_bytes(*b))
    }

    pub const fn from_be_bytes(b: [u8; 4]) -> Self {
        Self(u32::from_be_bytes(b))
    }

    // Profile preamble.
    pub const ACSP: Self = Self::new(b"acsp");

    // Tag signatures (§6).
    pub const K_TRC: Self = Self::new(b"kTRC");
    pub const R_TRC: Self = Self::new(b"rTRC");
    pub const G_TRC: Self = Self::new(b"gTRC");
    pub const B_TRC: Self = Self::new(b"bTRC");
    pub const R_XYZ: Self = Self::new(b"rXYZ");
    pub const G_XYZ: Self = Self::new(b"gXYZ");
    pub const B_XYZ: Self = Self::new(b"bXYZ");
    pub const A2B0: Self = Self::new(b"A2B0");
    pub const A2B1: Self = Self::new(b"A2B1");

    // Payload type signatures.
    pub const XYZ: Self = Self::new(b"XYZ ");
    pub const PARA: Self = Self::new(b"para");
    pub const CURV: Self = Self::new(b"curv");
    pub const MFT1: Self = Self::new(b"mft1");
    pub const MFT2: Self = Self::new(b"mft2");
    pub const MAB: Self = Self::new(b"mAB ");
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bytes = self.0.to_be_bytes();
        match std::str::from_utf8(&bytes) {
            Ok(s) if s.chars().all(|c| !c.is_control()) => write!(f, "{s}"),
            _ => write!(f, "0x{:08X}", self.0),
        }
    }
}

/// ICC `dateTimeNumber`: year/month/day/hour/minute/second, each an
/// unsigned 16-bit value, in that order, as laid out in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateTime {
    pub year: u16,
    pub month: u16,
    pub day: u16,
    pub hour: u16,
    pub minute: u16,
    pub second: u16,
}

impl DateTime {
    pub(crate) fn parse(data: &[u8], offset: usize) -> Option<Self> {
        use crate::bytes::read_u16;
        Some(Self {
            year: read_u16(data, offset)?,
            month: read_u16(data, offset + 2)?,
            day: read_u16(data, offset + 4)?,
            hour: read_u16(data, offset + 6)?,
            minute: read_u16(data, offset + 8)?,
            second: read_u16(data, offset + 10)?,
        })
    }
}

/// An ICC `XYZNumber`: three s15Fixed16 values in X, Y, Z order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct XyzTriple {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl XyzTriple {
    pub(crate) fn parse(data: &[u8], offset: usize) -> Option<Self> {
        use crate::bytes::read_s15f16;
        Some(Self {
            x: read_s15f16(data, offset)?,
            y: read_s15f16(data, offset + 4)?,
            z: read_s15f16(data, offset + 8)?,
        })
    }
}
