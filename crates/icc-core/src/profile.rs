//! Top-level parse: header + tag directory, followed by a fixed-order
//! pre-parse of the well-known tags needed to reconstruct the two color
//! transforms this crate cares about (§4.2).

use crate::curve::{self, Curve};
use crate::directory::{TagDirectory, TagHandle};
use crate::error::Error;
use crate::header::{self, Header};
use crate::lut::{self, A2B};
use crate::types::{Signature, XyzTriple};

/// A parsed, validated ICC profile. Borrows the buffer it was parsed from
/// for its entire lifetime; no tag payload is copied.
///
/// `Profile<'a>` holds only borrowed slices and `Copy` scalar data, so it is
/// `Send + Sync` whenever the borrowed buffer is `Sync` — no interior
/// mutability is ever introduced after [`Profile::parse`] returns.
#[derive(Debug, Clone)]
pub struct Profile<'a> {
    buffer: &'a [u8],
    pub size: u32,
    pub cmm_type: u32,
    pub version_raw: u32,
    pub device_class: Signature,
    pub data_color_space: Signature,
    pub pcs: Signature,
    pub creation_date: crate::types::DateTime,
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
    directory: TagDirectory<'a>,
    trc: Option<[Curve<'a>; 3]>,
    to_xyz_d50: Option<[[f64; 3]; 3]>,
    a2b: Option<A2B<'a>>,
}

impl<'a> Profile<'a> {
    /// Major version byte, i.e. `version_raw >> 24`.
    pub fn version_major(&self) -> u8 {
        (self.version_raw >> 24) as u8
    }

    /// The buffer this profile was parsed from.
    pub fn buffer(&self) -> &'a [u8] {
        self.buffer
    }

    pub fn has_trc(&self) -> bool {
        self.trc.is_some()
    }

    /// Per-channel (R, G, B) transfer curves, if present.
    pub fn trc(&self) -> Option<&[Curve<'a>; 3]> {
        self.trc.as_ref()
    }

    pub fn has_to_xyz_d50(&self) -> bool {
        self.to_xyz_d50.is_some()
    }

    /// Column-major RGB-to-XYZ(D50) matrix, if present.
    pub fn to_xyz_d50(&self) -> Option<&[[f64; 3]; 3]> {
        self.to_xyz_d50.as_ref()
    }

    pub fn has_a2b(&self) -> bool {
        self.a2b.is_some()
    }

    pub fn a2b(&self) -> Option<&A2B<'a>> {
        self.a2b.as_ref()
    }

    /// Looks up a tag directory entry by its four-byte signature.
    pub fn tag_by_signature(&self, sig: Signature) -> Option<TagHandle<'a>> {
        self.directory.get_by_signature(sig)
    }

    /// Looks up a tag directory entry by index. `i` must be `< tag_count`.
    pub fn tag_by_index(&self, i: usize) -> Option<TagHandle<'a>> {
        self.directory.get_by_index(i)
    }

    /// Validates `buffer` as a well-formed ICC profile and decodes its
    /// header, tag directory, and the well-known tags listed in §4.2.
    pub fn parse(buffer: &'a [u8]) -> Result<Self, Error> {
        if buffer.len() < header::HEADER_AND_COUNT_SIZE {
            return Err(Error::BufferTooSmall {
                needed: header::HEADER_AND_COUNT_SIZE,
                actual: buffer.len(),
            });
        }

        let head = Header::parse(buffer).expect("length checked above");

        if head.signature != Signature::ACSP {
            return Err(Error::WrongPreamble(head.signature.0));
        }
        if head.size as usize > buffer.len() {
            return Err(Error::SizeExceedsBuffer {
                header_size: head.size,
                buffer_len: buffer.len(),
            });
        }
        let directory_bound = 132u64 + 12u64 * head.tag_count as u64;
        if (head.size as u64) < directory_bound {
            return Err(Error::SizeTooSmallForDirectory {
                header_size: head.size,
                tag_count: head.tag_count,
            });
        }
        if head.version_major() > 4 {
            return Err(Error::UnsupportedVersion(head.version_major()));
        }
        if !header::is_d50(head.illuminant) {
            return Err(Error::IlluminantNotD50([
                head.illuminant.x,
                head.illuminant.y,
                head.illuminant.z,
            ]));
        }

        let directory = TagDirectory::parse(buffer, head.tag_count, head.size)?;

        let mut trc = None;
        let mut to_xyz_d50 = None;
        let mut a2b = None;

        if let Some(handle) = directory.get_by_signature(Signature::K_TRC) {
            let (c, _) = curve::decode(handle.data).map_err(|_| Error::MalformedCurve {
                signature: Signature::K_TRC.0,
                reason: "kTRC payload malformed",
            })?;
            trc = Some([c, c, c]);
            to_xyz_d50 = Some(diagonal(head.illuminant));
        } else if let (Some(r), Some(g), Some(b)) = (
            directory.get_by_signature(Signature::R_TRC),
            directory.get_by_signature(Signature::G_TRC),
            directory.get_by_signature(Signature::B_TRC),
        ) {
            let (rc, _) = curve::decode(r.data).map_err(|_| Error::MalformedCurve {
                signature: Signature::R_TRC.0,
                reason: "rTRC payload malformed",
            })?;
            let (gc, _) = curve::decode(g.data).map_err(|_| Error::MalformedCurve {
                signature: Signature::G_TRC.0,
                reason: "gTRC payload malformed",
            })?;
            let (bc, _) = curve::decode(b.data).map_err(|_| Error::MalformedCurve {
                signature: Signature::B_TRC.0,
                reason: "bTRC payload malformed",
            })?;
            trc = Some([rc, gc, bc]);
        }

        if let (Some(r), Some(g), Some(b)) = (
            directory.get_by_signature(Signature::R_XYZ),
            directory.get_by_signature(Signature::G_XYZ),
            directory.get_by_signature(Signature::B_XYZ),
        ) {
            let rx = decode_xyz_tag(r.data, Signature::R_XYZ.0)?;
            let gx = decode_xyz_tag(g.data, Signature::G_XYZ.0)?;
            let bx = decode_xyz_tag(b.data, Signature::B_XYZ.0)?;
            to_xyz_d50 = Some([
                [rx.x, gx.x, bx.x],
                [rx.y, gx.y, bx.y],
                [rx.z, gx.z, bx.z],
            ]);
        }

        let a2b_handle = directory
            .get_by_signature(Signature::A2B1)
            .or_else(|| directory.get_by_signature(Signature::A2B0));
        if let Some(handle) = a2b_handle {
            let decoded = lut::decode(handle.data).map_err(|_| Error::MalformedA2B {
                signature: handle.signature.0,
                reason: "A2B payload malformed",
            })?;
            a2b = Some(decoded);
        }

        Ok(Self {
            buffer,
            size: head.size,
            cmm_type: head.cmm_type,
            version_raw: head.version_raw,
            device_class: head.device_class,
            data_color_space: head.data_color_space,
            pcs: head.pcs,
            creation_date: head.creation_date,
            signature: head.signature,
            platform: head.platform,
            flags: head.flags,
            manufacturer: head.manufacturer,
            model: head.model,
            attributes: head.attributes,
            rendering_intent: head.rendering_intent,
            illuminant: head.illuminant,
            creator: head.creator,
            profile_id: head.profile_id,
            tag_count: head.tag_count,
            directory,
            trc,
            to_xyz_d50,
            a2b,
        })
    }
}

fn diagonal(illuminant: XyzTriple) -> [[f64; 3]; 3] {
    [
        [illuminant.x, 0.0, 0.0],
        [0.0, illuminant.y, 0.0],
        [0.0, 0.0, illuminant.z],
    ]
}

/// Decodes an `XYZ ` tag payload (type signature + reserved + one
/// `XYZNumber`) as used by `rXYZ`/`gXYZ`/`bXYZ`.
fn decode_xyz_tag(data: &[u8], signature: u32) -> Result<XyzTriple, Error> {
    if data.len() < 20 {
        return Err(Error::MalformedXyz {
            signature,
            reason: "XYZ payload shorter than 20 bytes",
        });
    }
    if crate::bytes::read_u32(data, 0) != Some(Signature::XYZ.0) {
        return Err(Error::MalformedXyz {
            signature,
            reason: "wrong type signature for an XYZ tag",
        });
    }
    XyzTriple::parse(data, 8).ok_or(Error::MalformedXyz {
        signature,
        reason: "XYZ coefficients read past buffer",
    })
}
