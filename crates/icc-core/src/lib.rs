//! Parser for ICC.1:2010 color profiles.
//!
//! Given an untrusted byte buffer, [`Profile::parse`] validates the 128-byte
//! header and tag directory, then decodes the subset of tag payloads needed
//! to reconstruct an RGB-to-XYZ(D50) linear transform and a general A-to-B
//! lookup pipeline. Every payload is interpreted in place: a [`Profile`]
//! borrows its input buffer for its entire lifetime and never copies a tag's
//! bytes.
//!
//! [`fit::approximate`] separately fits a sampled [`curve::Curve`] with the
//! seven-parameter parametric form, for callers that need a closed-form
//! approximation of an arbitrary tone curve.

#![forbid(unsafe_code)]

pub mod bytes;
pub mod curve;
pub mod directory;
pub mod error;
pub mod fit;
pub mod header;
pub mod lut;
pub mod profile;
pub mod types;

pub use curve::{BitWidth, Curve, ParametricCurve};
pub use directory::{TagDirectory, TagHandle, TagIterator};
pub use error::{Error, Result};
pub use fit::{approximate, are_approximate_inverses};
pub use header::Header;
pub use lut::{Grid, A2B};
pub use profile::Profile;
pub use types::{DateTime, Signature, XyzTriple};
