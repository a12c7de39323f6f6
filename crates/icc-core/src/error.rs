//! Error type for ICC profile parsing.
//!
//! Every condition here corresponds to a specific validation rule in the
//! header, tag directory, or one of the payload decoders. The public
//! [`crate::Profile::parse`] entry point collapses to "parse failed" for a
//! caller that only cares about success or failure, but the variant is kept
//! around for tests and for any caller that wants to know which rule fired.

use thiserror::Error;

/// Result type for ICC parsing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while parsing or decoding an ICC profile.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Buffer shorter than the 132-byte fixed header + tag count.
    #[error("buffer too small: need at least {needed} bytes, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },

    /// Header signature was not `'acsp'`.
    #[error("wrong profile signature: 0x{0:08X}")]
    WrongPreamble(u32),

    /// `profile.size` field exceeds the buffer actually supplied.
    #[error("profile size {header_size} exceeds buffer length {buffer_len}")]
    SizeExceedsBuffer { header_size: u32, buffer_len: usize },

    /// `profile.size` is too small to hold the declared tag directory.
    #[error("profile size {header_size} too small for {tag_count} tag directory entries")]
    SizeTooSmallForDirectory { header_size: u32, tag_count: u32 },

    /// Major version byte above the highest version this parser accepts.
    #[error("unsupported profile major version: {0}")]
    UnsupportedVersion(u8),

    /// PCS illuminant did not match D50 within tolerance.
    #[error("illuminant {0:?} is not within 0.01 of D50 (0.9642, 1.0, 0.8249)")]
    IlluminantNotD50([f64; 3]),

    /// A tag directory entry declared a size below the 4-byte minimum.
    #[error("tag directory entry {index} has size {size} < 4")]
    TagEntryTooSmall { index: usize, size: u32 },

    /// A tag directory entry's `offset + size` exceeds `profile.size`.
    #[error(
        "tag directory entry {index} (sig 0x{signature:08X}) out of bounds: offset {offset} + size {size} > profile size {profile_size}"
    )]
    TagOutOfBounds {
        index: usize,
        signature: u32,
        offset: u32,
        size: u32,
        profile_size: u32,
    },

    /// A present, pre-parsed curve tag (`kTRC`, `rTRC`/`gTRC`/`bTRC`) failed
    /// type-specific validation.
    #[error("curve tag 0x{signature:08X} malformed: {reason}")]
    MalformedCurve { signature: u32, reason: &'static str },

    /// A present `{r,g,b}XYZ` tag failed type-specific validation.
    #[error("XYZ tag 0x{signature:08X} malformed: {reason}")]
    MalformedXyz { signature: u32, reason: &'static str },

    /// The selected `A2B*` tag failed type-specific validation.
    #[error("A2B tag 0x{signature:08X} malformed: {reason}")]
    MalformedA2B { signature: u32, reason: &'static str },

    /// Arithmetic that would overflow while validating an offset, a grid
    /// byte count, or a curve-block advance.
    #[error("size/offset arithmetic overflow: {0}")]
    ArithmeticOverflow(&'static str),
}
