//! Curve tag decoding and evaluation.
//!
//! ICC profiles describe tone reproduction with two payload shapes: `para`
//! (a parametric formula, 5 variants) and `curv` (a sampled lookup table,
//! possibly canonicalized down to a parametric identity or gamma). Both
//! decode into the same [`Curve`] value so callers never need to know which
//! shape a given tag actually used. `curv` tables are 16-bit per
//! ICC.1:2010, but [`Curve::Sampled`] also carries 8-bit tables produced by
//! the `mft1` decoder in [`crate::lut`], which shares this evaluator.

use crate::bytes::{read_s15f16, read_u16, read_u32};
use crate::error::Error;
use crate::types::Signature;

/// The bit width of a sampled curve's table entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitWidth {
    Eight,
    Sixteen,
}

/// The seven-coefficient parametric curve: `y = (a*x + b)^g + e` for
/// `x >= d`, else `y = c*x + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParametricCurve {
    pub g: f64,
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl ParametricCurve {
    pub fn identity() -> Self {
        Self {
            g: 1.0,
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 0.0,
            e: 0.0,
            f: 0.0,
        }
    }

    pub fn eval(&self, x: f64) -> f64 {
        if x >= self.d {
            (self.a * x + self.b).powf(self.g) + self.e
        } else {
            self.c * x + self.f
        }
    }
}

/// A curve tag's decoded payload: either a closed-form parametric curve or
/// a borrowed, big-endian table of samples over `[0, 1]`.
#[derive(Debug, Clone, Copy)]
pub enum Curve<'a> {
    Parametric(ParametricCurve),
    Sampled {
        data: &'a [u8],
        entry_count: usize,
        bit_width: BitWidth,
    },
}

impl<'a> Curve<'a> {
    /// Evaluates the curve at `x`, clamping sampled-table lookups to
    /// `[0, 1]` but applying the parametric piecewise formula as-is.
    pub fn eval(&self, x: f64) -> f64 {
        match self {
            Curve::Parametric(p) => p.eval(x),
            Curve::Sampled {
                data,
                entry_count,
                bit_width,
            } => sampled_eval(data, *entry_count, *bit_width, x),
        }
    }
}

fn entry_at(data: &[u8], index: usize, bit_width: BitWidth) -> f64 {
    match bit_width {
        BitWidth::Eight => data[index] as f64 / 255.0,
        BitWidth::Sixteen => {
            let raw = read_u16(data, index * 2).expect("index validated against entry_count");
            raw as f64 / 65535.0
        }
    }
}

fn sampled_eval(data: &[u8], entry_count: usize, bit_width: BitWidth, x: f64) -> f64 {
    let xc = x.clamp(0.0, 1.0);
    let ix = xc * (entry_count - 1) as f64;
    let lo = ix.floor() as usize;
    let hi = if lo + 1 < entry_count { lo + 1 } else { lo };
    let t = ix - lo as f64;
    let v0 = entry_at(data, lo, bit_width);
    let v1 = entry_at(data, hi, bit_width);
    v0 + t * (v1 - v0)
}

/// Decodes a curve tag payload (starting with its 4-byte type signature)
/// per spec §4.4, returning the decoded [`Curve`] and the number of bytes
/// consumed from `data`.
pub fn decode(data: &[u8]) -> Result<(Curve<'_>, usize), Error> {
    let signature = read_u32(data, 0).ok_or(Error::MalformedCurve {
        signature: 0,
        reason: "payload too small for a type signature",
    })?;

    match Signature(signature) {
        Signature::PARA => decode_parametric(data),
        Signature::CURV => decode_sampled(data),
        _ => Err(Error::MalformedCurve {
            signature,
            reason: "unsupported curve payload type",
        }),
    }
}

fn decode_parametric(data: &[u8]) -> Result<(Curve<'_>, usize), Error> {
    let signature = Signature::PARA.0;
    if data.len() < 12 {
        return Err(Error::MalformedCurve {
            signature,
            reason: "para payload shorter than 12 bytes",
        });
    }

    let function_type = read_u16(data, 8).ok_or(Error::MalformedCurve {
        signature,
        reason: "function type read past buffer",
    })?;
    let extra = match function_type {
        0 => 4,
        1 => 12,
        2 => 16,
        3 => 20,
        4 => 28,
        _ => {
            return Err(Error::MalformedCurve {
                signature,
                reason: "unknown parametric function type",
            })
        }
    };

    let needed = 12 + extra;
    if data.len() < needed {
        return Err(Error::MalformedCurve {
            signature,
            reason: "para payload too small for its function type",
        });
    }

    let param = |n: usize| {
        read_s15f16(data, 12 + n * 4).ok_or(Error::MalformedCurve {
            signature,
            reason: "parametric coefficient read past buffer",
        })
    };

    let mut curve = ParametricCurve {
        g: param(0)?,
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 0.0,
        e: 0.0,
        f: 0.0,
    };
    if function_type >= 1 {
        curve.a = param(1)?;
        curve.b = param(2)?;
    }
    // Variant 2's 4th parameter is a constant offset ("Y = (aX+b)^g + c,
    // else Y = c"), not a linear slope, so it lands on the unified model's
    // `e` (with `f = e` below giving the constant below the breakpoint).
    // Variants 3 and 4 use it as the literal linear slope `c`.
    if function_type == 2 {
        curve.e = param(3)?;
    } else if function_type >= 3 {
        curve.c = param(3)?;
    }
    if function_type >= 3 {
        curve.d = param(4)?;
    }
    if function_type == 4 {
        curve.e = param(5)?;
        curve.f = param(6)?;
    }

    if function_type == 1 || function_type == 2 {
        if curve.a == 0.0 {
            return Err(Error::MalformedCurve {
                signature,
                reason: "parametric variant 1/2 requires a != 0",
            });
        }
        curve.d = -curve.b / curve.a;
    }
    if function_type == 2 {
        curve.f = curve.e;
    }

    Ok((Curve::Parametric(curve), needed))
}

fn decode_sampled(data: &[u8]) -> Result<(Curve<'_>, usize), Error> {
    let signature = Signature::CURV.0;
    if data.len() < 12 {
        return Err(Error::MalformedCurve {
            signature,
            reason: "curv payload shorter than 12 bytes",
        });
    }

    let value_count = read_u32(data, 8).ok_or(Error::MalformedCurve {
        signature,
        reason: "value count read past buffer",
    })? as usize;

    let table_bytes = value_count
        .checked_mul(2)
        .ok_or(Error::ArithmeticOverflow("curv value_count * 2 overflow"))?;
    let needed = 12usize
        .checked_add(table_bytes)
        .ok_or(Error::ArithmeticOverflow("curv payload size overflow"))?;
    if data.len() < needed {
        return Err(Error::MalformedCurve {
            signature,
            reason: "curv table shorter than declared value_count",
        });
    }

    match value_count {
        0 => Ok((Curve::Parametric(ParametricCurve::identity()), needed)),
        1 => {
            let raw = read_u16(data, 12).ok_or(Error::MalformedCurve {
                signature,
                reason: "gamma value read past buffer",
            })?;
            let mut curve = ParametricCurve::identity();
            curve.g = raw as f64 / 256.0;
            Ok((Curve::Parametric(curve), needed))
        }
        _ => Ok((
            Curve::Sampled {
                data: &data[12..needed],
                entry_count: value_count,
                bit_width: BitWidth::Sixteen,
            },
            needed,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn para_header(function_type: u16) -> Vec<u8> {
        let mut data = b"para".to_vec();
        data.extend_from_slice(&[0, 0, 0, 0]); // reserved
        data.extend_from_slice(&function_type.to_be_bytes());
        data.extend_from_slice(&[0, 0]); // reserved
        data
    }

    fn push_s15f16(data: &mut Vec<u8>, v: f64) {
        let raw = (v * 65536.0).round() as i32;
        data.extend_from_slice(&raw.to_be_bytes());
    }

    #[test]
    fn decodes_type0_pure_gamma() {
        let mut data = para_header(0);
        push_s15f16(&mut data, 2.2);
        let (curve, consumed) = decode(&data).unwrap();
        assert_eq!(consumed, 16);
        let Curve::Parametric(p) = curve else {
            panic!("expected parametric")
        };
        assert!((p.eval(0.5) - 0.5f64.powf(2.2)).abs() < 1e-9);
    }

    #[test]
    fn type1_requires_nonzero_a() {
        let mut data = para_header(1);
        push_s15f16(&mut data, 1.0); // g
        push_s15f16(&mut data, 0.0); // a = 0
        push_s15f16(&mut data, 0.0); // b
        let err = decode(&data).unwrap_err();
        assert!(matches!(err, Error::MalformedCurve { .. }));
    }

    #[test]
    fn type2_requires_nonzero_a() {
        let mut data = para_header(2);
        push_s15f16(&mut data, 1.0); // g
        push_s15f16(&mut data, 0.0); // a = 0
        push_s15f16(&mut data, 0.0); // b
        push_s15f16(&mut data, 0.0); // c
        let err = decode(&data).unwrap_err();
        assert!(matches!(err, Error::MalformedCurve { .. }));
    }

    #[test]
    fn decodes_type2_constant_offset() {
        // Y = (aX+b)^g + c for X >= -b/a, else Y = c.
        let mut data = para_header(2);
        push_s15f16(&mut data, 2.0); // g
        push_s15f16(&mut data, 1.0); // a
        push_s15f16(&mut data, -0.5); // b, so d = -b/a = 0.5
        push_s15f16(&mut data, 0.1); // c
        let (curve, consumed) = decode(&data).unwrap();
        assert_eq!(consumed, 28);
        let Curve::Parametric(p) = curve else {
            panic!("expected parametric")
        };
        assert!((p.d - 0.5).abs() < 1e-9);
        // Below the breakpoint: constant c, not a line through the origin.
        assert!((p.eval(0.0) - 0.1).abs() < 1e-9);
        assert!((p.eval(0.25) - 0.1).abs() < 1e-9);
        // At/above the breakpoint: (aX+b)^g + c.
        let expected = (1.0f64 * 0.8 - 0.5).powf(2.0) + 0.1;
        assert!((p.eval(0.8) - expected).abs() < 1e-9);
    }

    #[test]
    fn type1_computes_d_from_a_and_b() {
        let mut data = para_header(1);
        push_s15f16(&mut data, 1.0); // g
        push_s15f16(&mut data, 2.0); // a
        push_s15f16(&mut data, -1.0); // b
        let (curve, _) = decode(&data).unwrap();
        let Curve::Parametric(p) = curve else {
            panic!("expected parametric")
        };
        assert!((p.d - 0.5).abs() < 1e-9); // d = -b/a = 0.5
    }

    #[test]
    fn curv_zero_entries_is_identity() {
        let mut data = b"curv".to_vec();
        data.extend_from_slice(&[0, 0, 0, 0]); // reserved
        data.extend_from_slice(&0u32.to_be_bytes()); // value_count = 0
        let (curve, consumed) = decode(&data).unwrap();
        assert_eq!(consumed, 12);
        assert!((curve.eval(0.3) - 0.3).abs() < 1e-9);
    }

    #[test]
    fn curv_one_entry_is_gamma_from_u16_over_256() {
        let mut data = b"curv".to_vec();
        data.extend_from_slice(&[0, 0, 0, 0]);
        data.extend_from_slice(&1u32.to_be_bytes());
        data.extend_from_slice(&512u16.to_be_bytes()); // 512/256 = 2.0
        let (curve, consumed) = decode(&data).unwrap();
        assert_eq!(consumed, 14);
        assert!((curve.eval(0.5) - 0.25).abs() < 1e-9); // 0.5^2
    }

    #[test]
    fn curv_table_interpolates_linearly() {
        let mut data = b"curv".to_vec();
        data.extend_from_slice(&[0, 0, 0, 0]);
        data.extend_from_slice(&3u32.to_be_bytes());
        data.extend_from_slice(&0u16.to_be_bytes());
        data.extend_from_slice(&32768u16.to_be_bytes());
        data.extend_from_slice(&65535u16.to_be_bytes());
        let (curve, consumed) = decode(&data).unwrap();
        assert_eq!(consumed, 18);
        assert!((curve.eval(0.0) - 0.0).abs() < 1e-6);
        assert!((curve.eval(1.0) - 1.0).abs() < 1e-6);
        assert!((curve.eval(0.5) - 32768.0 / 65535.0).abs() < 1e-6);
    }

    #[test]
    fn curv_undersized_table_is_error() {
        let mut data = b"curv".to_vec();
        data.extend_from_slice(&[0, 0, 0, 0]);
        data.extend_from_slice(&3u32.to_be_bytes());
        data.extend_from_slice(&0u16.to_be_bytes()); // only one entry present
        let err = decode(&data).unwrap_err();
        assert!(matches!(err, Error::MalformedCurve { .. }));
    }

    #[test]
    fn sampled_eval_boundary_only_collapses_at_x_equals_one() {
        let entries: [u8; 2] = [0, 255];
        let curve = Curve::Sampled {
            data: &entries,
            entry_count: 2,
            bit_width: BitWidth::Eight,
        };
        assert!((curve.eval(1.0) - 1.0).abs() < 1e-9);
        assert!(curve.eval(0.999) < 1.0);
    }
}
