//! A2B (device-to-PCS) lookup pipeline decoding: `mft1` (8-bit legacy
//! `Lut8Type`), `mft2` (16-bit `Lut16Type`), and `mAB ` (variable-layout
//! `lutAToBType`). `mBA `/B2A payloads are not decoded; this crate only
//! reconstructs the device-to-PCS direction.
//!
//! All three dispatch into the same [`A2B`] record so a caller never needs
//! to know which wire format produced it.

use crate::bytes::{read_s15f16, read_u16, read_u32};
use crate::curve::{BitWidth, Curve};
use crate::error::Error;
use crate::types::Signature;

/// The borrowed multidimensional lookup grid, in whichever byte width the
/// source payload used. `None` only occurs for `mAB ` tags that elide the
/// CLUT/A-curve stage entirely.
#[derive(Debug, Clone, Copy)]
pub enum Grid<'a> {
    Eight(&'a [u8]),
    Sixteen(&'a [u8]),
    None,
}

/// A decoded A2B (device-to-PCS) pipeline: optional input curves, an
/// optional grid, an optional 3x4 matrix + M-curves, and mandatory output
/// (B) curves.
#[derive(Debug, Clone, Copy)]
pub struct A2B<'a> {
    /// `0` when the A/CLUT stage is elided; otherwise `1..=4`.
    pub input_channels: u8,
    /// Always `3` (PCS is always three-channel).
    pub output_channels: u8,
    /// Grid point count per input axis; only the first `input_channels`
    /// entries are meaningful.
    pub grid_points: [u8; 4],
    pub input_curves: [Option<Curve<'a>>; 4],
    pub grid: Grid<'a>,
    /// `0` when the M/matrix stage is elided; otherwise `3`.
    pub matrix_channels: u8,
    pub matrix_curves: [Option<Curve<'a>>; 3],
    /// 3x4 row-major: the leading 3x3 block, then the translation column.
    pub matrix: [[f64; 4]; 3],
    pub output_curves: [Curve<'a>; 3],
}

fn identity_matrix() -> [[f64; 4]; 3] {
    [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
    ]
}

fn checked_grid_entries(grid_points: u64, axes: u32, output_channels: u64) -> Option<u64> {
    grid_points.checked_pow(axes)?.checked_mul(output_channels)
}

fn checked_clut_cells(grid_points: &[u8; 4], input_channels: usize, output_channels: u64) -> Option<u64> {
    let mut total: u64 = 1;
    for &g in &grid_points[..input_channels] {
        total = total.checked_mul(g as u64)?;
    }
    total.checked_mul(output_channels)
}

/// Decodes an A2B tag payload (starting with its 4-byte type signature)
/// per spec §4.6.
pub fn decode(data: &[u8]) -> Result<A2B<'_>, Error> {
    let signature = read_u32(data, 0).ok_or(Error::MalformedA2B {
        signature: 0,
        reason: "payload too small for a type signature",
    })?;

    match Signature(signature) {
        Signature::MFT1 => decode_mft1(data),
        Signature::MFT2 => decode_mft2(data),
        Signature::MAB => decode_mab(data),
        _ => Err(Error::MalformedA2B {
            signature,
            reason: "unsupported A2B payload type",
        }),
    }
}

fn decode_mft1(data: &[u8]) -> Result<A2B<'_>, Error> {
    let signature = Signature::MFT1.0;
    const HEADER: usize = 48;
    if data.len() < HEADER {
        return Err(Error::MalformedA2B {
            signature,
            reason: "mft1 payload shorter than 48-byte header",
        });
    }

    let input_channels = data[8];
    let output_channels = data[9];
    let grid_points_raw = data[10];
    // data[11] is padding; bytes 12..48 are the ignored 3x3 matrix.

    if !(1..=4).contains(&input_channels) {
        return Err(Error::MalformedA2B {
            signature,
            reason: "mft1 input_channels outside [1,4]",
        });
    }
    if output_channels != 3 {
        return Err(Error::MalformedA2B {
            signature,
            reason: "mft1 requires output_channels == 3",
        });
    }
    if grid_points_raw < 2 {
        return Err(Error::MalformedA2B {
            signature,
            reason: "mft1 grid_points < 2",
        });
    }

    let in_ch = input_channels as usize;
    let out_ch = output_channels as usize;
    let table_offset = HEADER;

    let input_table_size = in_ch
        .checked_mul(256)
        .ok_or(Error::ArithmeticOverflow("mft1 input table size overflow"))?;
    let input_end = table_offset
        .checked_add(input_table_size)
        .ok_or(Error::ArithmeticOverflow("mft1 input table offset overflow"))?;
    if data.len() < input_end {
        return Err(Error::MalformedA2B {
            signature,
            reason: "mft1 input tables truncated",
        });
    }

    let clut_cells = checked_grid_entries(grid_points_raw as u64, input_channels as u32, out_ch as u64)
        .ok_or(Error::ArithmeticOverflow("mft1 clut size overflow"))?;
    let clut_size = usize::try_from(clut_cells)
        .map_err(|_| Error::ArithmeticOverflow("mft1 clut size exceeds addressable range"))?;
    let clut_end = input_end
        .checked_add(clut_size)
        .ok_or(Error::ArithmeticOverflow("mft1 clut offset overflow"))?;
    if data.len() < clut_end {
        return Err(Error::MalformedA2B {
            signature,
            reason: "mft1 clut truncated",
        });
    }

    let output_table_size = out_ch
        .checked_mul(256)
        .ok_or(Error::ArithmeticOverflow("mft1 output table size overflow"))?;
    let output_end = clut_end
        .checked_add(output_table_size)
        .ok_or(Error::ArithmeticOverflow("mft1 output table offset overflow"))?;
    if data.len() < output_end {
        return Err(Error::MalformedA2B {
            signature,
            reason: "mft1 output tables truncated",
        });
    }

    let mut input_curves: [Option<Curve<'_>>; 4] = [None; 4];
    for (i, slot) in input_curves.iter_mut().enumerate().take(in_ch) {
        let start = table_offset + i * 256;
        *slot = Some(Curve::Sampled {
            data: &data[start..start + 256],
            entry_count: 256,
            bit_width: BitWidth::Eight,
        });
    }

    let mut output_curves = [Curve::Sampled {
        data: &[],
        entry_count: 0,
        bit_width: BitWidth::Eight,
    }; 3];
    for (i, slot) in output_curves.iter_mut().enumerate() {
        let start = clut_end + i * 256;
        *slot = Curve::Sampled {
            data: &data[start..start + 256],
            entry_count: 256,
            bit_width: BitWidth::Eight,
        };
    }

    let mut grid_points = [0u8; 4];
    grid_points[..in_ch].fill(grid_points_raw);

    Ok(A2B {
        input_channels,
        output_channels,
        grid_points,
        input_curves,
        grid: Grid::Eight(&data[input_end..clut_end]),
        matrix_channels: 0,
        matrix_curves: [None; 3],
        matrix: identity_matrix(),
        output_curves,
    })
}

fn decode_mft2(data: &[u8]) -> Result<A2B<'_>, Error> {
    let signature = Signature::MFT2.0;
    const HEADER: usize = 52;
    if data.len() < HEADER {
        return Err(Error::MalformedA2B {
            signature,
            reason: "mft2 payload shorter than 52-byte header",
        });
    }

    let input_channels = data[8];
    let output_channels = data[9];
    let grid_points_raw = data[10];
    let input_entries = read_u16(data, 48).ok_or(Error::MalformedA2B {
        signature,
        reason: "mft2 input_table_entries read past buffer",
    })?;
    let output_entries = read_u16(data, 50).ok_or(Error::MalformedA2B {
        signature,
        reason: "mft2 output_table_entries read past buffer",
    })?;

    if !(1..=4).contains(&input_channels) {
        return Err(Error::MalformedA2B {
            signature,
            reason: "mft2 input_channels outside [1,4]",
        });
    }
    if output_channels != 3 {
        return Err(Error::MalformedA2B {
            signature,
            reason: "mft2 requires output_channels == 3",
        });
    }
    if grid_points_raw < 2 {
        return Err(Error::MalformedA2B {
            signature,
            reason: "mft2 grid_points < 2",
        });
    }
    if !(2..=4096).contains(&input_entries) || !(2..=4096).contains(&output_entries) {
        return Err(Error::MalformedA2B {
            signature,
            reason: "mft2 table entry count outside [2,4096]",
        });
    }

    let in_ch = input_channels as usize;
    let out_ch = output_channels as usize;
    let in_entries = input_entries as usize;
    let out_entries = output_entries as usize;
    let table_offset = HEADER;

    let input_table_size = in_ch
        .checked_mul(in_entries)
        .and_then(|v| v.checked_mul(2))
        .ok_or(Error::ArithmeticOverflow("mft2 input table size overflow"))?;
    let input_end = table_offset
        .checked_add(input_table_size)
        .ok_or(Error::ArithmeticOverflow("mft2 input table offset overflow"))?;
    if data.len() < input_end {
        return Err(Error::MalformedA2B {
            signature,
            reason: "mft2 input tables truncated",
        });
    }

    let clut_cells = checked_grid_entries(grid_points_raw as u64, input_channels as u32, out_ch as u64)
        .ok_or(Error::ArithmeticOverflow("mft2 clut size overflow"))?;
    let clut_size = usize::try_from(clut_cells)
        .ok()
        .and_then(|v| v.checked_mul(2))
        .ok_or(Error::ArithmeticOverflow("mft2 clut size exceeds addressable range"))?;
    let clut_end = input_end
        .checked_add(clut_size)
        .ok_or(Error::ArithmeticOverflow("mft2 clut offset overflow"))?;
    if data.len() < clut_end {
        return Err(Error::MalformedA2B {
            signature,
            reason: "mft2 clut truncated",
        });
    }

    let output_table_size = out_ch
        .checked_mul(out_entries)
        .and_then(|v| v.checked_mul(2))
        .ok_or(Error::ArithmeticOverflow("mft2 output table size overflow"))?;
    let output_end = clut_end
        .checked_add(output_table_size)
        .ok_or(Error::ArithmeticOverflow("mft2 output table offset overflow"))?;
    if data.len() < output_end {
        return Err(Error::MalformedA2B {
            signature,
            reason: "mft2 output tables truncated",
        });
    }

    let mut input_curves: [Option<Curve<'_>>; 4] = [None; 4];
    for (i, slot) in input_curves.iter_mut().enumerate().take(in_ch) {
        let start = table_offset + i * in_entries * 2;
        *slot = Some(Curve::Sampled {
            data: &data[start..start + in_entries * 2],
            entry_count: in_entries,
            bit_width: BitWidth::Sixteen,
        });
    }

    let mut output_curves = [Curve::Sampled {
        data: &[],
        entry_count: 0,
        bit_width: BitWidth::Sixteen,
    }; 3];
    for (i, slot) in output_curves.iter_mut().enumerate() {
        let start = clut_end + i * out_entries * 2;
        *slot = Curve::Sampled {
            data: &data[start..start + out_entries * 2],
            entry_count: out_entries,
            bit_width: BitWidth::Sixteen,
        };
    }

    let mut grid_points = [0u8; 4];
    grid_points[..in_ch].fill(grid_points_raw);

    Ok(A2B {
        input_channels,
        output_channels,
        grid_points,
        input_curves,
        grid: Grid::Sixteen(&data[input_end..clut_end]),
        matrix_channels: 0,
        matrix_curves: [None; 3],
        matrix: identity_matrix(),
        output_curves,
    })
}

fn decode_curve_set<'a>(
    data: &'a [u8],
    offset: usize,
    count: usize,
    signature: u32,
) -> Result<Vec<Curve<'a>>, Error> {
    let mut curves = Vec::with_capacity(count);
    let mut pos = offset;
    for _ in 0..count {
        let slice = data.get(pos..).ok_or(Error::MalformedA2B {
            signature,
            reason: "curve sub-block offset out of bounds",
        })?;
        let (curve, consumed) = crate::curve::decode(slice).map_err(|_| Error::MalformedA2B {
            signature,
            reason: "curve sub-block malformed",
        })?;
        let aligned = consumed
            .checked_add(3)
            .map(|v| v & !3usize)
            .ok_or(Error::ArithmeticOverflow("curve sub-block alignment overflow"))?;
        pos = pos
            .checked_add(aligned)
            .ok_or(Error::ArithmeticOverflow("curve sub-block advance overflow"))?;
        curves.push(curve);
    }
    Ok(curves)
}

fn decode_matrix(data: &[u8], offset: usize, signature: u32) -> Result<[[f64; 4]; 3], Error> {
    let mut m = identity_matrix();
    for (row, m_row) in m.iter_mut().enumerate() {
        for (col, cell) in m_row.iter_mut().take(3).enumerate() {
            let o = offset + (row * 3 + col) * 4;
            *cell = read_s15f16(data, o).ok_or(Error::MalformedA2B {
                signature,
                reason: "matrix coefficient out of bounds",
            })?;
        }
        let o = offset + 36 + row * 4;
        m_row[3] = read_s15f16(data, o).ok_or(Error::MalformedA2B {
            signature,
            reason: "matrix translation out of bounds",
        })?;
    }
    Ok(m)
}

fn decode_clut<'a>(
    data: &'a [u8],
    offset: usize,
    input_channels: u8,
    output_channels: u8,
    signature: u32,
) -> Result<([u8; 4], Grid<'a>), Error> {
    let header = data.get(offset..).ok_or(Error::MalformedA2B {
        signature,
        reason: "clut sub-block offset out of bounds",
    })?;
    if header.len() < 20 {
        return Err(Error::MalformedA2B {
            signature,
            reason: "clut sub-block shorter than 20 bytes",
        });
    }

    let mut grid_points = [0u8; 4];
    for (i, slot) in grid_points.iter_mut().enumerate().take(input_channels as usize) {
        let g = header[i];
        if g < 2 {
            return Err(Error::MalformedA2B {
                signature,
                reason: "clut grid axis has fewer than 2 points",
            });
        }
        *slot = g;
    }

    let grid_byte_width = header[16];
    if grid_byte_width != 1 && grid_byte_width != 2 {
        return Err(Error::MalformedA2B {
            signature,
            reason: "clut grid_byte_width not in {1,2}",
        });
    }
    // header[17..20] is reserved.

    let cells = checked_clut_cells(&grid_points, input_channels as usize, output_channels as u64)
        .ok_or(Error::ArithmeticOverflow("mAB clut cell count overflow"))?;
    let byte_len = cells
        .checked_mul(grid_byte_width as u64)
        .ok_or(Error::ArithmeticOverflow("mAB clut byte length overflow"))?;
    let byte_len = usize::try_from(byte_len)
        .map_err(|_| Error::ArithmeticOverflow("mAB clut byte length exceeds addressable range"))?;
    let grid_data = header.get(20..20 + byte_len).ok_or(Error::MalformedA2B {
        signature,
        reason: "clut grid data truncated",
    })?;

    let grid = if grid_byte_width == 1 {
        Grid::Eight(grid_data)
    } else {
        Grid::Sixteen(grid_data)
    };
    Ok((grid_points, grid))
}

fn decode_mab(data: &[u8]) -> Result<A2B<'_>, Error> {
    let signature = Signature::MAB.0;
    const HEADER: usize = 32;
    if data.len() < HEADER {
        return Err(Error::MalformedA2B {
            signature,
            reason: "mAB payload shorter than 32-byte header",
        });
    }

    let input_channels = data[8];
    let output_channels = data[9];
    if output_channels != 3 {
        return Err(Error::MalformedA2B {
            signature,
            reason: "mAB requires output_channels == 3",
        });
    }

    let b_offset = read_u32(data, 12).ok_or(Error::MalformedA2B {
        signature,
        reason: "b-curve offset read past buffer",
    })? as usize;
    let matrix_offset = read_u32(data, 16).ok_or(Error::MalformedA2B {
        signature,
        reason: "matrix offset read past buffer",
    })? as usize;
    let m_offset = read_u32(data, 20).ok_or(Error::MalformedA2B {
        signature,
        reason: "m-curve offset read past buffer",
    })? as usize;
    let clut_offset = read_u32(data, 24).ok_or(Error::MalformedA2B {
        signature,
        reason: "clut offset read past buffer",
    })? as usize;
    let a_offset = read_u32(data, 28).ok_or(Error::MalformedA2B {
        signature,
        reason: "a-curve offset read past buffer",
    })? as usize;

    if b_offset == 0 {
        return Err(Error::MalformedA2B {
            signature,
            reason: "mAB b-curves are mandatory",
        });
    }
    if (matrix_offset == 0) != (m_offset == 0) {
        return Err(Error::MalformedA2B {
            signature,
            reason: "mAB matrix and m-curves must be both present or both absent",
        });
    }
    if (clut_offset == 0) != (a_offset == 0) {
        return Err(Error::MalformedA2B {
            signature,
            reason: "mAB clut and a-curves must be both present or both absent",
        });
    }

    let b_curves = decode_curve_set(data, b_offset, output_channels as usize, signature)?;
    let output_curves = [b_curves[0], b_curves[1], b_curves[2]];

    let (matrix_channels, matrix_curves, matrix) = if matrix_offset != 0 {
        let m_curves = decode_curve_set(data, m_offset, output_channels as usize, signature)?;
        let matrix = decode_matrix(data, matrix_offset, signature)?;
        (
            output_channels,
            [Some(m_curves[0]), Some(m_curves[1]), Some(m_curves[2])],
            matrix,
        )
    } else {
        (0, [None; 3], identity_matrix())
    };

    let (record_input_channels, grid_points, grid, input_curves) = if clut_offset != 0 {
        if !(1..=4).contains(&input_channels) {
            return Err(Error::MalformedA2B {
                signature,
                reason: "mAB input_channels outside [1,4]",
            });
        }
        let a_curves = decode_curve_set(data, a_offset, input_channels as usize, signature)?;
        let mut input_curves: [Option<Curve<'_>>; 4] = [None; 4];
        for (i, slot) in input_curves.iter_mut().enumerate().take(input_channels as usize) {
            *slot = Some(a_curves[i]);
        }
        let (grid_points, grid) = decode_clut(data, clut_offset, input_channels, output_channels, signature)?;
        (input_channels, grid_points, grid, input_curves)
    } else {
        if input_channels != output_channels {
            return Err(Error::MalformedA2B {
                signature,
                reason: "mAB without clut requires input_channels == output_channels",
            });
        }
        (0, [0u8; 4], Grid::None, [None; 4])
    };

    Ok(A2B {
        input_channels: record_input_channels,
        output_channels,
        grid_points,
        input_curves,
        grid,
        matrix_channels,
        matrix_curves,
        matrix,
        output_curves,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_curv() -> Vec<u8> {
        let mut c = b"curv".to_vec();
        c.extend_from_slice(&[0, 0, 0, 0]);
        c.extend_from_slice(&0u32.to_be_bytes());
        c
    }

    #[test]
    fn mft1_minimal_profile_roundtrips() {
        let mut data = vec![0u8; 48];
        data[0..4].copy_from_slice(b"mft1");
        data[8] = 3; // input_channels
        data[9] = 3; // output_channels
        data[10] = 2; // grid_points
        data.extend(vec![0u8; 3 * 256]); // input tables
        data.extend(vec![128u8; 2usize.pow(3) * 3]); // clut
        data.extend(vec![255u8; 3 * 256]); // output tables
        let a2b = decode(&data).unwrap();
        assert_eq!(a2b.input_channels, 3);
        assert_eq!(a2b.output_channels, 3);
        assert!(matches!(a2b.grid, Grid::Eight(_)));
        assert!((a2b.output_curves[0].eval(0.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn mft2_rejects_entry_count_out_of_range() {
        let mut data = vec![0u8; 52];
        data[0..4].copy_from_slice(b"mft2");
        data[8] = 1;
        data[9] = 3;
        data[10] = 2;
        data[48..50].copy_from_slice(&1u16.to_be_bytes()); // below minimum of 2
        data[50..52].copy_from_slice(&2u16.to_be_bytes());
        let err = decode(&data).unwrap_err();
        assert!(matches!(err, Error::MalformedA2B { .. }));

        data[48..50].copy_from_slice(&4097u16.to_be_bytes()); // above maximum of 4096
        let err = decode(&data).unwrap_err();
        assert!(matches!(err, Error::MalformedA2B { .. }));
    }

    #[test]
    fn mab_requires_matrix_and_m_curves_together() {
        let mut data = vec![0u8; 32];
        data[0..4].copy_from_slice(b"mAB ");
        data[8] = 3;
        data[9] = 3;
        data[12..16].copy_from_slice(&32u32.to_be_bytes()); // b-curves at 32
        data[16..20].copy_from_slice(&1000u32.to_be_bytes()); // matrix present
        // m_offset left 0: violates both-or-neither
        data.extend(identity_curv());
        let err = decode(&data).unwrap_err();
        assert!(matches!(err, Error::MalformedA2B { .. }));
    }

    #[test]
    fn mab_without_clut_elides_input_stage() {
        let mut data = vec![0u8; 32];
        data[0..4].copy_from_slice(b"mAB ");
        data[8] = 3; // must equal output_channels when clut absent
        data[9] = 3;
        data[12..16].copy_from_slice(&32u32.to_be_bytes());
        // matrix, m, clut, a all absent
        data.extend(identity_curv());
        data.extend(identity_curv());
        data.extend(identity_curv());
        let a2b = decode(&data).unwrap();
        assert_eq!(a2b.input_channels, 0);
        assert!(matches!(a2b.grid, Grid::None));
    }

    #[test]
    fn mab_clut_grid_axis_below_two_is_error() {
        let mut data = vec![0u8; 32];
        data[0..4].copy_from_slice(b"mAB ");
        data[8] = 1;
        data[9] = 3;
        let b_off = 32u32;
        data[12..16].copy_from_slice(&b_off.to_be_bytes());
        data.extend(identity_curv());
        data.extend(identity_curv());
        data.extend(identity_curv());
        let clut_off = data.len() as u32;
        data[24..28].copy_from_slice(&clut_off.to_be_bytes());
        let a_off = data.len() as u32; // will be overwritten below after clut block appended
        let mut clut_header = vec![0u8; 20];
        clut_header[0] = 1; // grid axis has only 1 point: invalid
        clut_header[16] = 1; // byte width
        data.extend(clut_header);
        data[28..32].copy_from_slice(&(a_off + 20).to_be_bytes());
        data.extend(identity_curv());
        let err = decode(&data).unwrap_err();
        assert!(matches!(err, Error::MalformedA2B { .. }));
    }
}
