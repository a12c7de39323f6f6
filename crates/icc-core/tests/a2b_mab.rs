mod common;

use common::*;
use icc_core::error::Error;
use icc_core::Profile;

fn mab_payload(
    input_channels: u8,
    with_matrix: bool,
    with_clut: bool,
    grid_axis: u8,
) -> Vec<u8> {
    let mut data = vec![0u8; 32];
    data[0..4].copy_from_slice(b"mAB ");
    data[8] = input_channels;
    data[9] = 3;

    let b_off = data.len() as u32;
    data[12..16].copy_from_slice(&b_off.to_be_bytes());
    for _ in 0..3 {
        data.extend(identity_curv());
    }

    if with_matrix {
        let m_off = data.len() as u32;
        for _ in 0..3 {
            data.extend(identity_curv());
        }
        let matrix_off = data.len() as u32;
        for _ in 0..3 {
            for _ in 0..4 {
                data.extend_from_slice(&0i32.to_be_bytes());
            }
        }
        data[16..20].copy_from_slice(&matrix_off.to_be_bytes());
        data[20..24].copy_from_slice(&m_off.to_be_bytes());
    }

    if with_clut {
        let a_off_placeholder = data.len() as u32;
        for _ in 0..input_channels {
            data.extend(identity_curv());
        }
        let clut_off = data.len() as u32;
        let mut clut_header = vec![0u8; 20];
        for g in clut_header.iter_mut().take(input_channels as usize) {
            *g = grid_axis;
        }
        clut_header[16] = 1; // byte width
        let cells = (grid_axis as usize).pow(input_channels as u32) * 3;
        data.extend(clut_header);
        data.extend(vec![0u8; cells]);
        data[24..28].copy_from_slice(&clut_off.to_be_bytes());
        data[28..32].copy_from_slice(&a_off_placeholder.to_be_bytes());
    }

    data
}

#[test]
fn mab_with_matrix_and_clut_parses_through_profile() {
    let mut builder = ProfileBuilder::new(1);
    builder.tag(b"A2B0", mab_payload(2, true, true, 2));
    let data = builder.build();

    let profile = Profile::parse(&data).unwrap();
    let a2b = profile.a2b().unwrap();
    assert_eq!(a2b.input_channels, 2);
    assert_eq!(a2b.matrix_channels, 3);
}

#[test]
fn mab_matrix_without_m_curves_fails_through_profile() {
    // Hand-build a payload with matrix_offset set but m_offset left at 0.
    let mut payload = vec![0u8; 32];
    payload[0..4].copy_from_slice(b"mAB ");
    payload[8] = 3;
    payload[9] = 3;
    let b_off = payload.len() as u32;
    payload[12..16].copy_from_slice(&b_off.to_be_bytes());
    for _ in 0..3 {
        payload.extend(identity_curv());
    }
    let matrix_off = payload.len() as u32;
    for _ in 0..3 {
        for _ in 0..4 {
            payload.extend_from_slice(&0i32.to_be_bytes());
        }
    }
    payload[16..20].copy_from_slice(&matrix_off.to_be_bytes());

    let mut builder = ProfileBuilder::new(1);
    builder.tag(b"A2B0", payload);
    let data = builder.build();

    assert!(matches!(
        Profile::parse(&data),
        Err(Error::MalformedA2B { .. })
    ));
}

#[test]
fn mab_without_clut_requires_matching_channel_counts() {
    let mut builder = ProfileBuilder::new(1);
    builder.tag(b"A2B0", mab_payload(3, false, false, 2));
    let data = builder.build();

    let profile = Profile::parse(&data).unwrap();
    let a2b = profile.a2b().unwrap();
    assert_eq!(a2b.input_channels, 0, "input stage is elided");
}
