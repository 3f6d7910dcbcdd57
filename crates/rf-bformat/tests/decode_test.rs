//! Decoder Integration Tests
//!
//! Loads decoder profiles the way a host would and runs blocks through them.
//! Verifies:
//! - Profile -> decoder -> speaker feeds for a horizontal square
//! - Dual-band decoding stays finite and tracks the single-band decode
//! - Coefficient-table decoders for a periphonic layout
//! - Lower-order signals through order scaling

use approx::assert_abs_diff_eq;
use rf_bformat::ambi::channels_for_order;
use rf_bformat::{
    compute_order_scales, BFormatDecoder, BFormatError, DecoderConfig, FloatBufferLine,
    BUFFER_SIZE, MAX_AMBI_CHANNELS,
};

const SAMPLE_RATE: u32 = 48000;

const SQUARE_PROFILE: &str = r#"{
    "description": "first order square",
    "chan_mask": 11,
    "freq_bands": 2,
    "coeff_scale": "N3D",
    "xover_freq": 400.0,
    "xover_ratio": 0.0,
    "hf_order_gain": [1.0, 1.0, 1.0, 1.0],
    "lf_order_gain": [1.0, 1.0, 1.0, 1.0],
    "speakers": [
        { "name": "LF", "channel": 0, "hf_coeffs": [0.35,  0.25,  0.25], "lf_coeffs": [0.35,  0.25,  0.25] },
        { "name": "RF", "channel": 1, "hf_coeffs": [0.35, -0.25,  0.25], "lf_coeffs": [0.35, -0.25,  0.25] },
        { "name": "LB", "channel": 4, "hf_coeffs": [0.35,  0.25, -0.25], "lf_coeffs": [0.35,  0.25, -0.25] },
        { "name": "RB", "channel": 5, "hf_coeffs": [0.35, -0.25, -0.25], "lf_coeffs": [0.35, -0.25, -0.25] }
    ]
}"#;

fn lines(count: usize) -> Vec<FloatBufferLine> {
    vec![[0.0; BUFFER_SIZE]; count]
}

/// Horizontal first order plane wave: W, Y, X (N3D)
fn plane_wave(azimuth_deg: f32, value: f32) -> Vec<FloatBufferLine> {
    let az = azimuth_deg.to_radians();
    let n3d = 3.0f32.sqrt();
    let mut input = lines(3);
    input[0].fill(value);
    input[1].fill(value * n3d * az.sin());
    input[2].fill(value * n3d * az.cos());
    input
}

fn peak(line: &[f32]) -> f32 {
    line.iter().fold(0.0f32, |m, s| m.max(s.abs()))
}

#[test]
fn test_square_front_source() {
    let conf = DecoderConfig::from_json(SQUARE_PROFILE).unwrap();
    let mut decoder =
        BFormatDecoder::from_config(&conf, false, 3, SAMPLE_RATE, &conf.channel_map());
    assert_eq!(decoder.enabled_mask(), 0b11_0011);

    let input = plane_wave(0.0, 1.0);
    let mut out = lines(6);
    decoder.process(&mut out, &input, BUFFER_SIZE);

    // Front pair louder than back pair, left/right balanced
    assert!(out[0][0] > out[4][0]);
    assert_abs_diff_eq!(out[0][0], out[1][0], epsilon = 1e-6);
    assert_abs_diff_eq!(out[4][0], out[5][0], epsilon = 1e-6);

    // Slots 2 and 3 are not part of the layout
    assert_eq!(peak(&out[2]), 0.0);
    assert_eq!(peak(&out[3]), 0.0);
}

#[test]
fn test_square_left_source() {
    let conf = DecoderConfig::from_json(SQUARE_PROFILE).unwrap();
    let mut decoder =
        BFormatDecoder::from_config(&conf, false, 3, SAMPLE_RATE, &conf.channel_map());

    let input = plane_wave(90.0, 1.0);
    let mut out = lines(6);
    decoder.process(&mut out, &input, 64);

    assert!(out[0][0] > out[1][0]);
    assert!(out[4][0] > out[5][0]);
}

#[test]
fn test_dual_band_tracks_single_band() {
    let conf = DecoderConfig::from_json(SQUARE_PROFILE).unwrap();
    let chanmap = conf.channel_map();
    let mut dual = BFormatDecoder::from_config(&conf, true, 3, SAMPLE_RATE, &chanmap);
    let mut single = BFormatDecoder::from_config(&conf, false, 3, SAMPLE_RATE, &chanmap);
    assert!(dual.is_dual_band());

    let input = plane_wave(30.0, 0.5);
    let mut out_dual = lines(6);
    let mut out_single = lines(6);
    single.process(&mut out_single, &input, BUFFER_SIZE);

    for _ in 0..8 {
        dual.process(&mut out_dual, &input, BUFFER_SIZE);
        assert!(out_dual.iter().flatten().all(|s| s.is_finite()));
    }

    for chan in [0, 1, 4, 5] {
        assert_abs_diff_eq!(
            out_dual[chan][BUFFER_SIZE - 1],
            out_single[chan][BUFFER_SIZE - 1],
            epsilon = 1e-3
        );
    }
}

#[test]
fn test_dual_band_looped_stream_is_deterministic() {
    let conf = DecoderConfig::from_json(SQUARE_PROFILE).unwrap();
    let chanmap = conf.channel_map();
    let mut a = BFormatDecoder::from_config(&conf, true, 3, SAMPLE_RATE, &chanmap);
    let mut b = BFormatDecoder::from_config(&conf, true, 3, SAMPLE_RATE, &chanmap);

    let mut input = lines(3);
    for (i, s) in input[0].iter_mut().enumerate() {
        *s = (i as f32 * 0.05).sin();
    }

    let mut out_a = lines(6);
    let mut out_b = lines(6);
    for _ in 0..3 {
        a.process(&mut out_a, &input, BUFFER_SIZE);
        b.process(&mut out_b, &input, BUFFER_SIZE);
        assert_eq!(out_a, out_b);
    }
}

#[test]
fn test_rejected_profile() {
    let json = SQUARE_PROFILE.replace("\"channel\": 5", "\"channel\": 40");
    assert!(matches!(
        DecoderConfig::from_json(&json),
        Err(BFormatError::InvalidOutputChannel { speaker: 3, channel: 40, .. })
    ));
}

#[test]
fn test_coefficient_table_periphonic() {
    // Up/down pair decoded from W and Z
    let mut table = [[0.0f32; MAX_AMBI_CHANNELS]; 2];
    table[0][0] = 0.5;
    table[0][2] = 0.5;
    table[1][0] = 0.5;
    table[1][2] = -0.5;

    let inchans = channels_for_order(1);
    let mut decoder = BFormatDecoder::from_coefficients(inchans, &table, &[0, 1]);

    let mut input = lines(inchans);
    input[0].fill(1.0);
    input[2].fill(1.0);
    let mut out = lines(2);
    decoder.process(&mut out, &input, 32);

    assert_abs_diff_eq!(out[0][0], 1.0);
    assert_abs_diff_eq!(out[1][0], 0.0);
}

#[test]
fn test_first_order_into_third_order_decode() {
    let scales = compute_order_scales(1, 3);
    assert!(scales[0] > 1.0 && scales[1] > 1.0);
    assert_eq!(&scales[2..], &[0.0, 0.0]);

    // Scaled first-order W and X through a third-order-tuned table
    let mut table = [[0.0f32; MAX_AMBI_CHANNELS]; 1];
    table[0][0] = 0.589_792_2;
    table[0][3] = 0.879_693_9;
    let mut decoder = BFormatDecoder::from_coefficients(4, &table, &[0]);

    let mut input = lines(4);
    input[0].fill(scales[0]);
    input[3].fill(scales[1]);
    let mut out = lines(1);
    decoder.process(&mut out, &input, 16);

    assert_abs_diff_eq!(out[0][0], 2.0, epsilon = 1e-5);
}
