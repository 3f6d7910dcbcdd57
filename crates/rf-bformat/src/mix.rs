//! Weighted-sum row mixing

use crate::FloatBufferLine;

/// Gains at or below this magnitude contribute nothing audible
pub const GAIN_SILENCE_THRESHOLD: f32 = 0.00001;

/// Accumulate `gains[c] * input[c][n]` into `out[n]` for every input channel
///
/// Mixes `out.len()` samples and `min(gains.len(), input.len())` channels.
#[inline]
pub fn mix_row(out: &mut [f32], gains: &[f32], input: &[FloatBufferLine]) {
    for (&gain, line) in gains.iter().zip(input) {
        if gain.abs() <= GAIN_SILENCE_THRESHOLD {
            continue;
        }
        mix_add(out, &line[..out.len()], gain);
    }
}

#[inline]
fn mix_add(dest: &mut [f32], src: &[f32], gain: f32) {
    for (d, s) in dest.iter_mut().zip(src) {
        *d += *s * gain;
    }
}
