//! B-Format decoder - static ambisonic to speaker matrix
//!
//! The matrix is computed once, off the audio thread. `process` then runs per
//! block without allocating: single-band decoders mix each enabled output row
//! straight from the input, dual-band decoders first split every input
//! channel through its own crossover and mix the HF and LF rows separately.

use crate::ambi::{FROM_2D, ORDER_FROM_CHANNEL};
use crate::config::DecoderConfig;
use crate::crossover::BandSplitter;
use crate::mix::mix_row;
use crate::{
    ChannelDec, FloatBufferLine, BUFFER_SIZE, MAX_AMBI2D_CHANNELS, MAX_AMBI_CHANNELS,
    MAX_AMBI_ORDER, MAX_OUTPUT_CHANNELS,
};

const NUM_BANDS: usize = 2;
const HF_BAND: usize = 0;
const LF_BAND: usize = 1;

/// HF attenuation applied by decoders of each order
const HF_SCALE_1O: [f32; MAX_AMBI_ORDER + 1] = [1.0, 1.0, 1.0, 1.0];
const HF_SCALE_2O: [f32; MAX_AMBI_ORDER + 1] = [0.745_356, 1.0, 1.0, 1.0];
const HF_SCALE_3O: [f32; MAX_AMBI_ORDER + 1] = [0.589_792_2, 0.879_693_9, 1.0, 1.0];

fn decoder_hf_scales(order: usize) -> &'static [f32; MAX_AMBI_ORDER + 1] {
    if order >= 3 {
        &HF_SCALE_3O
    } else if order == 2 {
        &HF_SCALE_2O
    } else {
        &HF_SCALE_1O
    }
}

/// Decoding rows, shaped by band mode
enum DecoderMatrix {
    /// One row per output channel
    Single(Box<[ChannelDec; MAX_OUTPUT_CHANNELS]>),
    /// HF and LF rows per output channel, with per-input crossover state
    Dual {
        matrix: Box<[[ChannelDec; NUM_BANDS]; MAX_OUTPUT_CHANNELS]>,
        xover: Vec<BandSplitter>,
        samples_hf: Box<[FloatBufferLine]>,
        samples_lf: Box<[FloatBufferLine]>,
    },
}

/// Ambisonic decoder to a fixed set of output channels
pub struct BFormatDecoder {
    /// Decoding rows
    matrix: DecoderMatrix,
    /// Bit per output channel that receives a decode
    enabled: u32,
    /// Number of input ambisonic channels
    num_channels: usize,
}

impl BFormatDecoder {
    /// Build from a decoder profile
    ///
    /// `chanmap[i]` is the output channel of `conf.speakers[i]`. Dual-band
    /// decoding is used only when `allow_2band` is set and the profile has two
    /// bands. The profile must already satisfy `DecoderConfig::validate`.
    pub fn from_config(
        conf: &DecoderConfig,
        allow_2band: bool,
        inchans: usize,
        srate: u32,
        chanmap: &[usize],
    ) -> Self {
        assert!(
            inchans > 0 && inchans <= MAX_AMBI_CHANNELS,
            "input channel count {inchans} out of range"
        );
        assert!(
            chanmap.len() >= conf.speakers.len(),
            "channel map has {} entries for {} speakers",
            chanmap.len(),
            conf.speakers.len()
        );

        let chanmap = &chanmap[..conf.speakers.len()];
        let enabled = enabled_mask(chanmap);
        let dual_band = allow_2band && conf.freq_bands == 2;
        let coeff_scale = conf.coeff_scale.scales();

        let matrix = if !dual_band {
            let mut matrix = Box::new([[0.0f32; MAX_AMBI_CHANNELS]; MAX_OUTPUT_CHANNELS]);
            for (speaker, &chan) in conf.speakers.iter().zip(chanmap) {
                let mtx = &mut matrix[chan];
                for (k, (j, acn)) in coefficient_slots(conf).enumerate() {
                    let order = ORDER_FROM_CHANNEL[acn];
                    mtx[j] = coeff(&speaker.hf_coeffs, k) / coeff_scale[acn]
                        * conf.hf_order_gain[order];
                }
            }
            DecoderMatrix::Single(matrix)
        } else {
            // Independently solved HF and LF matrices would step in level at
            // the crossover; the profile's ratio evens them out.
            let ratio = 10.0f32.powf(conf.xover_ratio / 40.0);

            let mut matrix =
                Box::new([[[0.0f32; MAX_AMBI_CHANNELS]; NUM_BANDS]; MAX_OUTPUT_CHANNELS]);
            for (speaker, &chan) in conf.speakers.iter().zip(chanmap) {
                let mtx = &mut matrix[chan];
                for (k, (j, acn)) in coefficient_slots(conf).enumerate() {
                    let order = ORDER_FROM_CHANNEL[acn];
                    mtx[HF_BAND][j] = coeff(&speaker.hf_coeffs, k) / coeff_scale[acn]
                        * conf.hf_order_gain[order]
                        * ratio;
                    mtx[LF_BAND][j] = coeff(&speaker.lf_coeffs, k) / coeff_scale[acn]
                        * conf.lf_order_gain[order]
                        / ratio;
                }
            }

            let splitter = BandSplitter::new(conf.xover_freq / srate as f32);
            DecoderMatrix::Dual {
                matrix,
                xover: vec![splitter; inchans],
                samples_hf: vec![[0.0f32; BUFFER_SIZE]; inchans].into_boxed_slice(),
                samples_lf: vec![[0.0f32; BUFFER_SIZE]; inchans].into_boxed_slice(),
            }
        };

        log::debug!(
            "BFormatDecoder: '{}' {} band, {} input channels, {:?} (periphonic={}), enabled={:#06x}",
            conf.description,
            if dual_band { "dual" } else { "single" },
            inchans,
            conf.coeff_scale,
            conf.is_periphonic(),
            enabled
        );

        Self {
            matrix,
            enabled,
            num_channels: inchans,
        }
    }

    /// Build from explicit per-channel coefficients
    ///
    /// `coeffs[i]` is the row for output channel `chanmap[i]`, already in N3D.
    /// The first `inchans` coefficients are copied as-is.
    pub fn from_coefficients(inchans: usize, coeffs: &[ChannelDec], chanmap: &[usize]) -> Self {
        assert!(
            inchans > 0 && inchans <= MAX_AMBI_CHANNELS,
            "input channel count {inchans} out of range"
        );
        assert!(
            coeffs.len() >= chanmap.len(),
            "coefficient table has {} rows for {} channels",
            coeffs.len(),
            chanmap.len()
        );

        let enabled = enabled_mask(chanmap);

        let mut matrix = Box::new([[0.0f32; MAX_AMBI_CHANNELS]; MAX_OUTPUT_CHANNELS]);
        for (&chan, row) in chanmap.iter().zip(coeffs) {
            matrix[chan][..inchans].copy_from_slice(&row[..inchans]);
        }

        log::debug!(
            "BFormatDecoder: coefficient table, {} input channels, enabled={:#06x}",
            inchans,
            enabled
        );

        Self {
            matrix: DecoderMatrix::Single(matrix),
            enabled,
            num_channels: inchans,
        }
    }

    /// Decode one block, overwriting each enabled output
    ///
    /// Outputs whose bit is clear in `enabled_mask` are left untouched, as
    /// are samples past `samples_to_do`.
    pub fn process(
        &mut self,
        out_buffer: &mut [FloatBufferLine],
        in_samples: &[FloatBufferLine],
        samples_to_do: usize,
    ) {
        self.run(out_buffer, in_samples, samples_to_do, true);
    }

    /// Decode one block, adding onto the existing output content
    pub fn process_add(
        &mut self,
        out_buffer: &mut [FloatBufferLine],
        in_samples: &[FloatBufferLine],
        samples_to_do: usize,
    ) {
        self.run(out_buffer, in_samples, samples_to_do, false);
    }

    fn run(
        &mut self,
        out_buffer: &mut [FloatBufferLine],
        in_samples: &[FloatBufferLine],
        samples_to_do: usize,
        overwrite: bool,
    ) {
        assert!(
            samples_to_do > 0 && samples_to_do <= BUFFER_SIZE,
            "block of {samples_to_do} samples out of range"
        );
        assert!(
            in_samples.len() >= self.num_channels,
            "{} input lines for {} channels",
            in_samples.len(),
            self.num_channels
        );

        let num_channels = self.num_channels;
        let in_samples = &in_samples[..num_channels];
        let outputs = enabled_outputs(out_buffer, self.enabled);

        match &mut self.matrix {
            DecoderMatrix::Single(matrix) => {
                for (chan, outbuf) in outputs {
                    let out = &mut outbuf[..samples_to_do];
                    if overwrite {
                        out.fill(0.0);
                    }
                    mix_row(out, &matrix[chan][..num_channels], in_samples);
                }
            }
            DecoderMatrix::Dual {
                matrix,
                xover,
                samples_hf,
                samples_lf,
            } => {
                let split = xover
                    .iter_mut()
                    .zip(in_samples)
                    .zip(samples_hf.iter_mut().zip(samples_lf.iter_mut()));
                for ((splitter, input), (hf, lf)) in split {
                    splitter.process(
                        &input[..samples_to_do],
                        &mut hf[..samples_to_do],
                        &mut lf[..samples_to_do],
                    );
                }

                for (chan, outbuf) in outputs {
                    let out = &mut outbuf[..samples_to_do];
                    if overwrite {
                        out.fill(0.0);
                    }
                    mix_row(out, &matrix[chan][HF_BAND][..num_channels], &samples_hf[..]);
                    mix_row(out, &matrix[chan][LF_BAND][..num_channels], &samples_lf[..]);
                }
            }
        }
    }

    /// Clear crossover history
    pub fn reset(&mut self) {
        if let DecoderMatrix::Dual { xover, .. } = &mut self.matrix {
            xover.iter_mut().for_each(BandSplitter::reset);
        }
    }

    /// Bit `i` set iff output channel `i` receives a decode
    pub fn enabled_mask(&self) -> u32 {
        self.enabled
    }

    /// Whether HF and LF are decoded separately
    pub fn is_dual_band(&self) -> bool {
        matches!(self.matrix, DecoderMatrix::Dual { .. })
    }

    /// Number of input ambisonic channels
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Decoding row of an output channel (the HF row for dual-band)
    pub fn row(&self, chan: usize) -> &ChannelDec {
        match &self.matrix {
            DecoderMatrix::Single(matrix) => &matrix[chan],
            DecoderMatrix::Dual { matrix, .. } => &matrix[chan][HF_BAND],
        }
    }

    /// LF decoding row of an output channel, if dual-band
    pub fn lf_row(&self, chan: usize) -> Option<&ChannelDec> {
        match &self.matrix {
            DecoderMatrix::Single(_) => None,
            DecoderMatrix::Dual { matrix, .. } => Some(&matrix[chan][LF_BAND]),
        }
    }
}

/// HF compensation for mixing an `in_order` signal into an `out_order` decode
///
/// Entries past `in_order` are zero.
///
/// # Panics
///
/// If `out_order < in_order`.
pub fn compute_order_scales(in_order: usize, out_order: usize) -> [f32; MAX_AMBI_ORDER + 1] {
    assert!(
        out_order >= in_order,
        "output order {out_order} below input order {in_order}"
    );

    let target = decoder_hf_scales(out_order);
    let input = decoder_hf_scales(in_order);

    let mut ret = [0.0f32; MAX_AMBI_ORDER + 1];
    for ((r, i), t) in ret.iter_mut().zip(input).zip(target).take(in_order + 1) {
        *r = i / t;
    }
    ret
}

/// OR of `1 << chan` over the channel map
fn enabled_mask(chanmap: &[usize]) -> u32 {
    chanmap.iter().fold(0u32, |mask, &chan| {
        assert!(
            chan < MAX_OUTPUT_CHANNELS,
            "output channel {chan} exceeds the {MAX_OUTPUT_CHANNELS} channel limit"
        );
        mask | (1 << chan)
    })
}

/// Matrix column and ACN of each coefficient a profile row supplies, in row order
fn coefficient_slots(conf: &DecoderConfig) -> impl Iterator<Item = (usize, usize)> + '_ {
    let periphonic = conf.is_periphonic();
    let count = if periphonic {
        MAX_AMBI_CHANNELS
    } else {
        MAX_AMBI2D_CHANNELS
    };

    (0..count)
        .map(move |j| (j, if periphonic { j } else { FROM_2D[j] }))
        .filter(move |&(_, acn)| conf.chan_mask & (1 << acn) != 0)
}

#[inline]
fn coeff(row: &[f32], k: usize) -> f32 {
    row.get(k).copied().unwrap_or(0.0)
}

fn enabled_outputs(
    out_buffer: &mut [FloatBufferLine],
    enabled: u32,
) -> impl Iterator<Item = (usize, &mut FloatBufferLine)> {
    out_buffer
        .iter_mut()
        .take(MAX_OUTPUT_CHANNELS)
        .enumerate()
        .filter(move |(chan, _)| enabled & (1 << *chan) != 0)
}
