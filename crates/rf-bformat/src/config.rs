//! Decoder profile - speaker rows, band setup and coefficient convention
//!
//! Profiles are plain data. Parsing any on-disk decoder format is left to the
//! host; `from_json` exists for profiles stored through serde.

use crate::ambi::{Normalization, AMBI_PERIPHONIC_MASK, FROM_2D};
use crate::error::{BFormatError, BFormatResult};
use crate::{MAX_AMBI_CHANNELS, MAX_AMBI_ORDER, MAX_OUTPUT_CHANNELS};
use serde::{Deserialize, Serialize};

/// Single speaker definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeakerConfig {
    /// Speaker label (e.g., "LF", "RF", "LB")
    #[serde(default)]
    pub name: String,
    /// Physical output channel
    pub channel: usize,
    /// High-frequency (or single-band) coefficients, compacted by channel mask
    pub hf_coeffs: Vec<f32>,
    /// Low-frequency coefficients, only read for two-band profiles
    #[serde(default)]
    pub lf_coeffs: Vec<f32>,
}

/// Decoder profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Ambisonic channels the coefficient rows cover (bit per ACN)
    pub chan_mask: u32,
    /// Number of frequency bands (1 or 2)
    #[serde(default = "default_freq_bands")]
    pub freq_bands: u32,
    /// Convention the coefficients are written in
    #[serde(default)]
    pub coeff_scale: Normalization,
    /// Crossover frequency in Hz
    #[serde(default = "default_xover_freq")]
    pub xover_freq: f32,
    /// HF/LF level ratio in dB
    #[serde(default)]
    pub xover_ratio: f32,
    /// Per-order high-frequency gains
    #[serde(default = "default_order_gain")]
    pub hf_order_gain: [f32; MAX_AMBI_ORDER + 1],
    /// Per-order low-frequency gains
    #[serde(default = "default_order_gain")]
    pub lf_order_gain: [f32; MAX_AMBI_ORDER + 1],
    /// Speakers in decoding order
    pub speakers: Vec<SpeakerConfig>,
}

fn default_freq_bands() -> u32 {
    1
}

fn default_xover_freq() -> f32 {
    400.0
}

fn default_order_gain() -> [f32; MAX_AMBI_ORDER + 1] {
    [1.0; MAX_AMBI_ORDER + 1]
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            description: String::new(),
            chan_mask: 1,
            freq_bands: default_freq_bands(),
            coeff_scale: Normalization::default(),
            xover_freq: default_xover_freq(),
            xover_ratio: 0.0,
            hf_order_gain: default_order_gain(),
            lf_order_gain: default_order_gain(),
            speakers: Vec::new(),
        }
    }
}

impl DecoderConfig {
    /// Parse and validate a profile stored as JSON
    pub fn from_json(json: &str) -> BFormatResult<Self> {
        let conf: Self = serde_json::from_str(json)?;
        conf.validate()?;
        Ok(conf)
    }

    /// Whether the mask includes any height channel
    pub fn is_periphonic(&self) -> bool {
        self.chan_mask & AMBI_PERIPHONIC_MASK != 0
    }

    /// Coefficients each speaker row must carry
    pub fn coeff_count(&self) -> usize {
        if self.is_periphonic() {
            (self.chan_mask & ((1u32 << MAX_AMBI_CHANNELS) - 1)).count_ones() as usize
        } else {
            FROM_2D
                .iter()
                .filter(|&&acn| self.chan_mask & (1 << acn) != 0)
                .count()
        }
    }

    /// Output channel of each speaker, in speaker order
    pub fn channel_map(&self) -> Vec<usize> {
        self.speakers.iter().map(|s| s.channel).collect()
    }

    /// Check the profile against the decoder's construction preconditions
    pub fn validate(&self) -> BFormatResult<()> {
        let result = self.check();
        if let Err(err) = &result {
            log::warn!("Rejected decoder profile '{}': {}", self.description, err);
        }
        result
    }

    fn check(&self) -> BFormatResult<()> {
        if self.speakers.is_empty() {
            return Err(BFormatError::NoSpeakers);
        }
        if self.speakers.len() > MAX_OUTPUT_CHANNELS {
            return Err(BFormatError::TooManySpeakers {
                got: self.speakers.len(),
                max: MAX_OUTPUT_CHANNELS,
            });
        }
        if !matches!(self.freq_bands, 1 | 2) {
            return Err(BFormatError::InvalidFrequencyBands(self.freq_bands));
        }
        if self.chan_mask == 0 || self.chan_mask >> MAX_AMBI_CHANNELS != 0 {
            return Err(BFormatError::InvalidChannelMask(self.chan_mask));
        }
        if self.freq_bands == 2 && !(self.xover_freq.is_finite() && self.xover_freq > 0.0) {
            return Err(BFormatError::InvalidCrossover(self.xover_freq));
        }

        let expected = self.coeff_count();
        for (idx, speaker) in self.speakers.iter().enumerate() {
            if speaker.channel >= MAX_OUTPUT_CHANNELS {
                return Err(BFormatError::InvalidOutputChannel {
                    speaker: idx,
                    channel: speaker.channel,
                    max: MAX_OUTPUT_CHANNELS - 1,
                });
            }
            if speaker.hf_coeffs.len() < expected {
                return Err(BFormatError::CoefficientCountMismatch {
                    speaker: idx,
                    expected,
                    got: speaker.hf_coeffs.len(),
                });
            }
            if self.freq_bands == 2 && speaker.lf_coeffs.len() < expected {
                return Err(BFormatError::CoefficientCountMismatch {
                    speaker: idx,
                    expected,
                    got: speaker.lf_coeffs.len(),
                });
            }
        }

        Ok(())
    }
}
