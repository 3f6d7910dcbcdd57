//! ReelForge B-Format Decoder
//!
//! Static ambisonic-to-speaker decoding:
//!
//! ## Decoder Matrix
//! - Built once from a decoder profile or an explicit coefficient table
//! - N3D/SN3D/FuMa coefficient import (internal representation is N3D)
//! - Periphonic (3D) and horizontal-only (2D) channel subsets
//! - Per-order HF/LF gain compensation
//!
//! ## Block Processing
//! - Single-band matrix mix
//! - Dual-band decode through a phase-matched crossover per input channel
//! - No allocation or locking on the processing path
//!
//! ## Order Scaling
//! - HF compensation vector for mixing a lower-order signal into a
//!   higher-order decode

pub mod ambi;
pub mod config;
pub mod crossover;
pub mod decoder;
pub mod mix;

mod error;

pub use ambi::Normalization;
pub use config::{DecoderConfig, SpeakerConfig};
pub use crossover::BandSplitter;
pub use decoder::{compute_order_scales, BFormatDecoder};
pub use error::{BFormatError, BFormatResult};

/// Highest supported ambisonic order
pub const MAX_AMBI_ORDER: usize = 3;

/// Channel count of a full periphonic signal at `MAX_AMBI_ORDER`
pub const MAX_AMBI_CHANNELS: usize = (MAX_AMBI_ORDER + 1) * (MAX_AMBI_ORDER + 1);

/// Channel count of a horizontal-only signal at `MAX_AMBI_ORDER`
pub const MAX_AMBI2D_CHANNELS: usize = MAX_AMBI_ORDER * 2 + 1;

/// Number of addressable output slots (one bit each in the enabled mask)
pub const MAX_OUTPUT_CHANNELS: usize = 16;

const _: () = assert!(MAX_OUTPUT_CHANNELS <= u32::BITS as usize);

/// Samples held by one buffer line; the upper bound for a processed block
pub const BUFFER_SIZE: usize = 1024;

/// One channel's worth of block samples
pub type FloatBufferLine = [f32; BUFFER_SIZE];

/// One output channel's decoding coefficients, indexed by input channel
pub type ChannelDec = [f32; MAX_AMBI_CHANNELS];
