//! Ambisonic channel numbering and normalization
//!
//! Channels are addressed by ACN. Decoder coefficients are held in N3D
//! internally; `Normalization` gives the divisor that imports a coefficient
//! written against another convention.

use crate::{MAX_AMBI2D_CHANNELS, MAX_AMBI_CHANNELS, MAX_AMBI_ORDER};
use serde::{Deserialize, Serialize};

/// Ambisonic order of each ACN
pub const ORDER_FROM_CHANNEL: [usize; MAX_AMBI_CHANNELS] =
    [0, 1, 1, 1, 2, 2, 2, 2, 2, 3, 3, 3, 3, 3, 3, 3];

/// ACN of each horizontal-only channel, in 2D coefficient order
pub const FROM_2D: [usize; MAX_AMBI2D_CHANNELS] = [0, 1, 3, 4, 8, 9, 15];

/// Channels carrying height information
pub const AMBI_PERIPHONIC_MASK: u32 = periphonic_mask();

const fn periphonic_mask() -> u32 {
    let mut mask = (1u32 << MAX_AMBI_CHANNELS) - 1;
    let mut i = 0;
    while i < MAX_AMBI2D_CHANNELS {
        mask &= !(1u32 << FROM_2D[i]);
        i += 1;
    }
    mask
}

/// Coefficient normalization convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Normalization {
    /// N3D (fully normalized) - internal representation
    #[default]
    N3D,
    /// SN3D (Schmidt semi-normalized) - AmbiX standard
    SN3D,
    /// FuMa (Furse-Malham) - legacy
    FuMa,
}

const FROM_N3D: [f32; MAX_AMBI_CHANNELS] = [1.0; MAX_AMBI_CHANNELS];

const SQRT3: f32 = 1.732_050_8;
const SQRT5: f32 = 2.236_068;
const SQRT7: f32 = 2.645_751_3;

const FROM_SN3D: [f32; MAX_AMBI_CHANNELS] = [
    1.0, // 0
    SQRT3, SQRT3, SQRT3, // 1
    SQRT5, SQRT5, SQRT5, SQRT5, SQRT5, // 2
    SQRT7, SQRT7, SQRT7, SQRT7, SQRT7, SQRT7, SQRT7, // 3
];

const FROM_FUMA: [f32; MAX_AMBI_CHANNELS] = [
    std::f32::consts::SQRT_2, // W
    SQRT3,                    // Y
    SQRT3,                    // Z
    SQRT3,                    // X
    1.936_491_7,              // V, sqrt(15)/2
    1.936_491_7,              // T
    SQRT5,                    // R
    1.936_491_7,              // S
    1.936_491_7,              // U
    2.091_650_1,              // Q, sqrt(35/8)
    1.972_026_6,              // O, sqrt(35)/3
    2.231_093_4,              // M, sqrt(224/45)
    SQRT7,                    // K
    2.231_093_4,              // L
    1.972_026_6,              // N
    2.091_650_1,              // P
];

impl Normalization {
    /// Per-ACN divisors converting this convention to N3D
    pub fn scales(&self) -> &'static [f32; MAX_AMBI_CHANNELS] {
        match self {
            Normalization::N3D => &FROM_N3D,
            Normalization::SN3D => &FROM_SN3D,
            Normalization::FuMa => &FROM_FUMA,
        }
    }
}

/// ACN channel index from (order, degree)
pub fn acn_index(order: i32, degree: i32) -> usize {
    (order * order + order + degree) as usize
}

/// Get (order, degree) from ACN index
pub fn acn_to_order_degree(acn: usize) -> (i32, i32) {
    let order = (acn as f64).sqrt().floor() as i32;
    let degree = acn as i32 - order * order - order;
    (order, degree)
}

/// Channel count of a periphonic signal of the given order
pub fn channels_for_order(order: usize) -> usize {
    debug_assert!(order <= MAX_AMBI_ORDER);
    (order + 1) * (order + 1)
}
