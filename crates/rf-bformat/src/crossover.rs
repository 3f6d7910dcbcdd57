//! Phase-matched two-band splitter
//!
//! The low band is two cascaded one-pole low-passes; the high band is a
//! first-order all-pass with the low band removed. Summing both bands gives
//! the all-pass response, so the split is magnitude-flat and the bands stay
//! in phase across the crossover.

use std::f32::consts::TAU;

/// Two-band crossover for one channel
#[derive(Debug, Clone, Default)]
pub struct BandSplitter {
    /// All-pass coefficient
    coeff: f32,
    /// Low-pass stage states
    lp_z1: f32,
    lp_z2: f32,
    /// All-pass state
    ap_z1: f32,
}

impl BandSplitter {
    /// Create splitter for a crossover frequency normalized by sample rate
    pub fn new(f0norm: f32) -> Self {
        let mut splitter = Self::default();
        splitter.init(f0norm);
        splitter
    }

    /// Set crossover frequency (`freq / sample_rate`) and clear history
    pub fn init(&mut self, f0norm: f32) {
        let w = f0norm * TAU;
        let cw = w.cos();
        self.coeff = if cw > f32::EPSILON {
            (w.sin() - 1.0) / cw
        } else {
            cw * -0.5
        };

        self.reset();
    }

    /// Clear filter history
    pub fn reset(&mut self) {
        self.lp_z1 = 0.0;
        self.lp_z2 = 0.0;
        self.ap_z1 = 0.0;
    }

    /// Split one block into high and low bands, continuing from the last call
    pub fn process(&mut self, input: &[f32], hp_out: &mut [f32], lp_out: &mut [f32]) {
        debug_assert!(hp_out.len() >= input.len() && lp_out.len() >= input.len());

        let ap_coeff = self.coeff;
        let lp_coeff = self.coeff * 0.5 + 0.5;
        let mut lp_z1 = self.lp_z1;
        let mut lp_z2 = self.lp_z2;
        let mut ap_z1 = self.ap_z1;

        for ((&x, hp), lp) in input.iter().zip(hp_out.iter_mut()).zip(lp_out.iter_mut()) {
            let mut d = (x - lp_z1) * lp_coeff;
            let mut lp_y = lp_z1 + d;
            lp_z1 = lp_y + d;

            d = (lp_y - lp_z2) * lp_coeff;
            lp_y = lp_z2 + d;
            lp_z2 = lp_y + d;

            let ap_y = x * ap_coeff + ap_z1;
            ap_z1 = x - ap_y * ap_coeff;

            *lp = lp_y;
            *hp = ap_y - lp_y;
        }

        self.lp_z1 = lp_z1;
        self.lp_z2 = lp_z2;
        self.ap_z1 = ap_z1;
    }
}
