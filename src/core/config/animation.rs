use std::f64::consts::TAU;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Upper bound for curve samples per frame.
pub const MAX_SAMPLES_PER_FRAME: f64 = 1e8;

/// Parameters of the curve sweep that draws a single frame.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy)]
#[serde(default)]
pub struct Sweep {
    /// Canvas half-size `S`; frames are `2 * S + 1` pixels wide and high.
    pub half_size: usize,
    /// Number of full `2 * pi` periods of the x oscillator.
    pub cycles: f64,
    /// Step of the curve parameter between two samples.
    pub resolution: f64,
}

impl Sweep {
    /// Checks that the sweep terminates and the canvas fits a GIF frame.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if !(self.cycles.is_finite() && self.cycles > 0.0) {
            return Err(anyhow::anyhow!(
                "sweep.cycles must be finite and positive, got {}",
                self.cycles
            ));
        }
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(anyhow::anyhow!(
                "sweep.resolution must be finite and positive, got {}",
                self.resolution
            ));
        }
        let samples = self.cycles * TAU / self.resolution;
        if samples > MAX_SAMPLES_PER_FRAME {
            return Err(anyhow::anyhow!(
                "sweep.cycles / sweep.resolution yields {samples:.0} samples per frame, \
                 at most {MAX_SAMPLES_PER_FRAME:.0} are allowed"
            ));
        }
        let side = self
            .half_size
            .checked_mul(2)
            .and_then(|v| v.checked_add(1))
            .filter(|&side| side <= usize::from(u16::MAX));
        if side.is_none() {
            return Err(anyhow::anyhow!(
                "sweep.half_size {} gives frames wider than {} pixels",
                self.half_size,
                u16::MAX
            ));
        }
        Ok(())
    }
}

impl Default for Sweep {
    fn default() -> Self {
        Self {
            half_size: 200,
            cycles: 5.0,
            resolution: 0.001,
        }
    }
}

/// How often a viewer should replay the animation.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum LoopCount {
    Infinite,
    Finite(u16),
}

impl Default for LoopCount {
    fn default() -> Self {
        Self::Finite(64)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy)]
#[serde(default)]
pub struct AnimationConfig {
    pub frames: usize,
    /// Per-frame delay in hundredths of a second.
    pub delay: u16,
    /// Phase added to the y oscillator between two frames.
    pub phase_step: f64,
    /// Upper (exclusive) bound of the randomly drawn frequency ratio.
    pub max_freq: f64,
    pub loop_count: LoopCount,
    pub sweep: Sweep,
}

impl AnimationConfig {
    /// Rejects values that would make a render hang, panic or exceed the
    /// GIF format limits.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        self.sweep.validate()?;
        if !self.phase_step.is_finite() {
            return Err(anyhow::anyhow!(
                "phase_step must be finite, got {}",
                self.phase_step
            ));
        }
        if !(self.max_freq.is_finite() && self.max_freq >= 0.0) {
            return Err(anyhow::anyhow!(
                "max_freq must be finite and not negative, got {}",
                self.max_freq
            ));
        }
        Ok(())
    }
}

impl Default for AnimationConfig {
    /// Returns the reference animation: 64 frames of 401x401 pixels,
    /// 160 ms apart, looping 64 times.
    #[tracing::instrument(level = "debug")]
    fn default() -> Self {
        debug!("Creating default animation config");
        Self {
            frames: 64,
            delay: 16,
            phase_step: 0.1,
            max_freq: 5.0,
            loop_count: LoopCount::default(),
            sweep: Sweep::default(),
        }
    }
}
