use rand::Rng;
use tracing::{debug, trace};

use super::{
    canvas::Canvas,
    config::animation::{AnimationConfig, LoopCount},
    frame::render_frame,
    palette::Palette,
};

/// Palette indices the curve may be drawn with. Index 0 is the background.
pub const CURVE_COLOR_INDICES: std::ops::RangeInclusive<u8> = 1..=3;

/// Ordered frames of one render together with their timing.
///
/// `canvases`, `delays` and `phases` always have the same length.
#[derive(Debug, PartialEq, Clone)]
pub struct Animation {
    pub canvases: Vec<Canvas>,
    /// Per-frame delay in hundredths of a second.
    pub delays: Vec<u16>,
    pub phases: Vec<f64>,
    pub loop_count: LoopCount,
    pub palette: Palette,
    pub freq: f64,
    pub color_index: u8,
}

impl Animation {
    #[must_use]
    pub fn empty(palette: Palette, freq: f64, color_index: u8, loop_count: LoopCount) -> Self {
        Self {
            canvases: Vec::new(),
            delays: Vec::new(),
            phases: Vec::new(),
            loop_count,
            palette,
            freq,
            color_index,
        }
    }

    pub fn push(&mut self, canvas: Canvas, delay: u16, phase: f64) {
        self.canvases.push(canvas);
        self.delays.push(delay);
        self.phases.push(phase);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.canvases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.canvases.is_empty()
    }

    /// Width and height of the frames, `(0, 0)` for an empty animation.
    #[must_use]
    pub fn dimensions(&self) -> (usize, usize) {
        self.canvases
            .first()
            .map_or((0, 0), |canvas| (canvas.width(), canvas.height()))
    }
}

/// Draws the frequency ratio and curve color, then renders
/// `config.frames` frames with a phase growing by `config.phase_step`.
#[must_use]
#[tracing::instrument(level = "debug", skip(palette, rng))]
pub fn generate_animation<R: Rng>(
    palette: &Palette,
    config: &AnimationConfig,
    rng: &mut R,
) -> Animation {
    let freq = if config.max_freq.is_finite() && config.max_freq > 0.0 {
        rng.random_range(0.0..config.max_freq)
    } else {
        0.0
    };
    let color_index = rng.random_range(CURVE_COLOR_INDICES);
    debug!("Generating animation with freq {freq:.4} and color index {color_index}");

    let mut animation = Animation::empty(*palette, freq, color_index, config.loop_count);
    let mut phase = 0.0;
    for frame in 0..config.frames {
        trace!("Frame {frame} at phase {phase:.2}");
        let canvas = render_frame(palette, freq, phase, color_index, &config.sweep);
        animation.push(canvas, config.delay, phase);
        phase += config.phase_step;
    }
    animation
}
