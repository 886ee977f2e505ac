use std::f64::consts::TAU;

use tracing::trace;

use super::{
    canvas::{plot, Canvas},
    config::animation::Sweep,
    palette::Palette,
};

/// Number of curve samples drawn per frame, i.e. the count of
/// `t = i * resolution` with `t < cycles * 2 * pi`.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn sample_count(sweep: &Sweep) -> usize {
    if !(sweep.resolution > 0.0 && sweep.cycles > 0.0) {
        return 0;
    }
    let end = sweep.cycles * TAU;
    let steps = (end / sweep.resolution).ceil();
    if !steps.is_finite() || steps >= usize::MAX as f64 {
        return usize::MAX;
    }
    let mut count = steps as usize;
    // guard against the division landing one off the strict bound
    while count > 0 && (count - 1) as f64 * sweep.resolution >= end {
        count -= 1;
    }
    while count < usize::MAX && (count as f64) * sweep.resolution < end {
        count += 1;
    }
    count
}

/// Renders one frame of the Lissajous figure
/// `x = sin(t)`, `y = sin(t * freq + phase)`.
///
/// The curve parameter is derived from the sample index instead of being
/// accumulated, so the number of samples does not depend on rounding drift.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::suboptimal_flops)]
#[tracing::instrument(level = "trace", skip(palette, sweep))]
pub fn render_frame(
    palette: &Palette,
    freq: f64,
    phase: f64,
    color_index: u8,
    sweep: &Sweep,
) -> Canvas {
    trace!("Rendering frame");
    let mut canvas = Canvas::empty(sweep.half_size, *palette);
    for i in 0..sample_count(sweep) {
        let t = i as f64 * sweep.resolution;
        let x = t.sin();
        let y = (t * freq + phase).sin();
        plot(&mut canvas, x, y, color_index);
    }
    canvas
}
