use std::{
    io::Write,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use super::{
    animation::{generate_animation, Animation},
    config::animation::AnimationConfig,
    palette::Palette,
};
use crate::vis::gif::encode_animation;

/// Entry point for a single render request.
///
/// Every call to [`Renderer::render`] works on its own copy of the base
/// palette and its own freshly seeded generator, so clones of one renderer
/// can be used from several threads at once.
#[derive(Debug, Clone)]
pub struct Renderer {
    base_palette: Palette,
    config: AnimationConfig,
    seed: Option<u64>,
    renders: Arc<AtomicU64>,
}

impl Renderer {
    #[must_use]
    pub fn new(config: AnimationConfig, seed: Option<u64>) -> Self {
        Self {
            base_palette: Palette::default(),
            config,
            seed,
            renders: Arc::new(AtomicU64::new(0)),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &AnimationConfig {
        &self.config
    }

    /// Number of renders started through this renderer and its clones.
    #[must_use]
    pub fn render_count(&self) -> u64 {
        self.renders.load(Ordering::Relaxed)
    }

    /// With a base seed, render `n` uses `seed + n`; otherwise the
    /// generator is seeded from the thread-local OS-backed source.
    fn next_rng(&self) -> ChaCha8Rng {
        let render = self.renders.fetch_add(1, Ordering::Relaxed);
        self.seed.map_or_else(
            || ChaCha8Rng::from_rng(&mut rand::rng()),
            |seed| ChaCha8Rng::seed_from_u64(seed.wrapping_add(render)),
        )
    }

    /// Shuffles a copy of the palette and generates one animation with it.
    #[must_use]
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn render(&self) -> Animation {
        let mut rng = self.next_rng();
        let mut palette = self.base_palette;
        palette.shuffle(&mut rng);
        debug!("Rendering with palette {:?}", palette.colors());
        generate_animation(&palette, &self.config, &mut rng)
    }

    /// Renders one animation and writes it as GIF to `out`.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    #[tracing::instrument(level = "debug", skip(self, out))]
    pub fn render_to<W: Write>(&self, out: W) -> Result<()> {
        let animation = self.render();
        encode_animation(&animation, out).context("Failed to deliver animation")
    }

    /// Renders one animation into an in-memory GIF.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn render_gif(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.render_to(&mut buffer)?;
        info!("Rendered GIF with {} bytes", buffer.len());
        Ok(buffer)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(AnimationConfig::default(), None)
    }
}
