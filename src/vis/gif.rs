use std::{borrow::Cow, fs::File, io::BufWriter, io::Write, path::Path};

use anyhow::{Context, Result};
use gif::{Encoder, Frame, Repeat};
use tracing::trace;

use crate::core::{animation::Animation, config::animation::LoopCount};

impl From<LoopCount> for Repeat {
    fn from(loop_count: LoopCount) -> Self {
        match loop_count {
            LoopCount::Infinite => Self::Infinite,
            LoopCount::Finite(n) => Self::Finite(n),
        }
    }
}

/// Encodes `animation` as GIF into `out`.
///
/// The palette becomes the global color table and every canvas is written
/// as one indexed frame with its own delay. The trailer is only written if
/// every frame was encoded, so a failed call never yields a valid file.
///
/// # Errors
///
/// Returns an error if the animation has no frames, a frame does not fit
/// into the 16 bit GIF dimensions, or writing to `out` fails.
#[tracing::instrument(level = "trace", skip_all)]
pub fn encode_animation<W: Write>(animation: &Animation, out: W) -> Result<()> {
    trace!("Encoding animation with {} frames", animation.len());

    if animation.is_empty() {
        return Err(anyhow::anyhow!("Cannot encode an animation without frames"));
    }

    let (width, height) = animation.dimensions();
    let width = u16::try_from(width).context("Frame width exceeds GIF limits")?;
    let height = u16::try_from(height).context("Frame height exceeds GIF limits")?;

    let mut encoder = Encoder::new(out, width, height, &animation.palette.rgb_table())
        .context("Failed to write GIF header")?;
    encoder
        .set_repeat(animation.loop_count.into())
        .context("Failed to write GIF loop extension")?;

    for (index, (canvas, &delay)) in animation
        .canvases
        .iter()
        .zip(&animation.delays)
        .enumerate()
    {
        if (canvas.width(), canvas.height()) != (usize::from(width), usize::from(height)) {
            return Err(anyhow::anyhow!(
                "Frame {index} is {}x{}, expected {width}x{height}",
                canvas.width(),
                canvas.height()
            ));
        }
        let frame = Frame {
            width,
            height,
            delay,
            buffer: Cow::Owned(canvas.indices()),
            ..Frame::default()
        };
        encoder
            .write_frame(&frame)
            .with_context(|| format!("Failed to write frame {index}"))?;
    }

    encoder
        .into_inner()
        .context("Failed to write GIF trailer")?
        .flush()
        .context("Failed to flush GIF output")?;
    Ok(())
}

/// Writes `animation` to a GIF file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be created or encoding fails.
#[tracing::instrument(level = "trace", skip(animation))]
pub fn save_animation(animation: &Animation, path: &Path) -> Result<()> {
    trace!("Saving animation to {}", path.display());
    let file = BufWriter::new(
        File::create(path).with_context(|| format!("Failed to create '{}'", path.display()))?,
    );
    encode_animation(animation, file)
        .with_context(|| format!("Failed to save animation to '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor};

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::{
        core::{
            animation::generate_animation,
            canvas::Canvas,
            config::animation::AnimationConfig,
            palette::Palette,
        },
        tests::{fresh_output, small_config},
    };

    const COMMON_PATH: &str = "tests/vis/gif";

    fn small_animation(loop_count: LoopCount) -> Animation {
        let config = AnimationConfig {
            loop_count,
            ..small_config(12, 5)
        };
        generate_animation(
            &Palette::default(),
            &config,
            &mut ChaCha8Rng::seed_from_u64(21),
        )
    }

    fn netscape_loop_count(bytes: &[u8]) -> Option<u16> {
        let marker = b"NETSCAPE2.0";
        let start = bytes.windows(marker.len()).position(|w| w == marker)?;
        // sub-block: size (3), id (1), count little endian
        let count = &bytes[start + marker.len() + 2..start + marker.len() + 4];
        Some(u16::from_le_bytes([count[0], count[1]]))
    }

    #[test]
    fn encoded_gif_decodes_to_same_frames() -> anyhow::Result<()> {
        let animation = small_animation(LoopCount::Finite(64));
        let mut bytes = Vec::new();
        encode_animation(&animation, &mut bytes)?;

        let mut options = gif::DecodeOptions::new();
        options.set_color_output(gif::ColorOutput::Indexed);
        let mut decoder = options.read_info(Cursor::new(&bytes))?;
        assert_eq!(decoder.width(), 25);
        assert_eq!(decoder.height(), 25);
        let global = decoder
            .global_palette()
            .ok_or_else(|| anyhow::anyhow!("Expected a global palette"))?
            .to_vec();
        assert_eq!(&global[..18], animation.palette.rgb_table().as_slice());

        let mut decoded = 0;
        while let Some(frame) = decoder.read_next_frame()? {
            assert_eq!(frame.delay, 16);
            assert_eq!(&*frame.buffer, animation.canvases[decoded].indices().as_slice());
            decoded += 1;
        }
        assert_eq!(decoded, animation.len());
        Ok(())
    }

    #[test]
    fn loop_count_is_written() -> anyhow::Result<()> {
        let mut bytes = Vec::new();
        encode_animation(&small_animation(LoopCount::Finite(64)), &mut bytes)?;
        assert_eq!(netscape_loop_count(&bytes), Some(64));

        let mut bytes = Vec::new();
        encode_animation(&small_animation(LoopCount::Infinite), &mut bytes)?;
        assert_eq!(netscape_loop_count(&bytes), Some(0));
        Ok(())
    }

    #[test]
    fn empty_animation_is_rejected() {
        let animation = Animation::empty(Palette::default(), 1.0, 1, LoopCount::Infinite);
        assert!(encode_animation(&animation, Vec::new()).is_err());
    }

    #[test]
    fn mismatched_frame_sizes_are_rejected() {
        let mut animation = small_animation(LoopCount::Infinite);
        animation.push(Canvas::empty(3, Palette::default()), 16, 0.5);
        assert!(encode_animation(&animation, Vec::new()).is_err());
    }

    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn sink_failure_propagates() {
        let result = encode_animation(&small_animation(LoopCount::Infinite), FailingSink);
        assert!(result.is_err());
    }

    #[test]
    fn save_animation_writes_file() -> anyhow::Result<()> {
        let file = fresh_output(COMMON_PATH, "save_animation_writes_file.gif")?;

        save_animation(&small_animation(LoopCount::Finite(64)), &file)?;

        assert!(file.is_file());
        let bytes = std::fs::read(&file)?;
        assert_eq!(&bytes[..6], b"GIF89a");
        Ok(())
    }
}
