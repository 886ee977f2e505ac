use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Number of entries in every palette.
pub const PALETTE_SIZE: usize = 6;

/// A single RGBA color. Pixels never store these directly, only their index.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash)]
pub struct ColorEntry {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl ColorEntry {
    #[must_use]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }
}

pub const YELLOW: ColorEntry = ColorEntry::opaque(0xFF, 0xEB, 0x00);
pub const VIVID_RED: ColorEntry = ColorEntry::opaque(0xFC, 0x00, 0x19);
pub const MALACHITE: ColorEntry = ColorEntry::opaque(0x01, 0xFF, 0x4F);
pub const SHOCKING_PINK: ColorEntry = ColorEntry::opaque(0xFF, 0x01, 0xD7);
pub const INTERDIMENSIONAL_BLUE: ColorEntry = ColorEntry::opaque(0x56, 0x00, 0xCC);
pub const TURQUOISE_BLUE: ColorEntry = ColorEntry::opaque(0x00, 0xED, 0xF5);

/// Base ordering of the palette before any shuffle.
pub const BASE_COLORS: [ColorEntry; PALETTE_SIZE] = [
    YELLOW,
    VIVID_RED,
    MALACHITE,
    SHOCKING_PINK,
    INTERDIMENSIONAL_BLUE,
    TURQUOISE_BLUE,
];

/// Fixed-size ordered color table.
///
/// Entry 0 acts as the background of every frame, entries 1 to 3 are the
/// candidates for the curve color. The set of colors never changes, only
/// their order through [`Palette::shuffle`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Palette {
    colors: [ColorEntry; PALETTE_SIZE],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: BASE_COLORS,
        }
    }
}

impl Palette {
    #[must_use]
    pub const fn new(colors: [ColorEntry; PALETTE_SIZE]) -> Self {
        Self { colors }
    }

    /// Reorders the entries with a uniform random permutation.
    #[tracing::instrument(level = "trace", skip(rng))]
    pub fn shuffle<R: Rng>(&mut self, rng: &mut R) {
        trace!("Shuffling palette");
        self.colors.shuffle(rng);
    }

    /// Current order of the entries.
    #[must_use]
    pub const fn colors(&self) -> &[ColorEntry; PALETTE_SIZE] {
        &self.colors
    }

    /// Packed `r, g, b` triples as expected by a GIF color table.
    /// Alpha is dropped since the format has no per-entry alpha.
    #[must_use]
    pub fn rgb_table(&self) -> Vec<u8> {
        self.colors.iter().flat_map(|c| [c.r, c.g, c.b]).collect()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn sorted(colors: &[ColorEntry]) -> Vec<(u8, u8, u8, u8)> {
        let mut entries: Vec<_> = colors.iter().map(|c| (c.r, c.g, c.b, c.a)).collect();
        entries.sort_unstable();
        entries
    }

    #[test]
    fn base_colors_are_distinct() {
        for (i, c1) in BASE_COLORS.iter().enumerate() {
            for (j, c2) in BASE_COLORS.iter().enumerate() {
                if i != j {
                    assert_ne!(c1, c2, "duplicate colors at {i} and {j}");
                }
            }
        }
    }

    #[test]
    fn shuffle_is_permutation() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut palette = Palette::default();
        for _ in 0..50 {
            palette.shuffle(&mut rng);
            assert_eq!(sorted(palette.colors()), sorted(&BASE_COLORS));
        }
    }

    #[test]
    fn shuffle_changes_order_eventually() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut palette = Palette::default();
        let changed = (0..20).any(|_| {
            palette.shuffle(&mut rng);
            palette.colors() != &BASE_COLORS
        });
        assert!(changed);
    }

    #[test]
    fn rgb_table_layout() {
        let table = Palette::default().rgb_table();
        assert_eq!(table.len(), PALETTE_SIZE * 3);
        assert_eq!(&table[0..3], &[0xFF, 0xEB, 0x00]);
        assert_eq!(&table[15..18], &[0x00, 0xED, 0xF5]);
    }

    #[test]
    fn all_entries_opaque() {
        assert!(BASE_COLORS.iter().all(|c| c.a == 0xFF));
    }
}
