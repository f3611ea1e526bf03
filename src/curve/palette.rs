use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// The four colors the strip starts with, one per base-square corner.
pub const BASE_COLORS: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 1.0],
    [0.609, 0.115, 0.436, 1.0],
    [0.327, 0.483, 0.844, 1.0],
    [0.822, 0.569, 0.201, 1.0],
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteMode {
    /// Repeat [`BASE_COLORS`] along the strip.
    #[default]
    Cycle,
    /// Independent random RGBA per vertex.
    Random,
}

/// Per-vertex RGBA colors, always exactly one entry per strip vertex.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorBuffer {
    colors: Vec<[f32; 4]>,
}

impl ColorBuffer {
    pub fn cycle(count: usize) -> Self {
        let colors = BASE_COLORS.iter().copied().cycle().take(count).collect();
        Self { colors }
    }

    /// Random gradient. A fixed `seed` makes the colors reproducible across runs.
    pub fn random(count: usize, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let colors = (0..count)
            .map(|_| [rng.random(), rng.random(), rng.random(), rng.random()])
            .collect();
        Self { colors }
    }

    pub fn generate(mode: PaletteMode, count: usize, seed: Option<u64>) -> Self {
        match mode {
            PaletteMode::Cycle => Self::cycle(count),
            PaletteMode::Random => Self::random(count, seed),
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Flattened `r, g, b, a` floats, ready for upload.
    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(self.colors.as_slice())
    }
}
