use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use skyship_common::ParticleConfig;

/// Lower edge of the vertical band. Reaching it wraps a particle to the top.
pub const BAND_BOTTOM: f32 = -0.5;
/// Upper edge of the vertical band.
pub const BAND_TOP: f32 = 0.5;

/// Fixed set of exhaust points streaming downward through a unit band.
///
/// Positions are mutated in place each step; `is_dirty` tells the renderer
/// the buffer needs re-uploading.
#[derive(Debug, Clone)]
pub struct ParticleField {
    positions: Vec<[f32; 3]>,
    step: f32,
    dirty: bool,
}

impl ParticleField {
    /// Scatter `config.count` particles with random horizontal spread and height.
    pub fn new(config: &ParticleConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let half = config.spread.max(0.0) * 0.5;
        let positions = (0..config.count)
            .map(|_| {
                [
                    rng.gen_range(-half..=half),
                    rng.gen_range(BAND_BOTTOM..=BAND_TOP),
                    rng.gen_range(-half..=half),
                ]
            })
            .collect();

        tracing::debug!("particle field: {} points, spread {}", config.count, config.spread);
        Self::from_positions(positions, config.step)
    }

    /// Build a field from explicit positions. Heights outside the band are clamped in.
    pub fn from_positions(mut positions: Vec<[f32; 3]>, step: f32) -> Self {
        for p in &mut positions {
            p[1] = p[1].clamp(BAND_BOTTOM, BAND_TOP);
        }
        Self {
            positions,
            step,
            dirty: true,
        }
    }

    /// Advance every particle one step down, wrapping at the bottom of the band.
    pub fn step(&mut self) {
        for p in &mut self.positions {
            p[1] -= self.step;
            if p[1] <= BAND_BOTTOM {
                p[1] = BAND_TOP;
            }
        }
        self.dirty = true;
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Called once the renderer has consumed the current positions.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}
