//! Falling particle field behind the player.
//!
//! Positions, velocities and accelerations are kept as three parallel
//! fixed-length buffers. Index `i` refers to the same point in all three and
//! the length never changes after construction.

use rand::Rng;

pub const PARTICLE_COUNT: usize = 6000;
/// Initial coordinates are drawn from `[-SPAWN_EXTENT, SPAWN_EXTENT)`.
pub const SPAWN_EXTENT: f32 = 300.0;
pub const FALL_ACCELERATION: f32 = 0.02;
/// Points dropping below this height restart at `RESET_HEIGHT`.
pub const FLOOR: f32 = -200.0;
pub const RESET_HEIGHT: f32 = 200.0;
/// Radians added to the field's Y rotation every frame.
pub const SPIN_PER_FRAME: f32 = 0.002;

pub struct ParticleField {
    /// Flat `[x0, y0, z0, x1, y1, z1, ..]`, ready for a vertex buffer.
    positions: Box<[f32]>,
    velocities: Box<[f32]>,
    accelerations: Box<[f32]>,
    rotation_y: f32,
}

impl ParticleField {
    pub fn new<R: Rng>(count: usize, rng: &mut R) -> Self {
        let positions: Box<[f32]> = (0..count * 3)
            .map(|_| rng.random_range(-SPAWN_EXTENT..SPAWN_EXTENT))
            .collect();

        Self {
            positions,
            velocities: vec![0.0; count].into_boxed_slice(),
            accelerations: vec![FALL_ACCELERATION; count].into_boxed_slice(),
            rotation_y: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.velocities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.velocities.is_empty()
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn velocities(&self) -> &[f32] {
        &self.velocities
    }

    pub fn accelerations(&self) -> &[f32] {
        &self.accelerations
    }

    pub fn height(&self, i: usize) -> f32 {
        self.positions[i * 3 + 1]
    }

    pub fn rotation_y(&self) -> f32 {
        self.rotation_y
    }

    /// Advances one frame: accelerate, fall, wrap, spin.
    pub fn step(&mut self) {
        let heights = self.positions.chunks_exact_mut(3).map(|p| &mut p[1]);
        for ((y, v), a) in heights.zip(self.velocities.iter_mut()).zip(self.accelerations.iter()) {
            *v += *a;
            *y -= *v;
            if *y < FLOOR {
                *y = RESET_HEIGHT;
                *v = 0.0;
            }
        }
        self.rotation_y += SPIN_PER_FRAME;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn field(count: usize) -> ParticleField {
        ParticleField::new(count, &mut SmallRng::seed_from_u64(7))
    }

    #[test]
    fn buffers_share_one_length() {
        let f = field(PARTICLE_COUNT);
        assert_eq!(f.len(), PARTICLE_COUNT);
        assert_eq!(f.positions().len(), PARTICLE_COUNT * 3);
        assert_eq!(f.accelerations().len(), PARTICLE_COUNT);
        assert!(f.velocities().iter().all(|&v| v == 0.0));
        assert!(f.accelerations().iter().all(|&a| a == FALL_ACCELERATION));
        assert!(f
            .positions()
            .iter()
            .all(|&c| (-SPAWN_EXTENT..SPAWN_EXTENT).contains(&c)));
    }

    #[test]
    fn heights_stay_in_band_after_each_pass() {
        let mut f = field(500);
        let spawn: Vec<f32> = (0..f.len()).map(|i| f.height(i)).collect();
        let mut wrapped = vec![false; f.len()];

        for _ in 0..2_000 {
            let before: Vec<f32> = (0..f.len()).map(|i| f.height(i)).collect();
            f.step();
            for i in 0..f.len() {
                let y = f.height(i);
                if y > before[i] {
                    wrapped[i] = true;
                }
                assert!(y >= FLOOR, "point {i} below floor: {y}");
                assert!(f.velocities()[i] >= 0.0);
                // Points spawned above the band only fall into it.
                let ceiling = if wrapped[i] { RESET_HEIGHT } else { spawn[i].max(RESET_HEIGHT) };
                assert!(y <= ceiling, "point {i} above ceiling: {y}");
            }
        }
        assert!(wrapped.iter().all(|&w| w), "every point should have wrapped at least once");
    }

    #[test]
    fn velocity_grows_until_wrap() {
        let mut f = field(1);
        f.positions[1] = 0.0;
        f.step();
        assert!((f.velocities()[0] - FALL_ACCELERATION).abs() < 1e-6);
        assert!((f.height(0) + FALL_ACCELERATION).abs() < 1e-6);

        f.positions[1] = FLOOR + 0.01;
        f.step();
        assert_eq!(f.height(0), RESET_HEIGHT);
        assert_eq!(f.velocities()[0], 0.0);
        assert_eq!(f.accelerations()[0], FALL_ACCELERATION);
    }

    #[test]
    fn only_y_moves_and_field_spins() {
        let mut f = field(64);
        let before = f.positions().to_vec();
        for _ in 0..10 {
            f.step();
        }
        for (b, a) in before.chunks_exact(3).zip(f.positions().chunks_exact(3)) {
            assert_eq!(b[0], a[0]);
            assert_eq!(b[2], a[2]);
        }
        assert!((f.rotation_y() - 10.0 * SPIN_PER_FRAME).abs() < 1e-6);
    }
}
