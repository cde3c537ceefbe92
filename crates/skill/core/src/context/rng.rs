//! Seeded random stream owned by each execution.
//!
//! Every execution carries exactly one [`SkillRng`]. Re-running a cast with the
//! same seed against the same world replays the same crits, jitter and random
//! picks, which is what makes cast outcomes testable.

use rand::{RngCore, SeedableRng};

/// PCG-XSH-RR stream: 64-bit state, 32-bit output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkillRng {
    state: u64,
}

impl SkillRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    pub fn with_seed(seed: u64) -> Self {
        // Discard one step so that nearby seeds diverge immediately.
        let mut rng = Self {
            state: seed.wrapping_add(Self::INCREMENT),
        };
        rng.step();
        rng
    }

    #[inline]
    fn step(&mut self) -> u64 {
        let old = self.state;
        self.state = old
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT);
        old
    }

    #[inline]
    fn output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        // 24 high bits fit the f32 mantissa exactly.
        (self.next_u32() >> 8) as f32 * (1.0 / (1u32 << 24) as f32)
    }

    /// Uniform in `[min, max)`. Returns `min` for an empty range.
    pub fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        min + (max - min) * self.next_f32()
    }

    /// Uniform in `[min, max]` inclusive. Returns `min` when `min >= max`.
    pub fn range_i32(&mut self, min: i32, max: i32) -> i32 {
        if min >= max {
            return min;
        }
        let span = (i64::from(max) - i64::from(min) + 1) as u64;
        // the offset can exceed i32::MAX, so sum in i64
        (i64::from(min) + (self.next_u64() % span) as i64) as i32
    }

    /// Returns true with probability `p` (clamped to `[0, 1]`).
    pub fn chance(&mut self, p: f32) -> bool {
        if p <= 0.0 {
            return false;
        }
        if p >= 1.0 {
            return true;
        }
        self.next_f32() < p
    }

    /// Uniform pick from a slice; `None` when empty.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let index = (self.next_u64() % items.len() as u64) as usize;
        items.get(index)
    }

    /// Derives an independent child stream, advancing this one.
    pub fn fork(&mut self) -> Self {
        Self::with_seed(self.next_u64())
    }
}

impl RngCore for SkillRng {
    fn next_u32(&mut self) -> u32 {
        let state = self.step();
        Self::output(state)
    }

    fn next_u64(&mut self) -> u64 {
        let high = self.next_u32() as u64;
        let low = self.next_u32() as u64;
        (high << 32) | low
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for SkillRng {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::with_seed(u64::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::with_seed(state)
    }
}

/// Mixes the entropy sources of a cast into a single seed.
///
/// * `base_seed` - executor-wide seed fixed at startup
/// * `nonce` - increments on every accepted cast
/// * `owner` - raw id of the casting entity
/// * `context` - distinguishes several streams derived for the same cast
pub fn compute_seed(base_seed: u64, nonce: u64, owner: u32, context: u32) -> u64 {
    let mut hash = base_seed;
    hash ^= nonce.wrapping_mul(0x9e3779b97f4a7c15);
    hash ^= (owner as u64).wrapping_mul(0x517cc1b727220a95);
    hash ^= (context as u64).wrapping_mul(0x85ebca6b);

    // avalanche
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;

    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_i32_covers_spans_wider_than_i32() {
        let mut rng = SkillRng::with_seed(9);
        for (min, max) in [(i32::MIN, i32::MAX), (-1_000_000_000, 2_000_000_000)] {
            for _ in 0..1_000 {
                let value = rng.range_i32(min, max);
                assert!((min..=max).contains(&value));
            }
        }
        let top: Vec<i32> = (0..200).map(|_| rng.range_i32(i32::MAX - 1, i32::MAX)).collect();
        assert!(top.contains(&(i32::MAX - 1)) && top.contains(&i32::MAX));
    }

    #[test]
    fn same_seed_same_stream() {
        let mut a = SkillRng::with_seed(42);
        let mut b = SkillRng::with_seed(42);
        for _ in 0..32 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn adjacent_seeds_diverge() {
        let mut a = SkillRng::with_seed(1);
        let mut b = SkillRng::with_seed(2);
        let same = (0..16).filter(|_| a.next_u32() == b.next_u32()).count();
        assert!(same < 4);
    }

    #[test]
    fn unit_float_stays_in_range() {
        let mut rng = SkillRng::with_seed(7);
        for _ in 0..1_000 {
            let v = rng.next_f32();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn int_range_is_inclusive() {
        let mut rng = SkillRng::with_seed(9);
        let mut seen = [false; 3];
        for _ in 0..200 {
            let v = rng.range_i32(-1, 1);
            seen[(v + 1) as usize] = true;
        }
        assert_eq!(seen, [true, true, true]);
        assert_eq!(rng.range_i32(5, 5), 5);
    }

    #[test]
    fn chance_extremes_are_exact() {
        let mut rng = SkillRng::with_seed(3);
        assert!((0..100).all(|_| rng.chance(1.0)));
        assert!((0..100).all(|_| !rng.chance(0.0)));
    }

    #[test]
    fn choose_on_empty_is_none() {
        let mut rng = SkillRng::with_seed(0);
        let empty: [u8; 0] = [];
        assert!(rng.choose(&empty).is_none());
        assert_eq!(rng.choose(&[4]), Some(&4));
    }

    #[test]
    fn seed_mix_depends_on_every_input() {
        let base = compute_seed(1, 2, 3, 0);
        assert_ne!(base, compute_seed(9, 2, 3, 0));
        assert_ne!(base, compute_seed(1, 9, 3, 0));
        assert_ne!(base, compute_seed(1, 2, 9, 0));
        assert_ne!(base, compute_seed(1, 2, 3, 1));
    }
}
