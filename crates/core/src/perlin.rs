//! Improved gradient noise over a seeded permutation table.
//!
//! [`PermutationNoise`] is the classic 3-D improved Perlin construction: a
//! shuffled permutation of `0..=255`, duplicated to 512 entries so corner
//! hashes never need a wrap check, a quintic fade curve and 12 gradient
//! directions picked from the low four hash bits. Output lies roughly in
//! [-1, 1], is zero on every integer lattice point and repeats every 256 units
//! on each axis.
//!
//! The type implements [`noise::NoiseFn`] so it can stand in anywhere a
//! `noise` crate generator is accepted, and vice versa.

use noise::NoiseFn;

use crate::prng::Xorshift64;

const TABLE_SIZE: usize = 256;

/// Seeded 3-D gradient noise.
#[derive(Clone)]
pub struct PermutationNoise {
    perm: [u8; TABLE_SIZE * 2],
}

impl PermutationNoise {
    /// Builds the permutation table with a Fisher–Yates shuffle driven by `seed`.
    pub fn new(seed: u64) -> Self {
        let mut table: [u8; TABLE_SIZE] = std::array::from_fn(|i| i as u8);
        Xorshift64::new(seed).shuffle(&mut table);
        let mut perm = [0u8; TABLE_SIZE * 2];
        perm[..TABLE_SIZE].copy_from_slice(&table);
        perm[TABLE_SIZE..].copy_from_slice(&table);
        Self { perm }
    }

    fn p(&self, i: usize) -> usize {
        usize::from(self.perm[i])
    }

    /// Evaluates the noise at `(x, y, z)`.
    pub fn sample(&self, x: f64, y: f64, z: f64) -> f64 {
        let (xi, xf) = split(x);
        let (yi, yf) = split(y);
        let (zi, zf) = split(z);

        let u = fade(xf);
        let v = fade(yf);
        let w = fade(zf);

        let a = self.p(xi) + yi;
        let aa = self.p(a) + zi;
        let ab = self.p(a + 1) + zi;
        let b = self.p(xi + 1) + yi;
        let ba = self.p(b) + zi;
        let bb = self.p(b + 1) + zi;

        let g = |hash: usize, dx: f64, dy: f64, dz: f64| grad(self.p(hash), dx, dy, dz);

        lerp(
            w,
            lerp(
                v,
                lerp(u, g(aa, xf, yf, zf), g(ba, xf - 1.0, yf, zf)),
                lerp(u, g(ab, xf, yf - 1.0, zf), g(bb, xf - 1.0, yf - 1.0, zf)),
            ),
            lerp(
                v,
                lerp(
                    u,
                    g(aa + 1, xf, yf, zf - 1.0),
                    g(ba + 1, xf - 1.0, yf, zf - 1.0),
                ),
                lerp(
                    u,
                    g(ab + 1, xf, yf - 1.0, zf - 1.0),
                    g(bb + 1, xf - 1.0, yf - 1.0, zf - 1.0),
                ),
            ),
        )
    }
}

impl std::fmt::Debug for PermutationNoise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermutationNoise")
            .field("head", &&self.perm[..8])
            .finish_non_exhaustive()
    }
}

impl NoiseFn<f64, 3> for PermutationNoise {
    fn get(&self, point: [f64; 3]) -> f64 {
        self.sample(point[0], point[1], point[2])
    }
}

/// Splits a coordinate into its wrapped lattice cell and fractional offset.
fn split(v: f64) -> (usize, f64) {
    let floor = v.floor();
    ((floor as i64 & 255) as usize, v - floor)
}

/// Quintic fade `6t^5 - 15t^4 + 10t^3`.
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

/// Dot product of the offset with one of 12 cube-edge gradients (16 hash cases).
fn grad(hash: usize, x: f64, y: f64, z: f64) -> f64 {
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = if h < 4 {
        y
    } else if h == 12 || h == 14 {
        x
    } else {
        z
    };
    (if h & 1 == 0 { u } else { -u }) + (if h & 2 == 0 { v } else { -v })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fade_hits_endpoints_and_midpoint() {
        assert_eq!(fade(0.0), 0.0);
        assert_eq!(fade(1.0), 1.0);
        assert!((fade(0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn grad_covers_all_sixteen_cases() {
        // (1, 2, 3) makes every case distinguishable.
        let expected = [3.0, 1.0, -1.0, -3.0, 4.0, 2.0, -2.0, -4.0];
        for (h, want) in expected.iter().enumerate() {
            assert_eq!(grad(h, 1.0, 2.0, 3.0), *want, "hash {h}");
        }
        assert_eq!(grad(12, 1.0, 2.0, 3.0), 3.0);
        assert_eq!(grad(14, 1.0, 2.0, 3.0), 1.0);
        assert_eq!(grad(15, 1.0, 2.0, 3.0), -5.0);
        assert_eq!(grad(16, 1.0, 2.0, 3.0), grad(0, 1.0, 2.0, 3.0));
    }

    #[test]
    fn same_arguments_give_identical_values() {
        let noise = PermutationNoise::new(42);
        let a = noise.sample(1.3, 2.7, 0.5);
        let b = noise.sample(1.3, 2.7, 0.5);
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn same_seed_builds_same_table() {
        let a = PermutationNoise::new(5);
        let b = PermutationNoise::new(5);
        for i in 0..50 {
            let p = (i as f64 * 0.37, i as f64 * 0.11, 0.25);
            assert_eq!(a.sample(p.0, p.1, p.2), b.sample(p.0, p.1, p.2));
        }
    }

    #[test]
    fn different_seeds_build_different_tables() {
        let a = PermutationNoise::new(1);
        let b = PermutationNoise::new(2);
        let differs = (0..50).any(|i| {
            let x = i as f64 * 0.37 + 0.1;
            a.sample(x, 0.6, 0.3) != b.sample(x, 0.6, 0.3)
        });
        assert!(differs);
    }

    #[test]
    fn table_is_duplicated_permutation() {
        let noise = PermutationNoise::new(3);
        let (head, tail) = noise.perm.split_at(TABLE_SIZE);
        assert_eq!(head, tail);
        let mut sorted = head.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..=255).collect::<Vec<u8>>());
    }

    #[test]
    fn zero_on_integer_lattice() {
        let noise = PermutationNoise::new(11);
        for (x, y, z) in [(0.0, 0.0, 0.0), (3.0, -7.0, 12.0), (255.0, 1.0, -1.0)] {
            assert_eq!(noise.sample(x, y, z), 0.0, "lattice ({x}, {y}, {z})");
        }
    }

    #[test]
    fn periodic_every_256_units() {
        let noise = PermutationNoise::new(8);
        for i in 0..20 {
            let x = i as f64 * 0.731 + 0.2;
            let a = noise.sample(x, 0.4, 0.9);
            let b = noise.sample(x + 256.0, 0.4, 0.9);
            assert!((a - b).abs() < 1e-9, "period broken at x={x}: {a} vs {b}");
        }
    }

    #[test]
    fn usable_through_noise_fn_trait() {
        let noise = PermutationNoise::new(4);
        let via_trait: &dyn NoiseFn<f64, 3> = &noise;
        assert_eq!(via_trait.get([0.3, 0.6, 0.9]), noise.sample(0.3, 0.6, 0.9));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn output_is_bounded_and_finite(
                seed: u64,
                x in -1e4_f64..1e4,
                y in -1e4_f64..1e4,
                z in -1e4_f64..1e4,
            ) {
                let v = PermutationNoise::new(seed).sample(x, y, z);
                prop_assert!(v.is_finite());
                prop_assert!(v.abs() <= 1.1, "noise({x}, {y}, {z}) = {v}");
            }

            #[test]
            fn output_is_continuous(
                x in -100.0_f64..100.0,
                y in -100.0_f64..100.0,
                z in -100.0_f64..100.0,
            ) {
                let noise = PermutationNoise::new(42);
                let a = noise.sample(x, y, z);
                let b = noise.sample(x + 1e-6, y, z);
                prop_assert!((a - b).abs() < 1e-4, "jump of {} at ({x}, {y}, {z})", (a - b).abs());
            }
        }
    }
}
