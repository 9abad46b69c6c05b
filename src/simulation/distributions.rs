// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Sampling approximations for the synthetic metric generator
//!
//! Every sampler takes the RNG explicitly so a seeded `StdRng` replays the
//! same sequence.

use rand::Rng;
use std::f64::consts::PI;

/// Standard normal sample via the Box-Muller transform
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // u1 must be > 0 for the logarithm
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// Normal sample with the given mean and standard deviation
pub fn normal<R: Rng + ?Sized>(rng: &mut R, mean: f64, std_dev: f64) -> f64 {
    mean + std_dev * standard_normal(rng)
}

/// Log-normal sample; `mu` and `sigma` describe the underlying normal
pub fn log_normal<R: Rng + ?Sized>(rng: &mut R, mu: f64, sigma: f64) -> f64 {
    normal(rng, mu, sigma).exp()
}

/// Log-normal sample parameterised by its median
pub fn log_normal_median<R: Rng + ?Sized>(rng: &mut R, median: f64, sigma: f64) -> f64 {
    log_normal(rng, median.max(f64::MIN_POSITIVE).ln(), sigma)
}

/// Gamma sample (Marsaglia-Tsang), mean `shape * scale`
///
/// Shapes below one use the `U^(1/shape)` boost. Non-positive shapes yield 0.
pub fn gamma<R: Rng + ?Sized>(rng: &mut R, shape: f64, scale: f64) -> f64 {
    if shape <= 0.0 || scale <= 0.0 {
        return 0.0;
    }
    if shape < 1.0 {
        let u: f64 = rng.gen_range(f64::EPSILON..1.0);
        return gamma(rng, shape + 1.0, scale) * u.powf(1.0 / shape);
    }

    let d = shape - 1.0 / 3.0;
    let c = 1.0 / (9.0 * d).sqrt();
    loop {
        let x = standard_normal(rng);
        let v = 1.0 + c * x;
        if v <= 0.0 {
            continue;
        }
        let v = v * v * v;
        let u: f64 = rng.gen_range(f64::EPSILON..1.0);
        if u.ln() < 0.5 * x * x + d - d * v + d * v.ln() {
            return d * v * scale;
        }
    }
}

/// Clamp into `[0, 1]`
#[must_use]
pub fn clamp_unit(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}
