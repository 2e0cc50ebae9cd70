mod arrival;
mod rate;
mod trust_ratio;

use rand_core::Rng;

pub(crate) use self::arrival::Pacing;
pub use self::{
    arrival::Arrival,
    rate::{Rate, RateError},
    trust_ratio::{ADMISSION_CYCLE, TrustRatio, TrustRatioError, TrustRatioParseError},
};

/// draw a uniform sample in `[0, 1)` from `rng`
pub(crate) fn unit_sample<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    (rng.next_u64() as f64) * (1.0 / (u64::MAX as f64 + 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaChaRng;
    use rand_core::SeedableRng as _;

    #[test]
    fn unit_sample_range() {
        let mut rng = ChaChaRng::seed_from_u64(0);
        let samples: Vec<f64> = (0..1_000).map(|_| unit_sample(&mut rng)).collect();

        assert!(samples.iter().all(|s| (0.0..1.0).contains(s)));
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        assert!((0.45..0.55).contains(&mean), "mean was {mean}");
    }
}
