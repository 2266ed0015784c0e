use rand::{Rng, RngCore};

/// Scale applied to a site's mean service time for one truck.
pub trait ServiceSampler {
    fn factor(&mut self) -> f64;

    /// Mean factor over `trucks` draws, 1.0 when there is nothing to draw.
    fn mean_factor(&mut self, trucks: u32) -> f64 {
        if trucks == 0 {
            return 1.0;
        }
        (0..trucks).map(|_| self.factor()).sum::<f64>() / f64::from(trucks)
    }
}

pub struct FixedService;

impl ServiceSampler for FixedService {
    fn factor(&mut self) -> f64 {
        1.0
    }
}

pub struct PerturbedService<R: RngCore> {
    rng: R,
    coefficient: f64,
}

impl<R: RngCore> PerturbedService<R> {
    pub fn new(rng: R, coefficient: f64) -> Self {
        PerturbedService { rng, coefficient }
    }
}

impl<R: RngCore> ServiceSampler for PerturbedService<R> {
    fn factor(&mut self) -> f64 {
        let unit: f64 = self.rng.random();
        1.0 + self.coefficient * (2.0 * unit - 1.0)
    }
}

/// Seed of the random stream used for one site, so sites stay independent
/// of evaluation order.
pub(crate) fn site_stream_seed(seed: u64, site: usize) -> u64 {
    seed ^ (site as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}
