use rand::{rngs::SmallRng, Rng, SeedableRng};

/// Source of uniform samples in `[0, 1)` consumed by arm selection.
pub trait UniformSource {
    fn next_uniform(&mut self) -> f64;
}

#[derive(Clone, Debug)]
pub struct MaybeSeededRng {
    rng: SmallRng,
}

impl MaybeSeededRng {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = if let Some(seed) = seed {
            SmallRng::seed_from_u64(seed)
        } else {
            SmallRng::from_os_rng()
        };

        Self { rng }
    }
}

impl UniformSource for MaybeSeededRng {
    fn next_uniform(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_is_reproducible() {
        let mut a = MaybeSeededRng::new(Some(1234));
        let mut b = MaybeSeededRng::new(Some(1234));

        let xs: Vec<f64> = (0..16).map(|_| a.next_uniform()).collect();
        let ys: Vec<f64> = (0..16).map(|_| b.next_uniform()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn samples_in_unit_interval() {
        let mut rng = MaybeSeededRng::new(None);
        assert!((0..1000)
            .map(|_| rng.next_uniform())
            .all(|u| (0.0..1.0).contains(&u)));
    }
}
