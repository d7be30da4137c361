use super::policy::{ArmStats, BatchUpdateElement, PolicyStats};
use super::recorder::StateRecorder;
use super::rng::{MaybeSeededRng, UniformSource};
use super::state::{check_parameters, BanditState};

use crate::errors::PolicyError;

use std::fmt;
use tracing::warn;

/// Softmax (Boltzmann) action selection over exponentially averaged arm values.
///
/// Arms are drawn with probability proportional to `exp(value / tau)`, and each
/// observed reward moves the arm value toward it with step size `gamma`.
pub struct Softmax<R: UniformSource = MaybeSeededRng> {
    arms: usize,
    gamma: f64,
    tau: f64,
    counts: Vec<u64>,
    values: Vec<f64>,
    rng: R,
    recorder: Option<Box<dyn StateRecorder>>,
}

impl Softmax {
    pub fn new(arms: usize, gamma: f64, tau: f64, seed: Option<u64>) -> Result<Self, PolicyError> {
        Self::with_source(arms, gamma, tau, MaybeSeededRng::new(seed))
    }

    pub fn from_state(state: BanditState, seed: Option<u64>) -> Result<Self, PolicyError> {
        state.validate()?;
        Ok(Self::from_parts(state, MaybeSeededRng::new(seed)))
    }
}

impl<R: UniformSource> Softmax<R> {
    pub fn with_source(arms: usize, gamma: f64, tau: f64, rng: R) -> Result<Self, PolicyError> {
        check_parameters(arms, gamma, tau).map_err(PolicyError::InvalidArgument)?;
        Ok(Self::from_parts(BanditState::zeroed(arms, gamma, tau), rng))
    }

    fn from_parts(state: BanditState, rng: R) -> Self {
        let BanditState {
            arms,
            gamma,
            tau,
            counts,
            values,
        } = state;

        Self {
            arms,
            gamma,
            tau,
            counts,
            values,
            rng,
            recorder: None,
        }
    }

    pub fn with_recorder(mut self, recorder: impl StateRecorder + 'static) -> Self {
        self.recorder = Some(Box::new(recorder));
        self
    }

    pub fn arms(&self) -> usize {
        self.arms
    }

    /// Selection distribution over arms. Falls back to uniform when the
    /// weights cannot be normalized.
    pub fn probabilities(&self) -> Vec<f64> {
        let max = self
            .values
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let weights: Vec<f64> = self
            .values
            .iter()
            .map(|value| ((value - max) / self.tau).exp())
            .collect();
        let total: f64 = weights.iter().sum();

        if !(total.is_finite() && total > 0.0) {
            return vec![1.0 / self.arms as f64; self.arms];
        }

        weights.into_iter().map(|weight| weight / total).collect()
    }

    pub fn select_arm(&mut self) -> usize {
        let draw = self.rng.next_uniform();

        let mut cumulative = 0.0;
        for (arm_id, probability) in self.probabilities().into_iter().enumerate() {
            cumulative += probability;
            if draw < cumulative {
                return arm_id;
            }
        }

        // rounding can leave the cumulative sum just below the draw
        self.arms - 1
    }

    fn check_reward(&self, arm_id: usize, reward: f64) -> Result<(), PolicyError> {
        if arm_id >= self.arms {
            return Err(PolicyError::InvalidArgument(format!(
                "arm {arm_id} out of range for {} arms",
                self.arms
            )));
        }
        if !reward.is_finite() {
            return Err(PolicyError::InvalidArgument(format!(
                "reward {reward} for arm {arm_id} is not finite"
            )));
        }
        Ok(())
    }

    // same as value += gamma * (reward - value), exact when gamma is 1
    fn moving_average(&self, arm_id: usize, value: f64, reward: f64) -> Result<f64, PolicyError> {
        let updated = (1.0 - self.gamma) * value + self.gamma * reward;
        if !updated.is_finite() {
            return Err(PolicyError::InvalidArgument(format!(
                "reward {reward} moves value of arm {arm_id} out of range"
            )));
        }
        Ok(updated)
    }

    pub fn reward(&mut self, arm_id: usize, reward: f64) -> Result<(), PolicyError> {
        self.check_reward(arm_id, reward)?;
        let value = self.moving_average(arm_id, self.values[arm_id], reward)?;

        self.counts[arm_id] += 1;
        self.values[arm_id] = value;

        Ok(())
    }

    /// Applies every update, or none of them if any element is invalid.
    pub fn reward_batch(&mut self, updates: &[BatchUpdateElement]) -> Result<(), PolicyError> {
        let mut counts = self.counts.clone();
        let mut values = self.values.clone();
        updates.iter().try_for_each(|&(arm_id, reward)| -> Result<(), PolicyError> {
            self.check_reward(arm_id, reward)?;
            values[arm_id] = self.moving_average(arm_id, values[arm_id], reward)?;
            counts[arm_id] += 1;
            Ok(())
        })?;

        self.counts = counts;
        self.values = values;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.counts.iter_mut().for_each(|count| *count = 0);
        self.values.iter_mut().for_each(|value| *value = 0.0);
    }

    pub fn stats(&self) -> PolicyStats {
        PolicyStats {
            gamma: self.gamma,
            tau: self.tau,
            arms: self
                .counts
                .iter()
                .zip(&self.values)
                .zip(self.probabilities())
                .map(|((&pulls, &value), probability)| ArmStats {
                    pulls,
                    value,
                    probability,
                })
                .collect(),
        }
    }

    pub fn export_state(&self) -> BanditState {
        let state = BanditState {
            arms: self.arms,
            gamma: self.gamma,
            tau: self.tau,
            counts: self.counts.clone(),
            values: self.values.clone(),
        };

        if let Some(recorder) = &self.recorder {
            if let Err(err) = recorder.record(&state) {
                warn!(error = %err, "Failed to record exported state");
            }
        }

        state
    }

    pub fn restore_state(&mut self, state: BanditState) -> Result<(), PolicyError> {
        state.validate()?;

        let BanditState {
            arms,
            gamma,
            tau,
            counts,
            values,
        } = state;
        self.arms = arms;
        self.gamma = gamma;
        self.tau = tau;
        self.counts = counts;
        self.values = values;

        Ok(())
    }
}

impl<R: UniformSource> fmt::Debug for Softmax<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Softmax")
            .field("arms", &self.arms)
            .field("gamma", &self.gamma)
            .field("tau", &self.tau)
            .field("counts", &self.counts)
            .field("values", &self.values)
            .finish_non_exhaustive()
    }
}
