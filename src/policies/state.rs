use crate::errors::PolicyError;

use serde::{Deserialize, Serialize};

/// Flat snapshot of a softmax engine, suitable for persistence or transfer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BanditState {
    pub arms: usize,
    pub gamma: f64,
    pub tau: f64,
    pub counts: Vec<u64>,
    pub values: Vec<f64>,
}

/// Checks the scalar parameters shared by construction and restore.
pub(super) fn check_parameters(arms: usize, gamma: f64, tau: f64) -> Result<(), String> {
    if arms == 0 {
        return Err("arms must be positive".to_string());
    }
    if !(gamma.is_finite() && gamma > 0.0 && gamma <= 1.0) {
        return Err(format!("gamma must be in (0, 1], got {gamma}"));
    }
    if !(tau.is_finite() && tau > 0.0) {
        return Err(format!("tau must be positive, got {tau}"));
    }
    Ok(())
}

impl BanditState {
    pub fn zeroed(arms: usize, gamma: f64, tau: f64) -> Self {
        Self {
            arms,
            gamma,
            tau,
            counts: vec![0; arms],
            values: vec![0.0; arms],
        }
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        check_parameters(self.arms, self.gamma, self.tau).map_err(PolicyError::InvalidState)?;

        if self.counts.len() != self.arms {
            return Err(PolicyError::InvalidState(format!(
                "expected {} counts, got {}",
                self.arms,
                self.counts.len()
            )));
        }
        if self.values.len() != self.arms {
            return Err(PolicyError::InvalidState(format!(
                "expected {} values, got {}",
                self.arms,
                self.values.len()
            )));
        }
        if let Some(arm_id) = self.values.iter().position(|value| !value.is_finite()) {
            return Err(PolicyError::InvalidState(format!(
                "value of arm {arm_id} is not finite"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_state() -> BanditState {
        BanditState {
            arms: 2,
            gamma: 0.5,
            tau: 1.0,
            counts: vec![3, 1],
            values: vec![0.25, 0.75],
        }
    }

    #[test]
    fn valid_state() {
        assert!(make_state().validate().is_ok());
    }

    #[test]
    fn length_mismatch() {
        let mut state = make_state();
        state.counts.push(0);
        assert!(matches!(state.validate(), Err(PolicyError::InvalidState(_))));

        let mut state = make_state();
        state.values.pop();
        assert!(matches!(state.validate(), Err(PolicyError::InvalidState(_))));
    }

    #[test]
    fn bad_parameters() {
        for (gamma, tau) in [(0.0, 1.0), (1.5, 1.0), (0.5, 0.0), (0.5, -2.0), (f64::NAN, 1.0)] {
            let state = BanditState {
                gamma,
                tau,
                ..make_state()
            };
            assert!(state.validate().is_err(), "gamma={gamma} tau={tau}");
        }
    }

    #[test]
    fn zero_arms() {
        let state = BanditState::zeroed(0, 0.5, 1.0);
        assert!(state.validate().is_err());
    }

    #[test]
    fn non_finite_value() {
        let mut state = make_state();
        state.values[1] = f64::INFINITY;
        assert!(state.validate().is_err());
    }

    #[test]
    fn json_shape() {
        let state = BanditState::zeroed(2, 0.5, 1.0);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "arms": 2,
                "gamma": 0.5,
                "tau": 1.0,
                "counts": [0, 0],
                "values": [0.0, 0.0],
            })
        );
    }

    #[test]
    fn negative_counts_rejected_by_serde() {
        let raw = r#"{"arms":1,"gamma":0.5,"tau":1.0,"counts":[-1],"values":[0.0]}"#;
        assert!(serde_json::from_str::<BanditState>(raw).is_err());
    }
}
