use super::softmax::Softmax;

use crate::errors::PolicyError;

use serde::{Deserialize, Serialize};

pub type BatchUpdateElement = (usize, f64);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArmStats {
    pub pulls: u64,
    pub value: f64,
    pub probability: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PolicyStats {
    pub gamma: f64,
    pub tau: f64,
    pub arms: Vec<ArmStats>,
}

#[derive(Debug, Deserialize, Serialize)]
pub enum PolicyType {
    Softmax {
        arms: usize,
        gamma: f64,
        tau: f64,
        seed: Option<u64>,
    },
}

impl PolicyType {
    pub fn into_inner(self) -> Result<Softmax, PolicyError> {
        match self {
            PolicyType::Softmax {
                arms,
                gamma,
                tau,
                seed,
            } => Softmax::new(arms, gamma, tau, seed),
        }
    }
}
