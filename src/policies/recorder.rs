use super::state::BanditState;

use crate::errors::RecorderError;

use tracing::debug;
use uuid::Uuid;

/// Receives every snapshot produced by `Softmax::export_state`.
pub trait StateRecorder: Send {
    fn record(&self, state: &BanditState) -> Result<(), RecorderError>;
}

impl<F> StateRecorder for F
where
    F: Fn(&BanditState) -> Result<(), RecorderError> + Send,
{
    fn record(&self, state: &BanditState) -> Result<(), RecorderError> {
        self(state)
    }
}

pub struct TracingRecorder {
    experiment_id: Uuid,
}

impl TracingRecorder {
    pub fn new(experiment_id: Uuid) -> Self {
        Self { experiment_id }
    }
}

impl StateRecorder for TracingRecorder {
    fn record(&self, state: &BanditState) -> Result<(), RecorderError> {
        debug!(
            target: "softmax::serialize",
            id = %self.experiment_id,
            state = ?state,
            "state"
        );
        Ok(())
    }
}
