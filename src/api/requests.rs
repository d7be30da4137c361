use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(super) struct UpdatePayload {
    pub arm_id: usize,
    pub reward: f64,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateBatchPayload {
    pub updates: Vec<UpdatePayload>,
}
