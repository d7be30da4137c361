use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct ListExperimentsResponse {
    pub experiment_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateExperimentResponse {
    pub experiment_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DrawResponse {
    pub arm_id: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
