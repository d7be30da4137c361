use super::responses::ErrorResponse;

use crate::errors::{RepositoryError, ServiceError};

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiResponseError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    BadUuid(#[from] uuid::Error),
}

impl ResponseError for ApiResponseError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
        })
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiResponseError::Service(ServiceError::Repository(
                RepositoryError::ExperimentNotFound(_),
            )) => StatusCode::NOT_FOUND,
            ApiResponseError::Service(ServiceError::Policy(_)) => StatusCode::BAD_REQUEST,
            ApiResponseError::Service(ServiceError::Mailbox { .. })
            | ApiResponseError::Service(ServiceError::Persistence(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiResponseError::BadUuid(_) => StatusCode::BAD_REQUEST,
        }
    }
}
