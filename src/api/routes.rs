use tokio::sync::RwLock;

use super::errors::ApiResponseError;
use super::requests::{UpdateBatchPayload, UpdatePayload};
use super::responses::{CreateExperimentResponse, DrawResponse, ListExperimentsResponse};
use crate::policies::{BanditState, PolicyType};
use crate::repository::Repository;

use actix_web::{
    delete, get, post, put,
    web::{Data, Json, Path, ServiceConfig},
    HttpResponse, Responder, Result,
};
use uuid::Uuid;

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(ping)
        .service(list)
        .service(clear)
        .service(create)
        .service(ping_experiment)
        .service(delete_experiment)
        .service(reset)
        .service(draw)
        .service(update)
        .service(update_batch)
        .service(stats)
        .service(export_state)
        .service(restore_state);
}

fn parse_experiment_id(path: Path<String>) -> Result<Uuid, ApiResponseError> {
    Uuid::try_parse(&path.into_inner()).map_err(ApiResponseError::from)
}

#[get("/ping")]
async fn ping() -> Result<impl Responder> {
    Ok(HttpResponse::Ok().finish())
}

#[get("/list")]
async fn list(repository: Data<RwLock<Repository>>) -> Result<impl Responder> {
    let experiment_ids = repository.read().await.list_experiments();

    Ok(Json(ListExperimentsResponse { experiment_ids }))
}

#[delete("/clear")]
async fn clear(repository: Data<RwLock<Repository>>) -> Result<impl Responder> {
    repository.write().await.clear();

    Ok(HttpResponse::Ok())
}

#[post("/create")]
async fn create(
    repository: Data<RwLock<Repository>>,
    policy_type: Json<PolicyType>,
) -> Result<impl Responder> {
    let experiment_id = repository
        .write()
        .await
        .create_experiment_from_type(policy_type.into_inner())
        .map_err(ApiResponseError::from)?;

    Ok(Json(CreateExperimentResponse { experiment_id }))
}

#[get("/{experiment_id}/ping")]
async fn ping_experiment(
    repository: Data<RwLock<Repository>>,
    path: Path<String>,
) -> Result<impl Responder> {
    let experiment_id = parse_experiment_id(path)?;
    repository
        .read()
        .await
        .ping_experiment(experiment_id)
        .await
        .map_err(ApiResponseError::from)?;

    Ok(HttpResponse::Ok())
}

#[delete("/{experiment_id}/delete")]
async fn delete_experiment(
    repository: Data<RwLock<Repository>>,
    path: Path<String>,
) -> Result<impl Responder> {
    let experiment_id = parse_experiment_id(path)?;
    repository
        .write()
        .await
        .delete_experiment(experiment_id)
        .map_err(ApiResponseError::from)?;

    Ok(HttpResponse::Ok())
}

#[put("/{experiment_id}/reset")]
async fn reset(repository: Data<RwLock<Repository>>, path: Path<String>) -> Result<impl Responder> {
    let experiment_id = parse_experiment_id(path)?;
    repository
        .read()
        .await
        .reset_experiment(experiment_id)
        .await
        .map_err(ApiResponseError::from)?;

    Ok(HttpResponse::Ok())
}

#[get("/{experiment_id}/draw")]
async fn draw(repository: Data<RwLock<Repository>>, path: Path<String>) -> Result<impl Responder> {
    let experiment_id = parse_experiment_id(path)?;
    let arm_id = repository
        .read()
        .await
        .draw_experiment(experiment_id)
        .await
        .map_err(ApiResponseError::from)?;

    Ok(Json(DrawResponse { arm_id }))
}

#[put("/{experiment_id}/update")]
async fn update(
    repository: Data<RwLock<Repository>>,
    path: Path<String>,
    payload: Json<UpdatePayload>,
) -> Result<impl Responder> {
    let experiment_id = parse_experiment_id(path)?;
    let UpdatePayload { arm_id, reward } = payload.into_inner();
    repository
        .read()
        .await
        .update_experiment(experiment_id, arm_id, reward)
        .await
        .map_err(ApiResponseError::from)?;

    Ok(HttpResponse::Ok())
}

#[put("/{experiment_id}/update_batch")]
async fn update_batch(
    repository: Data<RwLock<Repository>>,
    path: Path<String>,
    payload: Json<UpdateBatchPayload>,
) -> Result<impl Responder> {
    let experiment_id = parse_experiment_id(path)?;
    let updates = payload
        .into_inner()
        .updates
        .iter()
        .map(|u| (u.arm_id, u.reward))
        .collect();

    repository
        .read()
        .await
        .batch_update_experiment(experiment_id, updates)
        .await
        .map_err(ApiResponseError::from)?;

    Ok(HttpResponse::Ok())
}

#[get("/{experiment_id}/stats")]
async fn stats(repository: Data<RwLock<Repository>>, path: Path<String>) -> Result<impl Responder> {
    let experiment_id = parse_experiment_id(path)?;
    let stats = repository
        .read()
        .await
        .get_experiment_stats(experiment_id)
        .await
        .map_err(ApiResponseError::from)?;

    Ok(Json(stats))
}

#[get("/{experiment_id}/state")]
async fn export_state(
    repository: Data<RwLock<Repository>>,
    path: Path<String>,
) -> Result<impl Responder> {
    let experiment_id = parse_experiment_id(path)?;
    let state = repository
        .read()
        .await
        .export_experiment(experiment_id)
        .await
        .map_err(ApiResponseError::from)?;

    Ok(Json(state))
}

#[put("/{experiment_id}/state")]
async fn restore_state(
    repository: Data<RwLock<Repository>>,
    path: Path<String>,
    state: Json<BanditState>,
) -> Result<impl Responder> {
    let experiment_id = parse_experiment_id(path)?;
    repository
        .read()
        .await
        .restore_experiment(experiment_id, state.into_inner())
        .await
        .map_err(ApiResponseError::from)?;

    Ok(HttpResponse::Ok())
}
