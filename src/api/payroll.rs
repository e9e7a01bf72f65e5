use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::engine::batch::BatchOrchestrator;
use crate::engine::error::EngineError;
use crate::engine::store::{MySqlStore, PayrollStore};
use crate::model::payroll_batch::PayrollBatch;
use crate::model::payroll_record::PayrollRecord;

#[derive(Deserialize, ToSchema)]
pub struct CalculateBatch {
    #[schema(example = 2026)]
    pub year: i32,

    #[schema(example = 7)]
    pub month: u32,

    /// Date used for age-dependent rules; defaults to today
    #[schema(example = "2026-07-25", value_type = String, format = "date", nullable = true)]
    pub evaluation_date: Option<NaiveDate>,
}

/// Run (or re-run) the payroll calculation for a period
#[utoipa::path(
    post,
    path = "/api/v1/payroll/calculate",
    request_body = CalculateBatch,
    responses(
        (status = 200, description = "Payroll calculated", body = PayrollBatch),
        (status = 400, description = "No active employees or invalid period"),
        (status = 409, description = "Batch already approved or paid"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn calculate_batch(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CalculateBatch>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let evaluation_date = payload
        .evaluation_date
        .unwrap_or_else(|| Utc::now().date_naive());

    let orchestrator = BatchOrchestrator::new(MySqlStore::new(pool.get_ref().clone()));
    let batch = orchestrator
        .calculate(payload.year, payload.month, evaluation_date)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Payroll calculated successfully",
        "batch": batch
    })))
}

/// List payroll batches, newest first
#[utoipa::path(
    get,
    path = "/api/v1/payroll/batches",
    responses(
        (status = 200, description = "All payroll batches", body = [PayrollBatch])
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn list_batches(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let store = MySqlStore::new(pool.get_ref().clone());
    let batches = store.list_batches().await?;

    Ok(HttpResponse::Ok().json(batches))
}

/// Records belonging to one batch
#[utoipa::path(
    get,
    path = "/api/v1/payroll/batches/{batch_id}",
    params(
        ("batch_id", Path, description = "Batch ID, e.g. 2026-07")
    ),
    responses(
        (status = 200, description = "Records of the batch", body = [PayrollRecord]),
        (status = 404, description = "Batch not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn get_batch_records(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let batch_id = path.into_inner();
    let store = MySqlStore::new(pool.get_ref().clone());

    if store.find_batch(&batch_id).await?.is_none() {
        return Err(EngineError::NotFound {
            entity: "payroll batch",
            id: batch_id,
        }
        .into());
    }

    let records = store.batch_records(&batch_id).await?;

    Ok(HttpResponse::Ok().json(records))
}

/// Approve a calculated batch
#[utoipa::path(
    put,
    path = "/api/v1/payroll/batches/{batch_id}/approve",
    params(
        ("batch_id", Path, description = "Batch ID, e.g. 2026-07")
    ),
    responses(
        (status = 200, description = "Batch approved", body = PayrollBatch),
        (status = 404, description = "Batch not found"),
        (status = 409, description = "Batch is not awaiting approval")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn approve_batch(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let batch_id = path.into_inner();

    let orchestrator = BatchOrchestrator::new(MySqlStore::new(pool.get_ref().clone()));
    let batch = orchestrator.approve(&batch_id).await?;

    Ok(HttpResponse::Ok().json(batch))
}
