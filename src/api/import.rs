use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::info;

use crate::auth::auth::AuthUser;
use crate::engine::reconcile::{self, ImportReconciler};
use crate::engine::store::MySqlStore;

/// Bulk employee import
///
/// Accepts a headered CSV body with the columns id, name, date_of_birth,
/// email, department, position, base_salary, dependents, municipality and
/// join_date, in any order. The whole file is applied as one transaction;
/// a single invalid row rejects the upload.
#[utoipa::path(
    post,
    path = "/api/v1/employees/bulk",
    request_body(content = String, content_type = "text/csv"),
    responses(
        (status = 200, description = "Import committed", body = Object, example = json!({
            "message": "Bulk update completed successfully",
            "new": 3,
            "updated": 1,
            "unchanged": 6
        })),
        (status = 400, description = "Empty upload or invalid row"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn bulk_import(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    body: web::Bytes,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let rows = reconcile::parse(body.as_ref())?;
    if rows.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "No rows in uploaded file"
        })));
    }

    info!(rows = rows.len(), "Bulk import received");

    let reconciler = ImportReconciler::new(MySqlStore::new(pool.get_ref().clone()));
    let outcome = reconciler.commit(&rows).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Bulk update completed successfully",
        "new": outcome.new,
        "updated": outcome.updated,
        "unchanged": outcome.unchanged
    })))
}
