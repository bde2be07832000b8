use actix_web::{HttpResponse, Responder, web};

use crate::sync::SyncContext;

/// Active sync source and per-tier states, for display
#[utoipa::path(
    get,
    path = "/api/sync/status",
    responses(
        (status = 200, description = "Sync state of this process", body = SyncStatus)
    ),
    tag = "Sync"
)]
pub async fn get_sync_status(ctx: web::Data<SyncContext>) -> actix_web::Result<impl Responder> {
    Ok(HttpResponse::Ok().json(ctx.status()))
}
