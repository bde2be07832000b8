use actix_web::{HttpResponse, Responder, web};

use crate::sync::SyncContext;

/// List schools from the active sync source
#[utoipa::path(
    get,
    path = "/api/schools",
    responses(
        (status = 200, description = "School directory", body = [School])
    ),
    tag = "Directory"
)]
pub async fn list_schools(ctx: web::Data<SyncContext>) -> actix_web::Result<impl Responder> {
    Ok(HttpResponse::Ok().json(ctx.schools().await))
}
