use actix_web::{HttpResponse, Responder, web};

use crate::sync::SyncContext;

/// List the teacher directory from the active sync source
#[utoipa::path(
    get,
    path = "/api/teachers",
    responses(
        (status = 200, description = "Teacher directory", body = [Teacher])
    ),
    tag = "Directory"
)]
pub async fn list_teachers(ctx: web::Data<SyncContext>) -> actix_web::Result<impl Responder> {
    Ok(HttpResponse::Ok().json(ctx.teachers().await))
}

/// Fetch one teacher profile
#[utoipa::path(
    get,
    path = "/api/teachers/{teacher_id}",
    params(
        ("teacher_id" = String, Path, description = "Teacher to fetch")
    ),
    responses(
        (status = 200, description = "Teacher profile", body = Teacher),
        (status = 404, description = "Teacher not found", body = Object, example = json!({
            "message": "Teacher not found"
        }))
    ),
    tag = "Directory"
)]
pub async fn get_teacher(
    ctx: web::Data<SyncContext>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let teacher_id = path.into_inner();
    let teacher = ctx
        .teachers()
        .await
        .into_iter()
        .find(|t| t.id == teacher_id);

    match teacher {
        Some(teacher) => Ok(HttpResponse::Ok().json(teacher)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Teacher not found"
        }))),
    }
}
