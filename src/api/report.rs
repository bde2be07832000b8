use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::stats::{DateRange, LeaveStats, calculate_stats, count_working_days, present_days};
use crate::sync::SyncContext;

#[derive(Deserialize, IntoParams)]
pub struct ReportQuery {
    /// Report period start (inclusive)
    #[param(example = "2024-06-01", value_type = String, format = "date")]
    pub start: NaiveDate,
    /// Report period end (inclusive)
    #[param(example = "2024-06-30", value_type = String, format = "date")]
    pub end: NaiveDate,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    #[schema(example = "t-1001")]
    pub teacher_id: String,
    #[schema(example = "Maria Santos", nullable = true)]
    pub teacher_name: Option<String>,
    #[schema(example = "2024-06-01", value_type = String, format = "date")]
    pub start: NaiveDate,
    #[schema(example = "2024-06-30", value_type = String, format = "date")]
    pub end: NaiveDate,
    #[schema(example = 20)]
    pub working_days: u32,
    /// Working days minus leave days; may legitimately be negative when
    /// recorded leave exceeds the report window.
    #[schema(example = 18)]
    pub present_days: i64,
    pub stats: LeaveStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(nullable = true)]
    pub warning: Option<String>,
}

/// Per-teacher leave report over a date window
#[utoipa::path(
    get,
    path = "/api/report/{teacher_id}",
    params(
        ("teacher_id" = String, Path, description = "Teacher the report covers"),
        ReportQuery
    ),
    responses(
        (status = 200, description = "Leave report for the period", body = ReportResponse),
        (status = 400, description = "Invalid period")
    ),
    tag = "Report"
)]
pub async fn get_report(
    ctx: web::Data<SyncContext>,
    path: web::Path<String>,
    query: web::Query<ReportQuery>,
) -> actix_web::Result<impl Responder> {
    let teacher_id = path.into_inner();

    if query.start > query.end {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "start cannot be after end"
        })));
    }

    let range = DateRange {
        start: query.start,
        end: query.end,
    };
    let records = ctx.leaves().await;
    let stats = calculate_stats(&teacher_id, &records, Some(&range));
    let working_days = count_working_days(query.start, query.end);
    let present = present_days(working_days, &stats);

    let teacher_name = ctx
        .teachers()
        .await
        .into_iter()
        .find(|t| t.id == teacher_id)
        .map(|t| t.name);

    let warning = (present < 0).then(|| {
        "Recorded leave days exceed the working days in this period".to_string()
    });

    Ok(HttpResponse::Ok().json(ReportResponse {
        teacher_id,
        teacher_name,
        start: query.start,
        end: query.end,
        working_days,
        present_days: present,
        stats,
        warning,
    }))
}
