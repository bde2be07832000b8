use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::model::leave_record::{LeaveRecord, LeaveStatus, LeaveType};
use crate::sync::error::SyncError;
use crate::sync::{SyncContext, WriteOutcome};

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeave {
    #[schema(example = "t-1001")]
    pub teacher_id: String,
    #[schema(example = "Maria Santos")]
    pub teacher_name: String,
    #[serde(rename = "type")]
    #[schema(example = "sick")]
    pub leave_type: LeaveType,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "08:30:00", value_type = String, nullable = true)]
    pub start_time: Option<NaiveTime>,
    #[schema(example = "11:00:00", value_type = String, nullable = true)]
    pub end_time: Option<NaiveTime>,
    #[schema(example = "Flu, doctor's note attached")]
    pub reason: String,
    #[serde(rename = "signatureBase64")]
    #[schema(value_type = String, nullable = true)]
    pub teacher_signature: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    #[schema(example = "t-1001")]
    /// Filter by teacher ID
    pub teacher_id: Option<String>,
    #[schema(example = "pending")]
    /// Filter by leave status
    pub status: Option<String>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<usize>, // 1-based
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<usize>, // items per page
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRecord>,
    #[schema(example = 1)]
    pub page: usize,
    #[schema(example = 10)]
    pub per_page: usize,
    #[schema(example = 1)]
    pub total: usize,
}

/// Off-campus records carry both times, late records only a start time, and
/// the day-based types carry none.
fn validate_time_shape(
    leave_type: LeaveType,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
) -> Result<(), &'static str> {
    match leave_type {
        LeaveType::OffCampus => {
            if start_time.is_none() || end_time.is_none() {
                return Err("Off-campus leave requires both startTime and endTime");
            }
        }
        LeaveType::Late => {
            if start_time.is_none() {
                return Err("Late arrival requires startTime");
            }
            if end_time.is_some() {
                return Err("Late arrival must not carry endTime");
            }
        }
        LeaveType::Sick | LeaveType::Personal => {
            if start_time.is_some() || end_time.is_some() {
                return Err("Day-based leave must not carry startTime or endTime");
            }
        }
    }
    Ok(())
}

/// `page` is 1-based and comes straight off the query string, so the offset
/// saturates instead of trusting the client not to overflow it.
fn page_offset(page: usize, per_page: usize) -> usize {
    (page - 1).saturating_mul(per_page)
}

fn submit_message(outcome: WriteOutcome) -> &'static str {
    match outcome {
        WriteOutcome::Remote => "Leave request saved to database",
        WriteOutcome::LocalFallback => "Leave request saved offline",
    }
}

/* =========================
Create leave request
========================= */
/// Swagger doc for create_leave endpoint
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave request accepted",
         body = Object,
         example = json!({
            "message": "Leave request saved to database",
            "status": "pending",
            "id": "a3f1c9e2-5b77-4d10-9f43-0c2d8e6b1a55"
         })
        ),
        (status = 400, description = "Bad request")
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    ctx: web::Data<SyncContext>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    // 1. validate dates
    if payload.start_date > payload.end_date {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "startDate cannot be after endDate"
        })));
    }

    // 2. validate time fields against the leave type
    if let Err(message) =
        validate_time_shape(payload.leave_type, payload.start_time, payload.end_time)
    {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": message
        })));
    }

    // 3. persist through the write fallback chain; never fails user-visibly
    let payload = payload.into_inner();
    let record = LeaveRecord {
        id: Uuid::new_v4().to_string(),
        teacher_id: payload.teacher_id,
        teacher_name: payload.teacher_name,
        leave_type: payload.leave_type,
        start_date: payload.start_date,
        end_date: payload.end_date,
        start_time: payload.start_time,
        end_time: payload.end_time,
        reason: payload.reason,
        status: LeaveStatus::Pending,
        teacher_signature: payload.teacher_signature,
        director_signature: None,
        approved_date: None,
        created_at: Utc::now(),
    };
    let id = record.id.clone();
    let outcome = ctx.submit_leave(record).await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": submit_message(outcome),
        "status": "pending",
        "id": id
    })))
}

/* =========================
Approve leave (director)
========================= */
/// Swagger doc for approve_leave endpoint
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(
        ("leave_id" = String, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved", body = Object, example = json!({
            "message": "Leave approved"
        })),
        (status = 400, description = "Leave request not found or already processed", body = Object, example = json!({
            "message": "Leave request not found or already processed"
        }))
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    ctx: web::Data<SyncContext>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    decide(ctx, path.into_inner(), LeaveStatus::Approved).await
}

/* =========================
Reject leave (director)
========================= */
/// Swagger doc for reject_leave endpoint
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(
        ("leave_id" = String, Path, description = "ID of the leave request to reject")
    ),
    responses(
        (status = 200, description = "Leave rejected", body = Object, example = json!({
            "message": "Leave rejected"
        })),
        (status = 400, description = "Leave request not found or already processed", body = Object, example = json!({
            "message": "Leave request not found or already processed"
        }))
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    ctx: web::Data<SyncContext>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    decide(ctx, path.into_inner(), LeaveStatus::Rejected).await
}

async fn decide(
    ctx: web::Data<SyncContext>,
    leave_id: String,
    status: LeaveStatus,
) -> actix_web::Result<HttpResponse> {
    match ctx.decide_leave(&leave_id, status).await {
        Ok(outcome) => {
            let verdict = match status {
                LeaveStatus::Approved => "Leave approved",
                _ => "Leave rejected",
            };
            let message = match outcome {
                WriteOutcome::Remote => verdict.to_string(),
                WriteOutcome::LocalFallback => format!("{verdict} (saved offline)"),
            };
            Ok(HttpResponse::Ok().json(serde_json::json!({ "message": message })))
        }
        Err(SyncError::NotFound(_)) => Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Leave request not found or already processed"
        }))),
        Err(e) => {
            tracing::error!(error = %e, leave_id, "Leave decision failed");
            Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ))
        }
    }
}

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse)
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    ctx: web::Data<SyncContext>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);

    let status_filter = match query.status.as_deref() {
        Some(raw) => match raw.parse::<LeaveStatus>() {
            Ok(status) => Some(status),
            Err(_) => {
                return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                    "message": "Invalid status. Allowed: pending, approved, rejected"
                })));
            }
        },
        None => None,
    };

    let mut records: Vec<LeaveRecord> = ctx
        .leaves()
        .await
        .into_iter()
        .filter(|r| {
            query
                .teacher_id
                .as_deref()
                .is_none_or(|id| r.teacher_id == id)
        })
        .filter(|r| status_filter.is_none_or(|s| r.status == s))
        .collect();
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let total = records.len();
    let data: Vec<LeaveRecord> = records
        .into_iter()
        .skip(page_offset(page, per_page))
        .take(per_page)
        .collect();

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> Option<NaiveTime> {
        Some(s.parse().unwrap())
    }

    #[test]
    fn time_shape_rules() {
        assert!(validate_time_shape(LeaveType::Sick, None, None).is_ok());
        assert!(validate_time_shape(LeaveType::Sick, t("08:00:00"), None).is_err());
        assert!(validate_time_shape(LeaveType::OffCampus, t("08:00:00"), t("11:00:00")).is_ok());
        assert!(validate_time_shape(LeaveType::OffCampus, t("08:00:00"), None).is_err());
        assert!(validate_time_shape(LeaveType::Late, t("09:15:00"), None).is_ok());
        assert!(validate_time_shape(LeaveType::Late, t("09:15:00"), t("10:00:00")).is_err());
        assert!(validate_time_shape(LeaveType::Late, None, None).is_err());
    }

    #[test]
    fn page_offset_survives_hostile_page_numbers() {
        assert_eq!(page_offset(1, 10), 0);
        assert_eq!(page_offset(3, 10), 20);
        assert_eq!(page_offset(usize::MAX, 100), usize::MAX);
    }
}
