use crate::api::leave_request::{CreateLeave, LeaveFilter, LeaveListResponse};
use crate::api::report::ReportResponse;
use crate::model::leave_record::{LeaveRecord, LeaveStatus, LeaveType};
use crate::model::school::School;
use crate::model::teacher::Teacher;
use crate::stats::LeaveStats;
use crate::sync::{SyncSource, SyncStatus, TierState, TierStates};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "School Administration API",
        version = "1.0.0",
        description = r#"
## School Administration System

This API powers a school administration backend for teachers and directors.

### 🔹 Key Features
- **Leave Management**
  - Submit leave requests, approve/reject as director, and list leave history
- **Leave Reports**
  - Per-teacher working-day, present-day and per-type leave statistics
- **Directory**
  - Teacher and school records from the active sync source
- **Sync**
  - Three-tier backend fallback (SQL → Firestore → local seed data), with
    the active source visible for display

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for the leave list

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::leave_request::leave_list,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,

        crate::api::report::get_report,

        crate::api::teacher::list_teachers,
        crate::api::teacher::get_teacher,
        crate::api::school::list_schools,

        crate::api::sync_status::get_sync_status
    ),
    components(
        schemas(
            LeaveRecord,
            LeaveType,
            LeaveStatus,
            CreateLeave,
            LeaveFilter,
            LeaveListResponse,
            ReportResponse,
            LeaveStats,
            Teacher,
            School,
            SyncStatus,
            SyncSource,
            TierState,
            TierStates
        )
    ),
    tags(
        (name = "Leave", description = "Leave management APIs"),
        (name = "Report", description = "Leave accounting reports"),
        (name = "Directory", description = "Teacher and school directory APIs"),
        (name = "Sync", description = "Backend sync state"),
    )
)]
pub struct ApiDoc;
