pub mod leave_request;
pub mod report;
pub mod school;
pub mod sync_status;
pub mod teacher;
