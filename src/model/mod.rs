pub mod leave_record;
pub mod school;
pub mod teacher;
