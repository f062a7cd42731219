pub mod admin_log;
pub mod announcement;
pub mod attendance;
pub mod employee;
pub mod role;
pub mod summary;
