pub mod attendance;
pub mod board;
pub mod report;
pub mod roster;

pub use attendance::{AttendancePolicy, AttendanceService};
pub use board::BoardService;
pub use report::{Period, ReportService};
pub use roster::RosterService;
