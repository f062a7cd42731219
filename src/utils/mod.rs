pub mod clock;
pub mod display;
pub mod report_cache;
