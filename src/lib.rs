pub mod config;
mod extract;
pub mod merge;
pub mod output;
pub mod parser;
pub mod session;
pub mod types;

pub use merge::combine_routine;
pub use parser::parse_dashboard;
pub use session::SessionCollector;

/// Element ids the UCAM portal renders the attendance dashboard with.
/// Shared between the table parser and the browser session.
pub(crate) const COURSE_TABLE_ID: &str = "ctl00_MainContainer_gvCourseList";
pub(crate) const UPDATE_PANEL_ID: &str = "ctl00_MainContainer_UpdatePanel02";
pub(crate) const SEMESTER_SELECT_ID: &str = "ctl00_MainContainer_ddlHeldIn";
