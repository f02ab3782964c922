//! Output module
//!
//! Console progress lines and the pipeline runner result command.

mod formatter;
mod task;

pub use formatter::{eof_marker, format_parameters, format_report_url, StatusFormatter};
pub use task::report_result;
