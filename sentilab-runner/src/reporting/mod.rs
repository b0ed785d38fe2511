//! Text output: stdout summary tables and the insights report file.

mod insights_report;
mod summary;

pub use insights_report::{render_report, top_insights, write_report, REPORT_TITLE};
pub use summary::{aggregate_summary, merge_summary, significance_block};
