//! Verification engine
//!
//! A light re-crawl of the live site followed by a field-level diff against
//! the captured page JSON.

mod diff;
mod live;

pub use diff::{
    compare_live_to_capture, ComparedFields, DiffDetail, DiffStatus, MismatchReport,
    ReportSummary,
};
pub use live::{verify_worker, VerificationItem, VerifyContext};
