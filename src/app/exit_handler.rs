//! Exit code logic for the tnm-download process.
//!
//! Single responsibility: map a download report to the process exit outcome.

use tnm_core::DownloadReport;

use crate::ProcessExit;

/// Success only when every selected download completed and nothing was interrupted.
pub(crate) fn determine_exit_outcome(report: &DownloadReport) -> ProcessExit {
    if report.is_success() {
        ProcessExit::Success
    } else {
        ProcessExit::Failure
    }
}
