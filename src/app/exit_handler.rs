//! Exit code logic for a finished download.
//!
//! Single responsibility: map the job outcome to the process exit outcome.

use clipfetch_core::JobOutcome;

use crate::ProcessExit;

pub(crate) fn determine_exit_outcome(outcome: &JobOutcome) -> ProcessExit {
    match outcome {
        JobOutcome::Completed {
            transfer_error: None,
            ..
        } => ProcessExit::Success,
        JobOutcome::Completed { .. } => ProcessExit::Partial,
        JobOutcome::Cancelled => ProcessExit::Failure,
    }
}
