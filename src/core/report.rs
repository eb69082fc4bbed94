use crate::domain::model::{BatchStatus, OrderTagOutcome, OutcomeStatus, TagBatchReport};

/// Fold per-order outcomes into the batch-level verdict. Any failed
/// outcome makes the whole batch a partial failure; the batch message is
/// the message of the LAST failure in input order, matching the behavior
/// callers already depend on.
pub fn summarize(outcomes: Vec<OrderTagOutcome>) -> TagBatchReport {
    let overall = match outcomes
        .iter()
        .rev()
        .find(|outcome| outcome.status == OutcomeStatus::Failed)
    {
        Some(last_failed) => BatchStatus::PartialFailure {
            message: last_failed
                .error_message
                .clone()
                .unwrap_or_else(|| "Tag update failed".to_string()),
        },
        None => BatchStatus::Success,
    };

    TagBatchReport { outcomes, overall }
}
