/// A non-fatal problem found while normalizing a step payload.
///
/// Malformed JSON-bearing fields and uncoercible scalars degrade to soft
/// failures: the step still succeeds with best-effort output and the caller
/// decides whether to surface the failures or ignore them.
#[derive(Debug, Clone, PartialEq)]
pub struct SoftFailure {
    pub field: &'static str,
    pub reason: String,
}

impl SoftFailure {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Result of one step normalizer: the draft update plus any soft failures
/// encountered while producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome<T> {
    pub update: T,
    pub soft_failures: Vec<SoftFailure>,
}

impl<T> StepOutcome<T> {
    pub fn clean(update: T) -> Self {
        Self {
            update,
            soft_failures: Vec::new(),
        }
    }

    pub fn with_failures(update: T, soft_failures: Vec<SoftFailure>) -> Self {
        Self {
            update,
            soft_failures,
        }
    }
}
