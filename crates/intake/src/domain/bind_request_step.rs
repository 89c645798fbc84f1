use crate::domain::outcome::{SoftFailure, StepOutcome};
use common::ApplicationDraft;
use serde::Deserialize;
use serde_json::Value;

/// Raw bind-request payload.
///
/// This step comes from the quote front end, which posts camelCase keys and
/// boolean flags as the literal strings "true" / "false".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BindRequestStepPayload {
    #[serde(default)]
    pub quotes: Option<String>,
    #[serde(default, rename = "additionalInsured")]
    pub additional_insured: Option<Value>,
    #[serde(default, rename = "waiverOfSubrogation")]
    pub waiver_of_subrogation: Option<Value>,
}

/// Fully normalized bind-request fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindRequestStepUpdate {
    pub quotes: Option<Value>,
    pub additional_insured: bool,
    pub waiver_subrogation: bool,
}

impl BindRequestStepUpdate {
    pub fn apply_to(self, draft: &mut ApplicationDraft) {
        draft.additional_insured = Some(self.additional_insured);
        draft.waiver_subrogation = Some(self.waiver_subrogation);
        if let Some(quotes) = self.quotes {
            draft.quotes = Some(quotes);
        }
    }
}

/// Normalize the bind-request step.
///
/// `quotes` is parsed from its JSON-encoded string when present; a parse
/// failure keeps the original string and reports a soft failure. The two
/// flags are true only for the literal string "true"; any other value,
/// including a real boolean, is false, matching what the quote front end
/// submits. `waiverOfSubrogation` is renamed to `waiver_subrogation` and the
/// source field does not survive the step.
pub fn normalize_bind_request_step(
    payload: BindRequestStepPayload,
) -> StepOutcome<BindRequestStepUpdate> {
    let mut soft_failures = Vec::new();

    let quotes = payload.quotes.map(|raw| match serde_json::from_str(&raw) {
        Ok(parsed) => parsed,
        Err(e) => {
            soft_failures.push(SoftFailure::new(
                "quotes",
                format!("malformed JSON: {}", e),
            ));
            Value::String(raw)
        }
    });

    let update = BindRequestStepUpdate {
        quotes,
        additional_insured: is_literal_true(payload.additional_insured.as_ref()),
        waiver_subrogation: is_literal_true(payload.waiver_of_subrogation.as_ref()),
    };

    StepOutcome::with_failures(update, soft_failures)
}

fn is_literal_true(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::String(s)) if s == "true")
}
