use crate::domain::outcome::{SoftFailure, StepOutcome};
use crate::domain::value::{coerce_int, is_present};
use common::{ApplicationDraft, OwnerPayroll};
use serde::Deserialize;
use serde_json::Value;

/// Raw owner-step payload as submitted by the wizard.
///
/// `owners` is a JSON-encoded string, not a JSON array; the front end
/// serializes the owner grid before posting.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwnerStepPayload {
    #[serde(default)]
    pub num_owners: Option<Value>,
    #[serde(default)]
    pub owners_covered: Option<Value>,
    #[serde(default)]
    pub activity_code: Option<Value>,
    #[serde(default)]
    pub payroll: Option<Value>,
    #[serde(default)]
    pub owners: Option<String>,
}

/// Fully normalized owner-step fields.
///
/// Exactly one of `owner_payroll` and `owners_json` is populated for a
/// well-formed submission; the raw `owners` string never survives the step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OwnerStepUpdate {
    pub num_owners: Option<i64>,
    pub owners_covered: Option<i64>,
    pub owner_payroll: Option<OwnerPayroll>,
    pub owners_json: Option<Value>,
}

impl OwnerStepUpdate {
    pub fn apply_to(self, draft: &mut ApplicationDraft) {
        draft.business_info.num_owners = self.num_owners;
        draft.business_info.owners_covered = self.owners_covered;
        draft.business_info.owner_payroll = self.owner_payroll;
        draft.business_info.owners_json = self.owners_json;
    }
}

/// Normalize the owner step.
///
/// When at least one owner is covered and the flat `activity_code` /
/// `payroll` pair is present, the pair is captured as `owner_payroll` and
/// the flat fields are dropped. Otherwise the JSON-encoded `owners` string
/// is parsed into `owners_json`. Expects a raw payload: must run at most
/// once per step submission (the `owners` string is consumed here).
pub fn normalize_owner_step(payload: OwnerStepPayload) -> StepOutcome<OwnerStepUpdate> {
    let mut soft_failures = Vec::new();

    let num_owners = parse_count("num_owners", payload.num_owners.as_ref(), &mut soft_failures);
    let owners_covered = parse_count(
        "owners_covered",
        payload.owners_covered.as_ref(),
        &mut soft_failures,
    );

    let mut update = OwnerStepUpdate {
        num_owners,
        owners_covered,
        ..Default::default()
    };

    let has_flat_payroll =
        is_present(payload.activity_code.as_ref()) && is_present(payload.payroll.as_ref());

    if owners_covered.unwrap_or(0) > 0 && has_flat_payroll {
        update.owner_payroll = Some(OwnerPayroll {
            activity_code: payload.activity_code.clone().unwrap_or(Value::Null),
            payroll: payload.payroll.clone().unwrap_or(Value::Null),
        });
    } else if let Some(raw) = &payload.owners {
        match serde_json::from_str::<Value>(raw) {
            Ok(parsed) => update.owners_json = Some(parsed),
            Err(e) => {
                soft_failures.push(SoftFailure::new(
                    "owners",
                    format!("malformed JSON: {}", e),
                ));
            }
        }
    }

    StepOutcome::with_failures(update, soft_failures)
}

fn parse_count(
    field: &'static str,
    value: Option<&Value>,
    soft_failures: &mut Vec<SoftFailure>,
) -> Option<i64> {
    let value = value.filter(|v| !v.is_null())?;
    let parsed = coerce_int(value);
    if parsed.is_none() {
        soft_failures.push(SoftFailure::new(
            field,
            format!("not a count: {}", value),
        ));
    }
    parsed
}
