use crate::domain::outcome::{SoftFailure, StepOutcome};
use crate::domain::value::{coerce_string, sanitize_numeric};
use chrono::NaiveDate;
use common::{ApplicationDraft, Claim, STORAGE_DATE_FORMAT};
use serde::Deserialize;
use serde_json::Value;

/// Date format claim dates arrive in from the wizard.
pub const CLAIM_INPUT_DATE_FORMAT: &str = "%m/%d/%Y";

/// Raw claim-step payload: a JSON-encoded array of claim objects.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClaimStepPayload {
    #[serde(default)]
    pub claims: Option<String>,
}

/// Fully normalized claim-step fields.
///
/// `claims` is None when the payload carried no parseable claim array; the
/// draft's existing claims are then left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClaimStepUpdate {
    pub claims: Option<Vec<Claim>>,
}

impl ClaimStepUpdate {
    pub fn apply_to(self, draft: &mut ApplicationDraft) {
        if let Some(claims) = self.claims {
            draft.claims = claims;
        }
    }
}

/// Normalize the claim step.
///
/// Each claim loses any `id` field, has its `date` reformatted from
/// `MM/DD/YYYY` to the storage date format, and has `policy_type`
/// sanitized to a number. A date that fails to parse is kept exactly as
/// submitted and reported as a soft failure, leaving the caller to decide
/// what to do with it. Expects a raw payload: must run at most once per
/// step submission (the `claims` string is consumed here).
pub fn normalize_claim_step(payload: ClaimStepPayload) -> StepOutcome<ClaimStepUpdate> {
    let mut soft_failures = Vec::new();

    let Some(raw) = payload.claims else {
        return StepOutcome::clean(ClaimStepUpdate::default());
    };

    let parsed: Value = match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            soft_failures.push(SoftFailure::new(
                "claims",
                format!("malformed JSON: {}", e),
            ));
            return StepOutcome::with_failures(ClaimStepUpdate::default(), soft_failures);
        }
    };

    let Value::Array(items) = parsed else {
        soft_failures.push(SoftFailure::new("claims", "not a JSON array"));
        return StepOutcome::with_failures(ClaimStepUpdate::default(), soft_failures);
    };

    let mut claims = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Object(fields) => claims.push(normalize_claim(fields, &mut soft_failures)),
            other => {
                soft_failures.push(SoftFailure::new(
                    "claims",
                    format!("not an object: {}", other),
                ));
            }
        }
    }

    StepOutcome::with_failures(
        ClaimStepUpdate {
            claims: Some(claims),
        },
        soft_failures,
    )
}

fn normalize_claim(
    mut fields: serde_json::Map<String, Value>,
    soft_failures: &mut Vec<SoftFailure>,
) -> Claim {
    // Wizard row identifiers never reach storage
    fields.remove("id");

    let date = fields
        .remove("date")
        .as_ref()
        .and_then(coerce_string)
        .map(|date| reformat_claim_date(date, soft_failures));

    let policy_type = match fields.remove("policy_type").filter(|v| !v.is_null()) {
        Some(value) => {
            let sanitized = sanitize_numeric(&value);
            if sanitized.is_none() {
                soft_failures.push(SoftFailure::new(
                    "policy_type",
                    format!("not numeric: {}", value),
                ));
            }
            sanitized
        }
        None => None,
    };

    Claim {
        date,
        policy_type,
        extra: fields,
    }
}

/// Reformat `MM/DD/YYYY` to the storage date format; an unparseable date is
/// returned unchanged alongside a soft failure.
fn reformat_claim_date(date: String, soft_failures: &mut Vec<SoftFailure>) -> String {
    match NaiveDate::parse_from_str(&date, CLAIM_INPUT_DATE_FORMAT) {
        Ok(parsed) => parsed.format(STORAGE_DATE_FORMAT).to_string(),
        Err(e) => {
            soft_failures.push(SoftFailure::new(
                "date",
                format!("unparseable claim date {:?}: {}", date, e),
            ));
            date
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims_payload(claims: serde_json::Value) -> ClaimStepPayload {
        ClaimStepPayload {
            claims: Some(claims.to_string()),
        }
    }

    #[test]
    fn test_claim_dates_canonicalize() {
        let outcome = normalize_claim_step(claims_payload(json!([
            {"date": "03/15/2021", "policy_type": 1, "amount_paid": 1200},
        ])));

        let claims = outcome.update.claims.unwrap();
        assert_eq!(claims[0].date.as_deref(), Some("2021-03-15"));
        assert!(outcome.soft_failures.is_empty());
    }

    #[test]
    fn test_claim_ids_are_dropped() {
        let outcome = normalize_claim_step(claims_payload(json!([
            {"id": 99, "date": "01/02/2020", "policy_type": "2"},
        ])));

        let claims = outcome.update.claims.unwrap();
        assert!(!claims[0].extra.contains_key("id"));
        assert_eq!(claims[0].policy_type, Some(2));
    }

    #[test]
    fn test_unparseable_date_kept_verbatim_with_soft_failure() {
        let outcome = normalize_claim_step(claims_payload(json!([
            {"date": "sometime in 2019"},
        ])));

        let claims = outcome.update.claims.unwrap();
        assert_eq!(claims[0].date.as_deref(), Some("sometime in 2019"));
        assert_eq!(outcome.soft_failures.len(), 1);
        assert_eq!(outcome.soft_failures[0].field, "date");
    }

    #[test]
    fn test_policy_type_sanitizes_from_noisy_string() {
        let outcome = normalize_claim_step(claims_payload(json!([
            {"policy_type": "type-1"},
        ])));

        let claims = outcome.update.claims.unwrap();
        assert_eq!(claims[0].policy_type, Some(1));
    }

    #[test]
    fn test_unowned_claim_fields_pass_through() {
        let outcome = normalize_claim_step(claims_payload(json!([
            {"date": "03/15/2021", "amount_paid": 2500, "open": false},
        ])));

        let claims = outcome.update.claims.unwrap();
        assert_eq!(claims[0].extra.get("amount_paid"), Some(&json!(2500)));
        assert_eq!(claims[0].extra.get("open"), Some(&json!(false)));
    }

    #[test]
    fn test_malformed_claims_json_is_a_soft_failure() {
        let outcome = normalize_claim_step(ClaimStepPayload {
            claims: Some("[{broken".to_string()),
        });

        assert_eq!(outcome.update.claims, None);
        assert_eq!(outcome.soft_failures.len(), 1);
        assert_eq!(outcome.soft_failures[0].field, "claims");

        // The draft's claims are untouched when nothing parsed
        let mut draft = ApplicationDraft {
            claims: vec![Claim::default()],
            ..Default::default()
        };
        outcome.update.apply_to(&mut draft);
        assert_eq!(draft.claims.len(), 1);
    }

    #[test]
    fn test_absent_claims_field_is_clean() {
        let outcome = normalize_claim_step(ClaimStepPayload::default());
        assert_eq!(outcome.update.claims, None);
        assert!(outcome.soft_failures.is_empty());
    }

    #[test]
    fn test_empty_claim_array_replaces_existing_claims() {
        let outcome = normalize_claim_step(claims_payload(json!([])));
        assert_eq!(outcome.update.claims, Some(vec![]));
    }
}
