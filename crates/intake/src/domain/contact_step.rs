use crate::domain::outcome::{SoftFailure, StepOutcome};
use crate::domain::value::{coerce_int, coerce_string};
use common::{ApplicationDraft, ContactRecord, DEFAULT_AGENCY};
use serde::Deserialize;
use serde_json::Value;

/// Applications whose business name starts with the platform's own brand
/// are demo submissions, never routed to carriers.
pub const DEMO_NAME_PREFIX: &str = "quoria";

/// Experience modifier every new application starts from; later rating
/// steps replace it.
pub const DEFAULT_EXPERIENCE_MODIFIER: f64 = 1.00;

/// Raw contact-step payload as submitted by the wizard.
///
/// Agency identifiers arrive as numbers or numeric strings depending on the
/// portal front end, so they are taken untyped and coerced.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactStepPayload {
    #[serde(default)]
    pub agency_id: Option<Value>,
    #[serde(default)]
    pub agencylocation_id: Option<Value>,
    #[serde(default)]
    pub industry_code: Option<Value>,
    #[serde(default)]
    pub dba: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub fname: Option<String>,
    #[serde(default)]
    pub lname: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Fully normalized contact-step fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactStepUpdate {
    pub agency: i64,
    pub agency_location: i64,
    pub experience_modifier: f64,
    pub demo: bool,
    pub industry_code: Option<String>,
    pub dba: Option<String>,
    pub name: Option<String>,
    pub contact: ContactRecord,
}

impl ContactStepUpdate {
    pub fn apply_to(self, draft: &mut ApplicationDraft) {
        draft.agency = Some(self.agency);
        draft.agency_location = Some(self.agency_location);
        draft.experience_modifier = Some(self.experience_modifier);
        draft.demo = Some(self.demo);
        draft.business_info.industry_code = self.industry_code;
        draft.business_info.dba = self.dba;
        draft.business_info.name = self.name;
        draft.business_info.contacts.push(self.contact);
    }
}

/// Normalize the contact step.
///
/// `agency_id` and `agencylocation_id` of `0`, `"0"`, or absent resolve to
/// the default agency; the business fields move under `business_info`; the
/// four contact fields are synthesized into one primary, active contact.
/// Expects a raw payload: must run at most once per step submission.
pub fn normalize_contact_step(payload: ContactStepPayload) -> StepOutcome<ContactStepUpdate> {
    let mut soft_failures = Vec::new();

    let agency = normalize_agency_id("agency_id", payload.agency_id.as_ref(), &mut soft_failures);
    let agency_location = normalize_agency_id(
        "agencylocation_id",
        payload.agencylocation_id.as_ref(),
        &mut soft_failures,
    );

    let industry_code = match payload.industry_code {
        Some(ref value) if !value.is_null() => {
            let coerced = coerce_string(value);
            if coerced.is_none() {
                soft_failures.push(SoftFailure::new(
                    "industry_code",
                    format!("not a scalar: {}", value),
                ));
            }
            coerced
        }
        _ => None,
    };

    let demo = payload
        .name
        .as_deref()
        .map(|name| name.to_lowercase().starts_with(DEMO_NAME_PREFIX))
        .unwrap_or(false);

    let contact = ContactRecord {
        fname: payload.fname,
        lname: payload.lname,
        email: payload.email,
        phone: payload.phone,
        primary: 1,
        state: 1,
    };

    let update = ContactStepUpdate {
        agency,
        agency_location,
        experience_modifier: DEFAULT_EXPERIENCE_MODIFIER,
        demo,
        industry_code,
        dba: payload.dba,
        name: payload.name,
        contact,
    };

    StepOutcome::with_failures(update, soft_failures)
}

/// Resolve an agency identifier: 0, "0", and absent all mean the default
/// agency; an uncoercible value also falls back but is reported.
fn normalize_agency_id(
    field: &'static str,
    value: Option<&Value>,
    soft_failures: &mut Vec<SoftFailure>,
) -> i64 {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return DEFAULT_AGENCY;
    };
    match coerce_int(value) {
        Some(0) => DEFAULT_AGENCY,
        Some(id) => id,
        None => {
            soft_failures.push(SoftFailure::new(
                field,
                format!("not a numeric identifier: {}", value),
            ));
            DEFAULT_AGENCY
        }
    }
}
