use crate::domain::result::DomainResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Date format claim and policy dates are stored in.
pub const STORAGE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Agency every application falls back to when intake does not name one.
pub const DEFAULT_AGENCY: i64 = 1;

/// Contact synthesized from the contact wizard step.
///
/// `primary` and `state` are kept as integer flags; the persisted document
/// uses 1 for the primary/active contact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub fname: Option<String>,
    pub lname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub primary: i64,
    pub state: i64,
}

/// Payroll declared for covered owners on the owner wizard step.
///
/// Values are carried as submitted; the wizard sends either numbers or
/// numeric strings and downstream rating resolves them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OwnerPayroll {
    pub activity_code: serde_json::Value,
    pub payroll: serde_json::Value,
}

/// One prior claim from the claim wizard step.
///
/// `date` is canonicalized to [`STORAGE_DATE_FORMAT`] when the submitted
/// value parses; an unparseable date is kept verbatim and reported as a soft
/// failure by the normalizer. Fields the step does not own are carried
/// untouched in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_type: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Business details accumulated by the contact and owner steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dba: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub contacts: Vec<ContactRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_owners: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owners_covered: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_payroll: Option<OwnerPayroll>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owners_json: Option<serde_json::Value>,
}

/// The canonical application document accumulated across wizard steps.
///
/// Each step normalizer owns a fixed set of fields and fully transforms them
/// before the draft is persisted; a partially transformed draft is never
/// observable outside the intake service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agency: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agency_location: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience_modifier: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demo: Option<bool>,
    #[serde(default)]
    pub business_info: BusinessInfo,
    #[serde(default)]
    pub claims: Vec<Claim>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_insured: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waiver_subrogation: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quotes: Option<serde_json::Value>,
}

/// Repository trait for application draft persistence
/// Infrastructure layer (Postgres) implements this trait
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    /// Load the draft for an application, if one has been started
    async fn get_draft(&self, application_id: &str) -> DomainResult<Option<ApplicationDraft>>;

    /// Create or replace the draft for an application
    async fn upsert_draft(
        &self,
        application_id: &str,
        draft: &ApplicationDraft,
    ) -> DomainResult<()>;
}
