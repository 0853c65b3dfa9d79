// src/domains/activity/types.rs

use crate::domains::activity::status_codec::{self, CanonicalStatus, StatusCodec, ENUM_NOT_IN_PROGRESS};
use crate::errors::{DomainResult, ValidationError};
use crate::validation::{Validate, ValidationBuilder};
use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// Activity entity as returned by the remote API.
/// `status` is kept exactly as received; use `canonical_status`/`ui_status` to read it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(deserialize_with = "opaque_id::deserialize")]
    pub id: String,
    #[serde(default, deserialize_with = "free_text::deserialize_or_empty")]
    pub title: String,
    #[serde(default)]
    pub status: Value,
    #[serde(default, alias = "condominioId", deserialize_with = "opaque_id::deserialize_or_empty")]
    pub condominium_id: String,
    #[serde(default, deserialize_with = "lenient_budget_status")]
    pub budget_status: BudgetStatus,
    #[serde(default, alias = "budget", deserialize_with = "lenient_decimal", skip_serializing_if = "Option::is_none")]
    pub budget_amount: Option<Decimal>,
    #[serde(default, with = "expected_date_format", skip_serializing_if = "Option::is_none")]
    pub expected_date: Option<NaiveDate>,
    #[serde(flatten)]
    pub details: ActivityDetails,
}

impl Activity {
    pub fn canonical_status(&self) -> CanonicalStatus {
        status_codec::decode(&self.status)
    }

    /// UI label for grouping; `None` when the raw value is not recognized
    pub fn ui_status(&self) -> Option<UiStatus> {
        UiStatus::from_raw(&self.status)
    }

    /// Budget amount only when the budget is approved; otherwise ignored
    pub fn effective_budget(&self) -> Option<Decimal> {
        match self.budget_status {
            BudgetStatus::Approved => self.budget_amount,
            _ => None,
        }
    }

    pub fn quick_action(&self) -> Option<QuickAction> {
        self.ui_status().and_then(|s| s.next_action())
    }
}

/// Free-form descriptive fields, no structural constraints.
/// Always serialized (null when empty) so an edit can clear them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDetails {
    #[serde(default, deserialize_with = "free_text::deserialize")]
    pub frequency: Option<String>,
    #[serde(default, deserialize_with = "free_text::deserialize")]
    pub team: Option<String>,
    #[serde(default, deserialize_with = "free_text::deserialize")]
    pub applied_standard: Option<String>,
    #[serde(default, deserialize_with = "free_text::deserialize")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "free_text::deserialize")]
    pub responsibles: Option<String>,
    #[serde(default, deserialize_with = "free_text::deserialize")]
    pub observations: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BudgetStatus {
    #[default]
    #[serde(rename = "sem orçamento", alias = "no-budget", alias = "sem orcamento")]
    NoBudget,
    #[serde(rename = "pendente", alias = "pending")]
    Pending,
    #[serde(rename = "aprovado", alias = "approved")]
    Approved,
}

impl BudgetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetStatus::NoBudget => "sem orçamento",
            BudgetStatus::Pending => "pendente",
            BudgetStatus::Approved => "aprovado",
        }
    }
}

/// The four display states used by the views.
///
/// Only `InProgress` maps to the in-progress wire concept; the other three all collapse
/// to "not in progress", so a record saved as `Done` comes back as `Pending` when the
/// backend stores the boolean form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UiStatus {
    #[serde(rename = "Próximas")]
    Upcoming,
    #[serde(rename = "Em andamento")]
    InProgress,
    #[serde(rename = "Pendente")]
    Pending,
    #[serde(rename = "Histórico")]
    Done,
}

impl UiStatus {
    /// Kanban column order
    pub const ALL: [UiStatus; 4] = [
        UiStatus::Upcoming,
        UiStatus::InProgress,
        UiStatus::Pending,
        UiStatus::Done,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            UiStatus::Upcoming => "Próximas",
            UiStatus::InProgress => "Em andamento",
            UiStatus::Pending => "Pendente",
            UiStatus::Done => "Histórico",
        }
    }

    pub fn column_id(&self) -> &'static str {
        match self {
            UiStatus::Upcoming => "next",
            UiStatus::InProgress => "ongoing",
            UiStatus::Pending => "pending",
            UiStatus::Done => "history",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            UiStatus::Upcoming => "#787878",
            UiStatus::InProgress => "#2d96ff",
            UiStatus::Pending => "#FF5959",
            UiStatus::Done => "#87E76A",
        }
    }

    pub fn canonical(&self) -> CanonicalStatus {
        CanonicalStatus::from(matches!(self, UiStatus::InProgress))
    }

    /// Exact label match only
    pub fn parse_label(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == raw)
    }

    /// Classify a raw status value as received from the backend or a dialog.
    pub fn from_raw(raw: &Value) -> Option<Self> {
        if let Some(label) = raw.as_str().and_then(Self::parse_label) {
            return Some(label);
        }
        if status_codec::decode(raw).is_in_progress() {
            return Some(UiStatus::InProgress);
        }
        match raw {
            Value::Bool(false) => Some(UiStatus::Pending),
            Value::Number(n) if n.as_f64() == Some(0.0) => Some(UiStatus::Pending),
            Value::String(s) if s == ENUM_NOT_IN_PROGRESS => Some(UiStatus::Pending),
            _ => None,
        }
    }

    pub fn next_action(&self) -> Option<QuickAction> {
        match self {
            UiStatus::Upcoming => Some(QuickAction::Start),
            UiStatus::InProgress => Some(QuickAction::Complete),
            UiStatus::Pending | UiStatus::Done => None,
        }
    }

    /// Whether `next` is part of the usual lifecycle. Informational: edits may set any status.
    pub fn follows(&self, next: UiStatus) -> bool {
        use UiStatus::*;
        *self == next
            || matches!(
                (*self, next),
                (Upcoming, InProgress) | (InProgress, Pending) | (InProgress, Done) | (Pending, InProgress)
            )
    }
}

/// Card shortcuts offered by the Kanban view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuickAction {
    Start,
    Complete,
}

impl QuickAction {
    pub fn label(&self) -> &'static str {
        match self {
            QuickAction::Start => "Iniciar atividade",
            QuickAction::Complete => "Concluir atividade",
        }
    }

    pub fn target(&self) -> UiStatus {
        match self {
            QuickAction::Start => UiStatus::InProgress,
            QuickAction::Complete => UiStatus::Done,
        }
    }
}

/// Whether the dialog was opened to add or to edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveMode {
    Create,
    Edit,
}

/// What the add/edit dialog hands over. Untrusted: converted into `CreatePayload` or
/// `UpdatePayload` (and validated) before anything is transmitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDraft {
    #[serde(default, deserialize_with = "opaque_id::deserialize_optional", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "free_text::deserialize")]
    pub title: Option<String>,
    /// Any recognized raw form: UI label, wire enum, boolean, 0/1
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default)]
    pub budget_status: Option<BudgetStatus>,
    #[serde(default, alias = "budget", deserialize_with = "lenient_decimal")]
    pub budget_amount: Option<Decimal>,
    #[serde(default, with = "expected_date_format")]
    pub expected_date: Option<NaiveDate>,
    #[serde(flatten)]
    pub details: ActivityDetails,
}

impl From<&Activity> for ActivityDraft {
    /// Prefill for the edit dialog
    fn from(activity: &Activity) -> Self {
        Self {
            id: Some(activity.id.clone()),
            title: Some(activity.title.clone()),
            status: match &activity.status {
                Value::Null => None,
                other => Some(other.clone()),
            },
            budget_status: Some(activity.budget_status),
            budget_amount: activity.effective_budget(),
            expected_date: activity.expected_date,
            details: activity.details.clone(),
        }
    }
}

/// Status already encoded for the configured wire mode
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct WireStatus(Value);

impl WireStatus {
    pub fn encode(status: CanonicalStatus, codec: &StatusCodec) -> Self {
        Self(codec.encode(status))
    }

    pub fn value(&self) -> &Value {
        &self.0
    }
}

/// Body of `POST /activities` (together with the condominium id)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePayload {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<WireStatus>,
    pub budget_status: BudgetStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_amount: Option<Decimal>,
    #[serde(with = "expected_date_format", skip_serializing_if = "Option::is_none")]
    pub expected_date: Option<NaiveDate>,
    #[serde(flatten)]
    pub details: ActivityDetails,
}

impl Validate for CreatePayload {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("title", Some(self.title.clone()))
            .required()
            .not_blank()
            .validate()?;
        validate_budget(self.budget_status, self.budget_amount)
    }
}

/// Body of `PATCH /activities/{id}`. The condominium is never changed by an edit.
///
/// Carries the whole form: empty fields go out as `null` and clear the stored value.
/// Only `status` is omitted when absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePayload {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<WireStatus>,
    pub budget_status: BudgetStatus,
    pub budget_amount: Option<Decimal>,
    #[serde(with = "expected_date_format")]
    pub expected_date: Option<NaiveDate>,
    #[serde(flatten)]
    pub details: ActivityDetails,
}

impl Validate for UpdatePayload {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("title", Some(self.title.clone()))
            .required()
            .not_blank()
            .validate()?;
        validate_budget(self.budget_status, self.budget_amount)
    }
}

fn validate_budget(status: BudgetStatus, amount: Option<Decimal>) -> DomainResult<()> {
    if status != BudgetStatus::Approved && amount.is_some() {
        return Err(ValidationError::invalid_value(
            "budget_amount",
            "only allowed when the budget is approved",
        )
        .into());
    }
    ValidationBuilder::new("budget_amount", amount)
        .min(Decimal::ZERO)
        .validate()
}

/// Wire body for creation: payload fields plus the owning condominium
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestBody<'a> {
    #[serde(flatten)]
    pub payload: &'a CreatePayload,
    pub condominium_id: &'a str,
}

/// Aggregates the backend may send along with a listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteStats {
    #[serde(default, deserialize_with = "json_number")]
    pub total: Option<f64>,
    #[serde(default, alias = "emAndamento", deserialize_with = "json_number")]
    pub in_progress: Option<f64>,
    #[serde(default, alias = "pendentes", deserialize_with = "json_number")]
    pub pending: Option<f64>,
}

/// Result of `GET /activities`: a bare array or an `{items, stats}` envelope.
/// Records that cannot be read are skipped; the rest of the collection still loads.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "ListingBody")]
pub struct ActivityListing {
    pub items: Vec<Activity>,
    pub stats: Option<RemoteStats>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListingBody {
    Bare(Vec<Value>),
    Envelope {
        #[serde(alias = "data")]
        items: Vec<Value>,
        #[serde(default)]
        stats: Option<Value>,
    },
}

impl From<ListingBody> for ActivityListing {
    fn from(body: ListingBody) -> Self {
        let (raw_items, raw_stats) = match body {
            ListingBody::Bare(items) => (items, None),
            ListingBody::Envelope { items, stats } => (items, stats),
        };

        let items = raw_items
            .into_iter()
            .enumerate()
            .filter_map(|(index, raw)| match serde_json::from_value::<Activity>(raw) {
                Ok(activity) => Some(activity),
                Err(e) => {
                    log::warn!("Skipping unreadable activity at position {}: {}", index, e);
                    None
                }
            })
            .collect();

        let stats = raw_stats
            .filter(|raw| !raw.is_null())
            .and_then(|raw| match serde_json::from_value::<RemoteStats>(raw) {
                Ok(stats) => Some(stats),
                Err(e) => {
                    log::warn!("Ignoring unreadable listing stats: {}", e);
                    None
                }
            });

        Self { items, stats }
    }
}

/// Header numbers: total, in progress, pending (everything not in progress)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityStats {
    pub total: usize,
    pub in_progress: usize,
    pub pending: usize,
}

impl ActivityStats {
    /// Counts from the canonical status of `items`
    pub fn from_items(items: &[Activity]) -> Self {
        let total = items.len();
        let in_progress = items
            .iter()
            .filter(|a| a.canonical_status().is_in_progress())
            .count();
        Self {
            total,
            in_progress,
            pending: total - in_progress,
        }
    }

    /// Backend numbers win field by field when present and finite
    pub fn derive(items: &[Activity], remote: Option<&RemoteStats>) -> Self {
        let local = Self::from_items(items);
        match remote {
            None => local,
            Some(remote) => Self {
                total: authoritative(remote.total, local.total),
                in_progress: authoritative(remote.in_progress, local.in_progress),
                pending: authoritative(remote.pending, local.pending),
            },
        }
    }
}

fn authoritative(value: Option<f64>, fallback: usize) -> usize {
    match value {
        Some(v) if v.is_finite() && v >= 0.0 => v.round() as usize,
        _ => fallback,
    }
}

/// Parameters of a store load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadRequest {
    pub condominium_id: String,
    /// `true` replaces the collection; `false` appends records not yet present
    pub reset: bool,
}

impl LoadRequest {
    pub fn reset(condominium_id: &str) -> Self {
        Self {
            condominium_id: condominium_id.to_string(),
            reset: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoadOutcome {
    Loaded { count: usize },
    /// Superseded or cancelled; nothing was applied
    Discarded,
}

// --- Wire helpers ---

/// Accepts `YYYY-MM-DD`, `DD/MM/YYYY` and RFC 3339 timestamps
pub fn parse_expected_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%d/%m/%Y"))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(trimmed).ok().map(|dt| dt.date_naive()))
}

pub mod expected_date_format {
    use super::parse_expected_date;
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    const WIRE_FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_str(&date.format(WIRE_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            Some(Value::String(raw)) => {
                let parsed = parse_expected_date(&raw);
                if parsed.is_none() && !raw.trim().is_empty() {
                    log::warn!("Ignoring unparseable expected date '{}'", raw);
                }
                Ok(parsed)
            }
            _ => Ok(None),
        }
    }
}

pub(crate) mod opaque_id {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(D::Error::custom(format!("invalid id: {}", other))),
        }
    }

    /// Like `deserialize`, but a missing or malformed id reads as empty
    pub fn deserialize_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            None | Some(Value::Null) => String::new(),
            Some(other) => {
                log::warn!("Ignoring malformed id {}", other);
                String::new()
            }
        })
    }

    pub fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(other) => Err(D::Error::custom(format!("invalid id: {}", other))),
        }
    }
}

/// Free-form text: numbers and booleans are kept as their text, structured values dropped
mod free_text {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            Some(other) => {
                log::warn!("Dropping non-text value {}", other);
                None
            }
        })
    }

    pub fn deserialize_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(deserialize(deserializer)?.unwrap_or_default())
    }
}

/// Unknown or null budget statuses read as "sem orçamento"
fn lenient_budget_status<'de, D>(deserializer: D) -> Result<BudgetStatus, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => BudgetStatus::default(),
        Some(raw) => serde_json::from_value(raw.clone()).unwrap_or_else(|_| {
            log::warn!("Unknown budget status {}; treating as no budget", raw);
            BudgetStatus::default()
        }),
    })
}

/// Decimal from a JSON number or numeric string; blank or unparseable values are absent
fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let parse = |s: &str| Decimal::from_str(s).or_else(|_| Decimal::from_scientific(s)).ok();
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => parse(&n.to_string()),
        Some(Value::String(s)) if !s.trim().is_empty() => parse(s.trim()),
        _ => None,
    })
}

/// Only real JSON numbers count; strings and nulls are "not supplied"
fn json_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        _ => None,
    })
}
