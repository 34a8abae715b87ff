use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use thiserror::Error;

/// Lien amount used when the customer record does not carry one.
pub const DEFAULT_LIEN_AMOUNT: u64 = 100_000_000;

#[derive(Error, Debug)]
pub enum CustomerError {
    #[error("Failed to read customer data: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse customer JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Per-customer personal data, read once per run.
///
/// Every text field is optional; a missing field behaves like an empty one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerRecord {
    #[serde(deserialize_with = "trimmed")]
    pub first_name: String,
    #[serde(deserialize_with = "trimmed")]
    pub middle_name: String,
    #[serde(deserialize_with = "trimmed")]
    pub last_name: String,
    #[serde(deserialize_with = "trimmed")]
    pub suffix: String,
    #[serde(deserialize_with = "trimmed")]
    pub ssn: String,
    #[serde(deserialize_with = "trimmed")]
    pub street_address: String,
    #[serde(deserialize_with = "trimmed")]
    pub city: String,
    #[serde(deserialize_with = "trimmed")]
    pub state: String,
    #[serde(deserialize_with = "trimmed")]
    pub zip_code: String,
    #[serde(deserialize_with = "trimmed")]
    pub county: String,
    #[serde(deserialize_with = "trimmed")]
    pub birth_state: String,
    #[serde(deserialize_with = "trimmed")]
    pub ucc_filing_number: String,
    #[serde(deserialize_with = "trimmed")]
    pub ucc_filing_state: String,
    #[serde(deserialize_with = "trimmed")]
    pub registered_mail_number: String,
    #[serde(deserialize_with = "trimmed")]
    pub dtc_routing_number: String,
    #[serde(deserialize_with = "trimmed")]
    pub dtc_account_number: String,
    #[serde(deserialize_with = "amount")]
    pub lien_amount: LienAmount,
    #[serde(deserialize_with = "trimmed")]
    pub document_date: String,
    #[serde(deserialize_with = "trimmed")]
    pub birth_date: String,
    #[serde(deserialize_with = "trimmed")]
    pub birth_cert_number: String,
}

/// Whole-dollar lien amount, defaulting to [`DEFAULT_LIEN_AMOUNT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LienAmount(pub u64);

impl Default for LienAmount {
    fn default() -> Self {
        Self(DEFAULT_LIEN_AMOUNT)
    }
}

impl CustomerRecord {
    pub fn load(path: &Path) -> Result<Self, CustomerError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, CustomerError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Last name used in output file names.
    pub fn display_last_name(&self) -> &str {
        if self.last_name.is_empty() {
            "Customer"
        } else {
            &self.last_name
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawText {
    Text(String),
    Number(serde_json::Number),
}

/// Accepts a string or a bare number (`"zipCode": 77001`), trimmed.
fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Option::<RawText>::deserialize(deserializer)? {
        None => String::new(),
        Some(RawText::Text(s)) => s.trim().to_string(),
        Some(RawText::Number(n)) => n.to_string(),
    };
    Ok(value)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(u64),
    Float(f64),
    Text(String),
}

/// Accepts `100000000`, `"100000000"` or `"$100,000,000.00"`. Anything else
/// becomes zero rather than failing the whole record.
fn amount<'de, D>(deserializer: D) -> Result<LienAmount, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawAmount>::deserialize(deserializer)?;
    let amount = match raw {
        None => LienAmount::default(),
        Some(RawAmount::Number(n)) => LienAmount(n),
        Some(RawAmount::Float(f)) if f.is_finite() && f >= 0.0 => LienAmount(f.trunc() as u64),
        Some(RawAmount::Float(f)) => {
            warn!("Invalid lien amount {}, using 0", f);
            LienAmount(0)
        }
        Some(RawAmount::Text(s)) => parse_amount_text(&s),
    };
    Ok(amount)
}

fn parse_amount_text(text: &str) -> LienAmount {
    let cleaned: String = text
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    if cleaned.is_empty() {
        return LienAmount::default();
    }
    let whole = cleaned.split('.').next().unwrap_or_default();
    match whole.parse::<u64>() {
        Ok(n) => LienAmount(n),
        Err(e) => {
            warn!("Invalid lien amount {:?} ({}), using 0", text, e);
            LienAmount(0)
        }
    }
}
