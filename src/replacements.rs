use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::customer::CustomerRecord;
use crate::engine::TemplateEngine;
use crate::formatting::{
    compact_date, format_date_slashed, format_date_written, format_money, number_to_words,
};
use crate::names::NameForms;
use crate::rules::{field_pointer, RuleError, RuleTable};

#[derive(Error, Debug)]
pub enum MapError {
    #[error("Literal {literal:?} maps to both {existing:?} and {attempted:?}")]
    Collision {
        literal: String,
        existing: String,
        attempted: String,
    },
    #[error("Failed to render replacement for {literal:?}: {message}")]
    Render { literal: String, message: String },
    #[error("Failed to build field context: {0}")]
    Context(#[from] serde_json::Error),
    #[error(transparent)]
    Rules(#[from] RuleError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AmountForms {
    pub amount: u64,
    /// `$100,000,000.00`
    pub money: String,
    /// `ONE HUNDRED MILLION`
    pub words: String,
    pub words_lower: String,
    /// The amount times one thousand; empty if that overflows.
    pub thousandfold_money: String,
    pub thousandfold_words: String,
}

impl AmountForms {
    pub fn new(amount: u64) -> Self {
        let words = number_to_words(amount);
        let (thousandfold_money, thousandfold_words) = match amount.checked_mul(1_000) {
            Some(n) => (format_money(n), number_to_words(n)),
            None => (String::new(), String::new()),
        };
        Self {
            amount,
            money: format_money(amount),
            words_lower: words.to_lowercase(),
            words,
            thousandfold_money,
            thousandfold_words,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DateForms {
    /// As supplied, `YYYY-MM-DD`.
    pub iso: String,
    /// `January 15th, 2025`
    pub written: String,
    /// `1/15/2025`
    pub slashed: String,
    /// `20250115`
    pub compact: String,
}

impl DateForms {
    pub fn new(iso: &str) -> Self {
        Self {
            iso: iso.to_string(),
            written: format_date_written(iso),
            slashed: format_date_slashed(iso),
            compact: compact_date(iso),
        }
    }
}

/// Every value a rule expression can refer to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldContext {
    pub first: String,
    pub middle: String,
    pub last: String,
    pub suffix: String,
    pub name: NameForms,
    pub ssn: String,
    pub ssn_digits: String,
    pub street: String,
    pub street_upper: String,
    pub city: String,
    pub city_upper: String,
    pub state: String,
    pub state_upper: String,
    pub county: String,
    pub county_upper: String,
    pub zip: String,
    pub birth_state: String,
    pub ucc_number: String,
    pub ucc_state: String,
    pub ucc_state_upper: String,
    pub mail_number: String,
    pub routing_number: String,
    pub account_number: String,
    pub birth_cert: String,
    pub lien: AmountForms,
    pub document_date: DateForms,
    pub birth_date: DateForms,
    /// First three letters of the last name, `XXX` when unknown.
    pub ref_prefix: String,
}

impl FieldContext {
    pub fn new(customer: &CustomerRecord) -> Self {
        let c = customer;
        Self {
            first: c.first_name.clone(),
            middle: c.middle_name.clone(),
            last: c.last_name.clone(),
            suffix: c.suffix.clone(),
            name: NameForms::new(&c.first_name, &c.middle_name, &c.last_name, &c.suffix),
            ssn: c.ssn.clone(),
            ssn_digits: c.ssn.chars().filter(|ch| !matches!(ch, '-' | ' ')).collect(),
            street: c.street_address.clone(),
            street_upper: c.street_address.to_uppercase(),
            city: c.city.clone(),
            city_upper: c.city.to_uppercase(),
            state: c.state.clone(),
            state_upper: c.state.to_uppercase(),
            county: c.county.clone(),
            county_upper: c.county.to_uppercase(),
            zip: c.zip_code.clone(),
            birth_state: c.birth_state.clone(),
            ucc_number: c.ucc_filing_number.clone(),
            ucc_state: c.ucc_filing_state.clone(),
            ucc_state_upper: c.ucc_filing_state.to_uppercase(),
            mail_number: c.registered_mail_number.clone(),
            routing_number: c.dtc_routing_number.clone(),
            account_number: c.dtc_account_number.clone(),
            birth_cert: c.birth_cert_number.clone(),
            lien: AmountForms::new(c.lien_amount.0),
            document_date: DateForms::new(&c.document_date),
            birth_date: DateForms::new(&c.birth_date),
            ref_prefix: crate::filters::prefix3(c.last_name.clone()),
        }
    }
}

/// Literal placeholder -> replacement text.
///
/// Keys and values are never empty. Inserting the same literal twice with a
/// different value is an error rather than a silent overwrite.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ReplacementMap {
    entries: BTreeMap<String, String>,
}

impl ReplacementMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a map from pairs, applying the same rules as [`Self::insert`].
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, MapError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = Self::new();
        for (literal, value) in pairs {
            map.insert(literal, value)?;
        }
        Ok(map)
    }

    /// Inserts an entry. Returns `Ok(false)` when the entry was dropped
    /// because its literal or value is empty.
    pub fn insert(
        &mut self,
        literal: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<bool, MapError> {
        let (literal, value) = (literal.into(), value.into());
        if literal.is_empty() || value.is_empty() {
            return Ok(false);
        }
        match self.entries.get(&literal) {
            Some(existing) if *existing != value => Err(MapError::Collision {
                literal,
                existing: existing.clone(),
                attempted: value,
            }),
            Some(_) => Ok(true),
            None => {
                self.entries.insert(literal, value);
                Ok(true)
            }
        }
    }

    pub fn get(&self, literal: &str) -> Option<&str> {
        self.entries.get(literal).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Entries ordered by descending literal length (in characters), ties
    /// broken by literal.
    pub fn longest_first(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self.iter().collect();
        entries.sort_by(|a, b| {
            b.0.chars()
                .count()
                .cmp(&a.0.chars().count())
                .then_with(|| a.0.cmp(b.0))
        });
        entries
    }

    /// Pairs `(earlier, later)` where the replacement for `earlier` contains
    /// `later`, a literal applied after it. Substitution then rewrites part
    /// of the first replacement a second time.
    pub fn chained_literals(&self) -> Vec<(String, String)> {
        let ordered = self.longest_first();
        let mut chains = Vec::new();
        for (i, (literal, value)) in ordered.iter().enumerate() {
            for (later, _) in &ordered[i + 1..] {
                if value.contains(later) {
                    chains.push((literal.to_string(), later.to_string()));
                }
            }
        }
        chains
    }

    /// Copy prepared for WordprocessingML parts. Literals get `&`, `<` and `>`
    /// escaped, the form Word stores text in. Values additionally get both
    /// quote characters escaped so they are also safe inside attributes.
    pub fn xml_escaped(&self) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .map(|(k, v)| (escape_xml_text(k), escape_xml_attribute(v)))
                .collect(),
        }
    }
}

fn escape_xml_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_xml_attribute(text: &str) -> String {
    escape_xml_text(text)
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn is_blank(fields: &Value, path: &str) -> bool {
    match fields.pointer(&field_pointer(path)) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// Builds the replacement map for one customer from a rule table.
pub fn build_replacements(
    customer: &CustomerRecord,
    rules: &RuleTable,
    engine: &TemplateEngine,
) -> Result<ReplacementMap, MapError> {
    let fields = serde_json::to_value(FieldContext::new(customer))?;
    let mut map = ReplacementMap::new();

    for rule in &rules.rules {
        if let Some(path) = rule.requires.iter().find(|p| is_blank(&fields, p)) {
            debug!("Skipping {:?}: {} is empty", rule.literal, path);
            continue;
        }
        let value = engine
            .render_string(&rule.value, &fields)
            .map_err(|message| MapError::Render {
                literal: rule.literal.clone(),
                message,
            })?;
        if !map.insert(rule.literal.clone(), value)? {
            debug!("Dropping {:?}: empty replacement", rule.literal);
        }
    }

    for (literal, later) in map.chained_literals() {
        warn!(
            "Replacement for {:?} contains {:?}, which is substituted afterwards",
            literal, later
        );
    }

    info!(
        "Built {} replacements from {} rules",
        map.len(),
        rules.len()
    );
    Ok(map)
}

/// Builds the replacement map using the built-in rule table.
pub fn build_default_replacements(customer: &CustomerRecord) -> Result<ReplacementMap, MapError> {
    let rules = RuleTable::builtin()?;
    build_replacements(customer, &rules, &TemplateEngine::new())
}
