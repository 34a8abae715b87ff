use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

use crate::customer::CustomerRecord;
use crate::engine::TemplateEngine;
use crate::replacements::FieldContext;

const BUILTIN_RULES: &str = include_str!("../rules/default.yaml");

#[derive(Error, Debug)]
pub enum RuleError {
    #[error("Failed to read rule table: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse rule table: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Rule #{0} has an empty literal")]
    EmptyLiteral(usize),
    #[error("Literal {0:?} is defined by more than one rule")]
    DuplicateLiteral(String),
    #[error("Rule for {literal:?} requires unknown field {path:?}")]
    UnknownField { literal: String, path: String },
    #[error("Rule for {literal:?} has an invalid value expression: {message}")]
    InvalidValue { literal: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Text searched for in the documents.
    pub literal: String,
    /// Expression rendered against the field context.
    pub value: String,
    /// Dotted field paths that must be non-empty for the rule to apply.
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
    #[serde(default)]
    pub rules: Vec<Rule>,
}

/// Converts a dotted field path into a JSON pointer (`name.styled` ->
/// `/name/styled`).
pub fn field_pointer(path: &str) -> String {
    format!("/{}", path.trim().replace('.', "/"))
}

impl RuleTable {
    /// The table shipped with the crate.
    pub fn builtin() -> Result<Self, RuleError> {
        Self::from_yaml(BUILTIN_RULES)
    }

    pub fn load(path: &Path) -> Result<Self, RuleError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, RuleError> {
        let table: RuleTable = serde_yaml::from_str(content)?;
        table.check_literals()?;
        Ok(table)
    }

    /// Appends `other`, rejecting literals that are already defined.
    pub fn extend(&mut self, other: RuleTable) -> Result<(), RuleError> {
        self.rules.extend(other.rules);
        self.check_literals()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn check_literals(&self) -> Result<(), RuleError> {
        let mut seen = HashSet::new();
        for (index, rule) in self.rules.iter().enumerate() {
            if rule.literal.is_empty() {
                return Err(RuleError::EmptyLiteral(index));
            }
            if !seen.insert(rule.literal.as_str()) {
                return Err(RuleError::DuplicateLiteral(rule.literal.clone()));
            }
        }
        Ok(())
    }

    /// Renders every rule against an empty customer so that unknown fields
    /// and syntax errors surface before any document is touched.
    pub fn validate(&self, engine: &TemplateEngine) -> Result<(), RuleError> {
        let context = FieldContext::new(&CustomerRecord::default());
        let fields = serde_json::to_value(&context).map_err(|e| RuleError::InvalidValue {
            literal: String::new(),
            message: e.to_string(),
        })?;
        for rule in &self.rules {
            for path in &rule.requires {
                if fields.pointer(&field_pointer(path)).is_none() {
                    return Err(RuleError::UnknownField {
                        literal: rule.literal.clone(),
                        path: path.clone(),
                    });
                }
            }
            engine
                .render_string(&rule.value, &fields)
                .map_err(|message| RuleError::InvalidValue {
                    literal: rule.literal.clone(),
                    message,
                })?;
        }
        debug!("Validated {} replacement rules", self.rules.len());
        Ok(())
    }
}
