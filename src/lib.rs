pub mod archive;
pub mod config;
pub mod convert;
pub mod customer;
pub mod document;
pub mod engine;
pub mod filters;
pub mod formatting;
pub mod merge;
pub mod names;
pub mod package;
pub mod replacements;
pub mod rules;
pub mod substitution;

#[cfg(test)]
mod test_support;

pub use config::PackageConfig;
pub use customer::CustomerRecord;
pub use engine::TemplateEngine;
pub use package::{PackageError, PackageGenerator, PackageResult};
pub use replacements::{build_default_replacements, build_replacements, ReplacementMap};
pub use rules::RuleTable;
pub use substitution::apply_substitutions;
