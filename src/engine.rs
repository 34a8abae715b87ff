use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;

/// TemplateEngine wraps minijinja::Environment and renders the small value
/// expressions used by rule tables and output-name patterns.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Creates a new TemplateEngine with the formatter filters registered.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);

        env.add_filter("written_date", crate::filters::filter_written_date);
        env.add_filter("slashed_date", crate::filters::filter_slashed_date);
        env.add_filter("compact", crate::filters::filter_compact);
        env.add_filter("money", crate::filters::filter_money);
        env.add_filter("words", crate::filters::filter_words);
        env.add_filter("initial", crate::filters::filter_initial);
        env.add_filter("prefix3", crate::filters::filter_prefix3);

        Self { env }
    }

    /// Registers a global variable in the template environment.
    pub fn add_global<T: Serialize>(&mut self, name: String, value: T) {
        self.env
            .add_global(name, minijinja::value::Value::from_serialize(&value));
    }

    /// Renders a template string with the given context.
    pub fn render_string<T: Serialize>(
        &self,
        template_str: &str,
        context: &T,
    ) -> Result<String, String> {
        self.env.render_str(template_str, context).map_err(|e| {
            if let Some(line) = e.line() {
                let error_line = template_str.lines().nth(line - 1).unwrap_or("");
                format!("{}\n{}", e, error_line)
            } else {
                format!("{}", e)
            }
        })
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_render_rule_value_expression() {
        let engine = TemplateEngine::new();
        let context = serde_json::json!({
            "name": { "styled": "John-Michael: Smith" },
            "zip": "77001",
        });
        let result = engine
            .render_string("c/o {{ name.styled }} near [{{ zip }}]", &context)
            .unwrap();
        assert_eq!(result, "c/o John-Michael: Smith near [77001]");
    }

    #[test]
    fn test_render_string_with_globals() {
        let mut engine = TemplateEngine::new();
        engine.add_global("package".to_string(), "Estate_Package");

        let context = HashMap::from([("last_name", "Smith")]);
        let result = engine
            .render_string("{{ package }}_{{ last_name }}.zip", &context)
            .unwrap();
        assert_eq!(result, "Estate_Package_Smith.zip");
    }

    #[test]
    fn test_unknown_field_is_an_error() {
        let engine = TemplateEngine::new();
        let context = serde_json::json!({ "name": { "styled": "John: Smith" } });
        let err = engine
            .render_string("{{ name.styled }}\n{{ name.nickname }}", &context)
            .unwrap_err();
        assert!(err.contains("undefined"), "{}", err);
    }

    #[test]
    fn test_formatter_filters() {
        let engine = TemplateEngine::new();
        let context = serde_json::json!({
            "date": "2025-01-15",
            "amount": 100000000u64,
            "last": "Smith",
        });
        let rendered = engine
            .render_string(
                "{{ date|written_date }}|{{ date|slashed_date }}|{{ date|compact }}|\
                 {{ amount|money }}|{{ amount|words }}|{{ last|prefix3 }}|{{ last|initial }}",
                &context,
            )
            .unwrap();
        assert_eq!(
            rendered,
            "January 15th, 2025|1/15/2025|20250115|$100,000,000.00|ONE HUNDRED MILLION|SMI|S"
        );
    }
}
