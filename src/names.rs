use serde::Serialize;

fn initial(part: &str) -> String {
    part.chars().next().map(|c| c.to_uppercase().collect()).unwrap_or_default()
}

fn join(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

fn upper(part: &str) -> String {
    part.to_uppercase()
}

/// Every cased and punctuated form of one person's name.
///
/// All forms are empty when neither a first nor a last name is known, so a
/// missing name never overwrites template text with stray punctuation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NameForms {
    /// `JOHN MICHAEL SMITH`
    pub full_caps: String,
    /// `JOHN SMITH`
    pub caps_no_middle: String,
    /// `JOHN M SMITH`
    pub caps_middle_init: String,
    /// `J MICHAEL SMITH`, or `full_caps` without a middle name.
    pub caps_first_init: String,
    /// `J SMITH`
    pub caps_init_last: String,
    /// `MICHAEL JOHN SMITH`
    pub caps_reversed: String,
    /// `SMITH, JOHN MICHAEL`
    pub caps_comma: String,
    /// `SMITH, JOHN M`
    pub caps_comma_init: String,
    /// `JM SMITH`, or `J SMITH` without a middle name.
    pub caps_two_init_last: String,
    /// `JOHN S`
    pub caps_first_last_init: String,
    /// `SMITH`
    pub last_caps: String,
    /// `"JOHN MICHAEL SMITH"`
    pub quoted_caps: String,
    /// `John-Michael: Smith`, or `John: Smith` without a middle name.
    pub styled: String,
    /// `John Michael Smith`
    pub mixed_full: String,
    /// `John Smith`
    pub mixed_no_middle: String,
    /// `John M. Smith`
    pub mixed_middle_init: String,
    /// `J Michael Smith`
    pub mixed_first_init: String,
    /// `J.M. Smith`
    pub mixed_dotted_init: String,
    /// `J. Michael Smith`, or `J. Smith` without a middle name.
    pub mixed_init_period: String,
    /// `'John-Michael: Smith'`
    pub quoted_styled: String,
    /// `JMS`; empty when the first or last name is missing.
    pub initials: String,
    /// `JS`
    pub initials_two: String,
    /// `JOHN MICHAEL SMITH JR`
    pub full_caps_suffixed: String,
    /// `John Michael Smith Jr`
    pub mixed_suffixed: String,
}

impl NameForms {
    pub fn new(first: &str, middle: &str, last: &str, suffix: &str) -> Self {
        let (first, middle, last, suffix) = (first.trim(), middle.trim(), last.trim(), suffix.trim());
        if first.is_empty() && last.is_empty() {
            return Self::default();
        }

        let (f, m, l) = (initial(first), initial(middle), initial(last));
        let has_middle = !middle.is_empty();

        let full_caps = upper(&join(&[first, middle, last]));
        let styled = if has_middle {
            format!("{}-{}: {}", first, middle, last)
        } else {
            format!("{}: {}", first, last)
        };
        let mixed_middle_init = if has_middle {
            join(&[first, format!("{}.", m).as_str(), last])
        } else {
            join(&[first, last])
        };
        let initials = if first.is_empty() || last.is_empty() {
            String::new()
        } else {
            format!("{}{}{}", f, m, l)
        };

        Self {
            caps_no_middle: upper(&join(&[first, last])),
            caps_middle_init: upper(&join(&[first, m.as_str(), last])),
            caps_first_init: if has_middle {
                upper(&join(&[f.as_str(), middle, last]))
            } else {
                full_caps.clone()
            },
            caps_init_last: upper(&join(&[f.as_str(), last])),
            caps_two_init_last: upper(&join(&[format!("{}{}", f, m).as_str(), last])),
            caps_first_last_init: upper(&join(&[first, l.as_str()])),
            quoted_caps: format!("\"{}\"", full_caps),
            quoted_styled: format!("'{}'", styled),
            caps_reversed: upper(&join(&[middle, first, last])),
            caps_comma: upper(&format!("{}, {}", last, join(&[first, middle])))
                .trim_end_matches([',', ' '])
                .to_string(),
            caps_comma_init: upper(&format!("{}, {}", last, join(&[first, m.as_str()])))
                .trim_end_matches([',', ' '])
                .to_string(),
            last_caps: upper(last),
            mixed_full: join(&[first, middle, last]),
            mixed_no_middle: join(&[first, last]),
            mixed_first_init: join(&[f.as_str(), middle, last]),
            mixed_dotted_init: if has_middle {
                join(&[format!("{}.{}.", f, m).as_str(), last])
            } else {
                join(&[format!("{}.", f).as_str(), last])
            },
            mixed_init_period: join(&[format!("{}.", f).as_str(), middle, last]),
            initials_two: format!("{}{}", f, l),
            full_caps_suffixed: upper(&join(&[first, middle, last, suffix])),
            mixed_suffixed: join(&[first, middle, last, suffix]),
            full_caps,
            styled,
            mixed_middle_init,
            initials,
        }
    }
}
