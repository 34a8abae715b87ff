use crate::formatting;

// Export individual filter functions
pub use self::compact as filter_compact;
pub use self::initial as filter_initial;
pub use self::money as filter_money;
pub use self::prefix3 as filter_prefix3;
pub use self::slashed_date as filter_slashed_date;
pub use self::words as filter_words;
pub use self::written_date as filter_written_date;

/*
   Note: these follow minijinja's Filter signature, so plain Rust types in
   and out.
*/

pub fn written_date(s: String) -> String {
    formatting::format_date_written(&s)
}

pub fn slashed_date(s: String) -> String {
    formatting::format_date_slashed(&s)
}

pub fn compact(s: String) -> String {
    formatting::compact_date(&s)
}

pub fn money(amount: u64) -> String {
    formatting::format_money(amount)
}

pub fn words(amount: u64) -> String {
    formatting::number_to_words(amount)
}

pub fn initial(s: String) -> String {
    s.chars().next().map(|c| c.to_uppercase().collect()).unwrap_or_default()
}

/// First three characters uppercased, `XXX` for an empty input.
pub fn prefix3(s: String) -> String {
    if s.is_empty() {
        "XXX".to_string()
    } else {
        s.chars().take(3).collect::<String>().to_uppercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix3() {
        assert_eq!(prefix3("Smith".to_string()), "SMI");
        assert_eq!(prefix3("Li".to_string()), "LI");
        assert_eq!(prefix3(String::new()), "XXX");
        assert_eq!(prefix3("Øster".to_string()), "ØST");
    }

    #[test]
    fn test_initial() {
        assert_eq!(initial("michael".to_string()), "M");
        assert_eq!(initial(String::new()), "");
    }
}
