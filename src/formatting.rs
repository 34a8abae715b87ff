use chrono::{Datelike, NaiveDate};
use log::debug;

const ISO_DATE: &str = "%Y-%m-%d";

const ONES: [&str; 20] = [
    "", "ONE", "TWO", "THREE", "FOUR", "FIVE", "SIX", "SEVEN", "EIGHT", "NINE", "TEN", "ELEVEN",
    "TWELVE", "THIRTEEN", "FOURTEEN", "FIFTEEN", "SIXTEEN", "SEVENTEEN", "EIGHTEEN", "NINETEEN",
];

const TENS: [&str; 10] = [
    "", "", "TWENTY", "THIRTY", "FORTY", "FIFTY", "SIXTY", "SEVENTY", "EIGHTY", "NINETY",
];

fn parse_iso(date_str: &str) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(date_str.trim(), ISO_DATE) {
        Ok(date) => Some(date),
        Err(e) => {
            debug!("Not an ISO date {:?}: {}", date_str, e);
            None
        }
    }
}

/// Returns the English ordinal suffix for a day of the month.
pub fn ordinal_suffix(day: u32) -> &'static str {
    if (11..=13).contains(&(day % 100)) {
        return "th";
    }
    match day % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

/// Converts `YYYY-MM-DD` into `Month DDth, YYYY`, e.g. `June 15th, 1985`.
///
/// Empty input gives an empty string; anything unparsable is returned as is.
pub fn format_date_written(date_str: &str) -> String {
    if date_str.is_empty() {
        return String::new();
    }
    match parse_iso(date_str) {
        Some(date) => format!(
            "{} {}{}, {}",
            date.format("%B"),
            date.day(),
            ordinal_suffix(date.day()),
            date.year()
        ),
        None => date_str.to_string(),
    }
}

/// Converts `YYYY-MM-DD` into the US numeric form `M/D/YYYY`.
pub fn format_date_slashed(date_str: &str) -> String {
    if date_str.is_empty() {
        return String::new();
    }
    match parse_iso(date_str) {
        Some(date) => format!("{}/{}/{}", date.month(), date.day(), date.year()),
        None => date_str.to_string(),
    }
}

/// Strips date separators, so `1962-10-12` becomes `19621012`.
pub fn compact_date(date_str: &str) -> String {
    date_str
        .chars()
        .filter(|c| !matches!(c, '-' | '/' | '.'))
        .collect()
}

/// Formats a whole amount as `$X,XXX.XX`.
pub fn format_money(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("${}.00", grouped)
}

/// Spells a value in `0..1000` in uppercase words.
fn digit_words(n: u64) -> String {
    if n < 20 {
        ONES[n as usize].to_string()
    } else if n < 100 {
        let ones = n % 10;
        if ones == 0 {
            TENS[(n / 10) as usize].to_string()
        } else {
            format!("{}-{}", TENS[(n / 10) as usize], ONES[ones as usize])
        }
    } else {
        let rest = n % 100;
        if rest == 0 {
            format!("{} HUNDRED", ONES[(n / 100) as usize])
        } else {
            format!("{} HUNDRED {}", ONES[(n / 100) as usize], digit_words(rest))
        }
    }
}

/// Converts an amount to uppercase words using the thousand, million and
/// billion magnitudes only.
///
/// Anything below one thousand is dropped, so `999` renders as `ZERO` and
/// `1_500` as `ONE THOUSAND`. Legal amounts in the corpus are always whole
/// thousands, and the corpus never spells out an `AND`.
pub fn number_to_words(num: u64) -> String {
    let billions = num / 1_000_000_000;
    let millions = (num % 1_000_000_000) / 1_000_000;
    let thousands = (num % 1_000_000) / 1_000;

    let mut words = Vec::new();
    if billions > 0 {
        let spelled = if billions < 1_000 {
            digit_words(billions)
        } else {
            number_to_words(billions)
        };
        words.push(format!("{} BILLION", spelled));
    }
    if millions > 0 {
        words.push(format!("{} MILLION", digit_words(millions)));
    }
    if thousands > 0 {
        words.push(format!("{} THOUSAND", digit_words(thousands)));
    }

    if words.is_empty() {
        "ZERO".to_string()
    } else {
        words.join(" ")
    }
}
