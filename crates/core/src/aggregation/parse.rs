use chrono::NaiveDate;

use crate::domain::report::FieldValue;


/// Lenient numeric read. Currency symbols, thousands separators, percent
/// signs and whitespace are stripped; anything that still does not parse
/// reads as 0.
pub fn number(value: &FieldValue) -> f64 {
    match value {
        FieldValue::Number(number) if number.is_finite() => *number,
        FieldValue::Number(_) | FieldValue::Date(_) => 0.0,
        FieldValue::Text(text) => parse_numeric_text(text),
    }
}

/// Non-negative whole count, rounded.
pub fn count(value: &FieldValue) -> u64 {
    let value = number(value);
    if value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

pub fn date(value: &FieldValue) -> Option<NaiveDate> {
    match value {
        FieldValue::Date(date) => Some(*date),
        FieldValue::Text(text) => parse_date_text(text.trim()),
        FieldValue::Number(_) => None,
    }
}

/// chrono's `%Y` happily reads "24" as year 24, so the format is picked from
/// the digit count of the year part.
fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let format = if let Some((_, year)) = text.rsplit_once('/') {
        match year.len() {
            4 => "%m/%d/%Y",
            2 => "%m/%d/%y",
            _ => return None,
        }
    } else {
        match text.split_once('-') {
            Some((year, _)) if year.len() == 4 => "%Y-%m-%d",
            _ => return None,
        }
    };
    NaiveDate::parse_from_str(text, format).ok()
}

pub fn text(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Text(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        FieldValue::Number(number) if number.is_finite() => Some(number.to_string()),
        // ISO-shaped text comes back from JSON storage as a date.
        FieldValue::Date(date) => Some(date.format("%Y-%m-%d").to_string()),
        FieldValue::Number(_) => None,
    }
}

fn parse_numeric_text(text: &str) -> f64 {
    let cleaned: String = text
        .chars()
        .filter(|ch| !matches!(ch, '$' | '€' | '£' | '¥' | ',' | '%') && !ch.is_whitespace())
        .collect();

    // Accounting exports write negatives as (12.00).
    let (negative, digits) = match cleaned.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, cleaned.as_str()),
    };

    match digits.parse::<f64>() {
        Ok(value) if value.is_finite() => {
            if negative {
                -value
            } else {
                value
            }
        }
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn currency_and_percent_formatting_is_stripped() {
        assert_eq!(number(&FieldValue::from("$1,234.50")), 1234.5);
        assert_eq!(number(&FieldValue::from("12.5%")), 12.5);
        assert_eq!(number(&FieldValue::from(" € 3 400 ")), 3400.0);
        assert_eq!(number(&FieldValue::from("(12.00)")), -12.0);
    }

    #[test]
    fn unparseable_numbers_read_as_zero() {
        assert_eq!(number(&FieldValue::from("n/a")), 0.0);
        assert_eq!(number(&FieldValue::from("")), 0.0);
        assert_eq!(number(&FieldValue::Number(f64::NAN)), 0.0);
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).expect("date");
        assert_eq!(number(&FieldValue::Date(date)), 0.0);
    }

    #[test]
    fn counts_round_and_never_go_negative() {
        assert_eq!(count(&FieldValue::from("1,024")), 1024);
        assert_eq!(count(&FieldValue::Number(2.6)), 3);
        assert_eq!(count(&FieldValue::Number(-4.0)), 0);
    }

    #[test]
    fn dates_accept_us_and_iso_forms() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 7).expect("date");
        assert_eq!(date(&FieldValue::from("03/07/2024")), Some(expected));
        assert_eq!(date(&FieldValue::from("3/7/2024")), Some(expected));
        assert_eq!(date(&FieldValue::from("2024-03-07")), Some(expected));
        assert_eq!(date(&FieldValue::Date(expected)), Some(expected));
        assert_eq!(date(&FieldValue::from("March 7th")), None);
        assert_eq!(date(&FieldValue::Number(45_000.0)), None);
    }

    #[test]
    fn two_digit_years_land_in_the_current_century() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 2).expect("date");
        assert_eq!(date(&FieldValue::from("01/02/24")), Some(expected));
        assert_eq!(date(&FieldValue::from("01/02/2024")), Some(expected));
        assert_eq!(date(&FieldValue::from("01/02/202")), None);
        assert_eq!(date(&FieldValue::from("24-01-02")), None);
    }

    #[test]
    fn date_shaped_text_survives_a_json_round_trip() {
        let encoded = serde_json::to_string(&FieldValue::from("2024-03-01")).expect("encode");
        let stored: FieldValue = serde_json::from_str(&encoded).expect("decode");

        assert!(matches!(stored, FieldValue::Date(_)));
        assert_eq!(text(&stored), Some("2024-03-01".to_string()));
    }
}
