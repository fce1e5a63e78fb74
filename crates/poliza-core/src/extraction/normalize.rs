//! Value normalizers: numbers, dates, free text and enumerations.
//!
//! All functions are lenient. A value that does not fit its kind comes back
//! cleaned but otherwise unchanged, and [`normalize_value`] flags it as a miss.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use super::patterns::{
    CURRENCY_FORMAT, CURRENCY_NOISE, DATE_ABBREVIATED, DATE_NUMERIC, DATE_TEXTUAL, PLAIN_NUMBER,
};
use crate::catalog::{EnumSpec, ValueKind};

/// A normalized value and whether it failed to parse as its declared kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub value: String,
    pub miss: bool,
}

impl Normalized {
    fn hit(value: String) -> Self {
        Self { value, miss: false }
    }

    fn miss(value: String) -> Self {
        Self { value, miss: true }
    }
}

/// Normalize `raw` according to `kind`.
pub fn normalize_value(raw: &str, kind: &ValueKind, max_len: Option<usize>) -> Normalized {
    match kind {
        ValueKind::Text => Normalized::hit(normalize_text(raw, max_len)),
        ValueKind::Currency => {
            let value = normalize_number(raw);
            if CURRENCY_FORMAT.is_match(&value) {
                Normalized::hit(value)
            } else {
                Normalized::miss(value)
            }
        }
        ValueKind::Date => match parse_date(raw) {
            Some(value) => Normalized::hit(value),
            None => Normalized::miss(normalize_text(raw, None)),
        },
        ValueKind::Enumerated(spec) => normalize_enum(raw, spec),
    }
}

/// Strip currency symbols, codes, whitespace and thousands separators, then
/// format with exactly two decimals. Non-numeric input is returned stripped.
pub fn normalize_number(raw: &str) -> String {
    let mut stripped = raw.to_string();
    loop {
        let next = CURRENCY_NOISE.replace_all(&stripped, "").into_owned();
        if next == stripped {
            break;
        }
        stripped = next;
    }

    let digits = stripped.replace(',', "");
    if PLAIN_NUMBER.is_match(&digits) {
        if let Ok(amount) = Decimal::from_str(&canonical_digits(&digits)) {
            return format_amount(amount);
        }
    }

    stripped
}

/// Rewrite `+7`, `.5` and `5.` as `7`, `0.5` and `5` for the decimal parser.
fn canonical_digits(digits: &str) -> String {
    let unsigned = digits.trim_start_matches('+').trim_end_matches('.');
    if unsigned.starts_with('.') {
        format!("0{unsigned}")
    } else {
        unsigned.to_string()
    }
}

/// Parse a value as an amount, accepting anything [`normalize_number`] can format.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let normalized = normalize_number(raw);
    if CURRENCY_FORMAT.is_match(&normalized) {
        Decimal::from_str(&normalized).ok()
    } else {
        None
    }
}

/// Render an amount with exactly two decimals, rounding half away from zero.
pub fn format_amount(amount: Decimal) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded.to_string()
}

/// Convert a Spanish-locale date to `dd/mm/yyyy`. Unrecognized or impossible
/// dates come back whitespace-collapsed.
pub fn normalize_date(raw: &str) -> String {
    parse_date(raw).unwrap_or_else(|| normalize_text(raw, None))
}

/// `dd/mm/yyyy` for a date chrono accepts, else `None`.
fn parse_date(raw: &str) -> Option<String> {
    let cleaned = normalize_text(raw, None);

    let parts = if let Some(caps) = DATE_NUMERIC.captures(&cleaned) {
        caps[2].parse::<u32>().ok().map(|m| (caps[1].to_string(), m, caps[3].to_string()))
    } else if let Some(caps) = DATE_ABBREVIATED.captures(&cleaned) {
        month_abbreviation(&caps[2]).map(|m| (caps[1].to_string(), m, caps[3].to_string()))
    } else if let Some(caps) = DATE_TEXTUAL.captures(&cleaned) {
        month_name(&caps[2]).map(|m| (caps[1].to_string(), m, caps[3].to_string()))
    } else {
        None
    };

    parts
        .and_then(|(day, month, year)| {
            let day: u32 = day.parse().ok()?;
            let year: i32 = year.parse().ok()?;
            NaiveDate::from_ymd_opt(year, month, day)
        })
        .map(|date| date.format("%d/%m/%Y").to_string())
}

/// Collapse whitespace runs, trim, and truncate to `max_len` characters.
pub fn normalize_text(raw: &str, max_len: Option<usize>) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    match max_len {
        Some(limit) if collapsed.chars().count() > limit => collapsed
            .chars()
            .take(limit)
            .collect::<String>()
            .trim_end()
            .to_string(),
        _ => collapsed,
    }
}

/// Map `raw` onto the closed vocabulary of `spec`.
pub fn normalize_enum(raw: &str, spec: &EnumSpec) -> Normalized {
    let cleaned = normalize_text(raw, None);
    let key = fold(&cleaned);

    if let Some(target) = spec
        .aliases
        .iter()
        .find(|(alias, _)| fold(alias) == key)
        .map(|(_, target)| target)
    {
        return Normalized::hit(target.clone());
    }

    match spec.values.iter().find(|value| fold(value) == key) {
        Some(value) => Normalized::hit(value.clone()),
        None => Normalized::miss(cleaned),
    }
}

/// Uppercase and strip Spanish diacritics for comparisons.
pub fn fold(value: &str) -> String {
    value
        .trim()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'Á' | 'À' | 'Ä' => 'A',
            'é' | 'è' | 'ë' | 'É' | 'È' | 'Ë' => 'E',
            'í' | 'ì' | 'ï' | 'Í' | 'Ì' | 'Ï' => 'I',
            'ó' | 'ò' | 'ö' | 'Ó' | 'Ò' | 'Ö' => 'O',
            'ú' | 'ù' | 'ü' | 'Ú' | 'Ù' | 'Ü' => 'U',
            'ñ' | 'Ñ' => 'N',
            other => other,
        })
        .flat_map(char::to_uppercase)
        .collect()
}

fn month_name(name: &str) -> Option<u32> {
    let month = match fold(name).as_str() {
        "ENERO" => 1,
        "FEBRERO" => 2,
        "MARZO" => 3,
        "ABRIL" => 4,
        "MAYO" => 5,
        "JUNIO" => 6,
        "JULIO" => 7,
        "AGOSTO" => 8,
        "SEPTIEMBRE" | "SETIEMBRE" => 9,
        "OCTUBRE" => 10,
        "NOVIEMBRE" => 11,
        "DICIEMBRE" => 12,
        _ => return None,
    };
    Some(month)
}

fn month_abbreviation(abbr: &str) -> Option<u32> {
    let month = match fold(abbr).as_str() {
        "ENE" => 1,
        "FEB" => 2,
        "MAR" => 3,
        "ABR" => 4,
        "MAY" => 5,
        "JUN" => 6,
        "JUL" => 7,
        "AGO" => 8,
        "SEP" | "SET" | "SEPT" => 9,
        "OCT" => 10,
        "NOV" => 11,
        "DIC" => 12,
        _ => return None,
    };
    Some(month)
}
