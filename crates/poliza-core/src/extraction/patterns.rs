//! Regex patterns used by the value normalizers.
//!
//! Field-extraction patterns live in the catalog; these are the fixed
//! shapes the normalizers recognize regardless of document type.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Currency symbols, codes and whitespace stripped before parsing a number
    pub static ref CURRENCY_NOISE: Regex = Regex::new(
        r"(?i)MXN|USD|EUR|M\.\s?N\.|[$€£]|\s"
    ).unwrap();

    // 7, +7, 7.5, 7., .5
    pub static ref PLAIN_NUMBER: Regex = Regex::new(
        r"^\+?(?:\d+(?:\.\d*)?|\.\d+)$"
    ).unwrap();

    /// Canonical currency output.
    pub static ref CURRENCY_FORMAT: Regex = Regex::new(
        r"^\d+\.\d{2}$"
    ).unwrap();

    // 03/04/2025, 3-4-2025, 03.04.2025
    pub static ref DATE_NUMERIC: Regex = Regex::new(
        r"^(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{4})$"
    ).unwrap();

    // 03/ABR/2025, 03-abr-2025, 03 ABR 2025
    pub static ref DATE_ABBREVIATED: Regex = Regex::new(
        r"^(\d{1,2})[/.\-\s](\p{L}{3,4})\.?[/.\-\s](\d{4})$"
    ).unwrap();

    // 3 de abril de 2025, 3 de abril del 2025
    pub static ref DATE_TEXTUAL: Regex = Regex::new(
        r"(?i)^(\d{1,2})\s+de\s+(\p{L}+)\s+del?\s+(\d{4})$"
    ).unwrap();
}
