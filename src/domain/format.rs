//! Display formatters for form fields.
//!
//! Every function here is total: malformed, partial or non-textual input
//! degrades to an empty string (or zero for amounts) instead of failing, so
//! they can run on every keystroke. Digit-based masks strip non-digits first,
//! which also makes them idempotent on their own output.

use crate::domain::input::FieldInput;
use chrono::NaiveDate;

const NBSP: char = '\u{a0}';

/// Number and date conventions for a supported locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocaleFormat {
    /// Thousands separator
    pub group: char,
    /// Decimal separator
    pub decimal: char,
    /// Whether the currency symbol precedes the amount
    pub symbol_first: bool,
    /// Whether a non-breaking space separates the number from `%`
    pub spaced_percent: bool,
    /// `chrono` format string for calendar dates
    pub date_pattern: &'static str,
}

const EN_US: LocaleFormat = LocaleFormat {
    group: ',',
    decimal: '.',
    symbol_first: true,
    spaced_percent: false,
    date_pattern: "%m/%d/%Y",
};

const PT_BR: LocaleFormat = LocaleFormat {
    group: '.',
    decimal: ',',
    symbol_first: true,
    spaced_percent: false,
    date_pattern: "%d/%m/%Y",
};

const DE_DE: LocaleFormat = LocaleFormat {
    group: '.',
    decimal: ',',
    symbol_first: false,
    spaced_percent: true,
    date_pattern: "%d.%m.%Y",
};

impl LocaleFormat {
    /// Resolve a BCP 47 tag (`pt-BR`, `en`, `de_DE`). Unknown tags use `en-US`.
    pub fn for_tag(tag: &str) -> Self {
        let language = tag
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match language.as_str() {
            "pt" => PT_BR,
            "de" => DE_DE,
            _ => EN_US,
        }
    }

    fn is_pt(&self) -> bool {
        *self == PT_BR
    }
}

/// Currency symbol for an ISO 4217 code, if it has a well-known one.
fn currency_symbol(code: &str) -> Option<&'static str> {
    match code.to_ascii_uppercase().as_str() {
        "BRL" => Some("R$"),
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        _ => None,
    }
}

/// Strip everything but ASCII digits.
pub fn digits_only<T: FieldInput + ?Sized>(raw: &T) -> String {
    raw.as_text()
        .map(|text| text.chars().filter(char::is_ascii_digit).collect())
        .unwrap_or_default()
}

fn group_digits(digits: &str, separator: char) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(c);
    }
    out
}

/// Format a monetary amount with exactly two fraction digits.
///
/// Non-numeric and non-finite input is treated as zero.
///
/// ```
/// use storefront_forms::format_currency;
///
/// assert_eq!(format_currency(&1234.5, "pt-BR", "BRL"), "R$\u{a0}1.234,50");
/// assert_eq!(format_currency(&1234.5, "en-US", "USD"), "$1,234.50");
/// assert_eq!(format_currency("oops", "en-US", "USD"), "$0.00");
/// ```
pub fn format_currency<T: FieldInput + ?Sized>(value: &T, locale: &str, currency: &str) -> String {
    let locale = LocaleFormat::for_tag(locale);
    let amount = value.as_number().unwrap_or(0.0);

    let fixed = format!("{:.2}", amount.abs());
    let (integer, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let number = format!(
        "{}{}{cents}",
        group_digits(integer, locale.group),
        locale.decimal
    );
    let is_zero = integer == "0" && cents == "00";
    let sign = if amount < 0.0 && !is_zero { "-" } else { "" };

    let (symbol, known) = match currency_symbol(currency) {
        Some(symbol) => (symbol.to_string(), true),
        None => (currency.to_ascii_uppercase(), false),
    };

    if locale.symbol_first {
        // pt-BR always separates the symbol; en-US only separates bare codes
        if locale.is_pt() || !known {
            format!("{sign}{symbol}{NBSP}{number}")
        } else {
            format!("{sign}{symbol}{number}")
        }
    } else {
        format!("{sign}{number}{NBSP}{symbol}")
    }
}

/// Format a ratio (`0.125`) as a percentage (`12.5%`).
///
/// At most two fraction digits are kept and trailing zeros are trimmed.
pub fn format_percent<T: FieldInput + ?Sized>(ratio: &T, locale: &str) -> String {
    let locale = LocaleFormat::for_tag(locale);
    let percent = ratio.as_number().unwrap_or(0.0) * 100.0;

    let mut number = format!("{percent:.2}");
    if number.contains('.') {
        number = number.trim_end_matches('0').trim_end_matches('.').to_string();
    }
    if number == "-0" {
        number = "0".to_string();
    }
    let (integer, fraction) = match number.split_once('.') {
        Some((integer, fraction)) => (integer.to_string(), Some(fraction.to_string())),
        None => (number, None),
    };
    let (sign, integer) = match integer.strip_prefix('-') {
        Some(rest) => ("-", rest.to_string()),
        None => ("", integer),
    };

    let mut out = format!("{sign}{}", group_digits(&integer, locale.group));
    if let Some(fraction) = fraction {
        out.push(locale.decimal);
        out.push_str(&fraction);
    }
    if locale.spaced_percent {
        out.push(NBSP);
    }
    out.push('%');
    out
}

/// Format a calendar date in the locale's numeric order.
pub fn format_date(date: NaiveDate, locale: &str) -> String {
    date.format(LocaleFormat::for_tag(locale).date_pattern)
        .to_string()
}

/// Mask a Brazilian postal code as `XXXXX-XXX`.
///
/// Up to five digits are returned unchanged; digits beyond eight are dropped.
pub fn format_cep<T: FieldInput + ?Sized>(raw: &T) -> String {
    let digits = digits_only(raw);
    if digits.len() <= 5 {
        return digits;
    }
    let end = digits.len().min(8);
    format!("{}-{}", &digits[..5], &digits[5..end])
}

/// Progressive phone mask: `(DD`, `(DD) DDDD`, `(DD) DDDD-DDDD`, `(DD) DDDDD-DDDD`.
///
/// ```
/// use storefront_forms::format_phone;
///
/// assert_eq!(format_phone("11"), "(11");
/// assert_eq!(format_phone("1133334444"), "(11) 3333-4444");
/// assert_eq!(format_phone("11999999999"), "(11) 99999-9999");
/// ```
pub fn format_phone<T: FieldInput + ?Sized>(raw: &T) -> String {
    let mut digits = digits_only(raw);
    digits.truncate(11);

    match digits.len() {
        0 => String::new(),
        1..=2 => format!("({digits}"),
        3..=6 => format!("({}) {}", &digits[..2], &digits[2..]),
        7..=10 => format!("({}) {}-{}", &digits[..2], &digits[2..6], &digits[6..]),
        _ => format!("({}) {}-{}", &digits[..2], &digits[2..7], &digits[7..]),
    }
}

/// Mask a taxpayer document: CPF (`XXX.XXX.XXX-XX`) up to eleven digits,
/// CNPJ (`XX.XXX.XXX/XXXX-XX`) beyond that.
pub fn format_document<T: FieldInput + ?Sized>(raw: &T) -> String {
    let mut digits = digits_only(raw);

    // (position, separator) pairs inserted before the digit at that index
    let layout: &[(usize, char)] = if digits.len() <= 11 {
        &[(3, '.'), (6, '.'), (9, '-')]
    } else {
        digits.truncate(14);
        &[(2, '.'), (5, '.'), (8, '/'), (12, '-')]
    };

    let mut out = String::with_capacity(digits.len() + layout.len());
    for (i, c) in digits.chars().enumerate() {
        if let Some((_, separator)) = layout.iter().find(|(at, _)| *at == i) {
            out.push(*separator);
        }
        out.push(c);
    }
    out
}

/// Group a card number into blocks of four, truncating beyond sixteen digits.
pub fn format_card_number<T: FieldInput + ?Sized>(raw: &T) -> String {
    let mut digits = digits_only(raw);
    digits.truncate(16);

    digits
        .as_bytes()
        .chunks(4)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Progressive `MM/YY` mask for card expiry input.
pub fn format_card_expiry<T: FieldInput + ?Sized>(raw: &T) -> String {
    let mut digits = digits_only(raw);
    digits.truncate(4);
    if digits.len() <= 2 {
        return digits;
    }
    format!("{}/{}", &digits[..2], &digits[2..])
}

/// Truncate to at most `max_chars` characters, ending with `…` when cut.
pub fn truncate_text<T: FieldInput + ?Sized>(text: &T, max_chars: usize) -> String {
    let Some(text) = text.as_text() else {
        return String::new();
    };
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }

    let kept: String = text.chars().take(max_chars - 1).collect();
    format!("{}…", kept.trim_end())
}
