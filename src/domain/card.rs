//! Payment card classification.
//!
//! Brand detection is a prefix match against issuer ranges. The Elo and
//! Hipercard BIN lists are literal tables that must be kept in sync with the
//! issuers; they are not exhaustive.

use crate::domain::format::digits_only;
use crate::domain::input::FieldInput;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Card network derived from the leading digits of a card number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardBrand {
    Visa,
    Mastercard,
    Amex,
    Discover,
    Jcb,
    Diners,
    Elo,
    Maestro,
    Hipercard,
}

impl CardBrand {
    /// Lowercase identifier used in payloads (`"visa"`, `"amex"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            CardBrand::Visa => "visa",
            CardBrand::Mastercard => "mastercard",
            CardBrand::Amex => "amex",
            CardBrand::Discover => "discover",
            CardBrand::Jcb => "jcb",
            CardBrand::Diners => "diners",
            CardBrand::Elo => "elo",
            CardBrand::Maestro => "maestro",
            CardBrand::Hipercard => "hipercard",
        }
    }

    /// Number of digits in the security code printed on this brand's cards.
    pub fn cvv_length(&self) -> usize {
        match self {
            CardBrand::Amex => 4,
            _ => 3,
        }
    }
}

impl fmt::Display for CardBrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Elo BINs. Checked before Visa/Mastercard/Discover, whose ranges overlap them.
pub const ELO_BINS: &[&str] = &[
    "401178", "401179", "431274", "438935", "451416", "457393", "457631", "457632", "504175",
    "506699", "5067", "509", "627780", "636297", "636368", "650031", "650032", "650033",
    "650035", "650051", "650405", "650439", "650485", "650538", "650541", "650598", "650700",
    "650718", "650720", "650727", "650901", "650978", "651652", "655000", "655021",
];

/// Hipercard BINs.
pub const HIPERCARD_BINS: &[&str] = &["606282", "3841", "637095", "637568", "637599", "637609", "637612"];

const MAESTRO_PREFIXES: &[&str] = &["5018", "5020", "5038", "5893", "6304", "6759", "6761", "6762", "6763"];

fn in_range(digits: &str, len: usize, low: u32, high: u32) -> bool {
    digits
        .get(..len)
        .and_then(|prefix| prefix.parse::<u32>().ok())
        .is_some_and(|prefix| (low..=high).contains(&prefix))
}

/// Detect the card brand from the number's prefix.
///
/// Formatting characters are ignored. Returns `None` when no issuer range
/// matches, including for empty or non-textual input.
///
/// ```
/// use storefront_forms::{detect_card_brand, CardBrand};
///
/// assert_eq!(detect_card_brand("4532 0151 1283 0366"), Some(CardBrand::Visa));
/// assert_eq!(detect_card_brand("6362970000457013"), Some(CardBrand::Elo));
/// assert_eq!(detect_card_brand("9999"), None);
/// ```
pub fn detect_card_brand<T: FieldInput + ?Sized>(number: &T) -> Option<CardBrand> {
    let digits = digits_only(number);
    if digits.is_empty() {
        return None;
    }
    let starts = |prefixes: &[&str]| prefixes.iter().any(|p| digits.starts_with(p));

    if starts(ELO_BINS) {
        return Some(CardBrand::Elo);
    }
    if starts(HIPERCARD_BINS) {
        return Some(CardBrand::Hipercard);
    }
    if digits.starts_with("34") || digits.starts_with("37") {
        return Some(CardBrand::Amex);
    }
    if in_range(&digits, 3, 300, 305) || digits.starts_with("36") || digits.starts_with("38") {
        return Some(CardBrand::Diners);
    }
    if in_range(&digits, 4, 3528, 3589) {
        return Some(CardBrand::Jcb);
    }
    if starts(MAESTRO_PREFIXES) {
        return Some(CardBrand::Maestro);
    }
    if in_range(&digits, 2, 51, 55) || in_range(&digits, 4, 2221, 2720) {
        return Some(CardBrand::Mastercard);
    }
    if digits.starts_with("6011") || digits.starts_with("65") || in_range(&digits, 3, 644, 649) {
        return Some(CardBrand::Discover);
    }
    if digits.starts_with('4') {
        return Some(CardBrand::Visa);
    }
    None
}
