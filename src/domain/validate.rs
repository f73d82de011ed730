//! Field-level validators.
//!
//! Validators never fail: missing, `null` or non-textual input is simply
//! invalid. Formatting characters (dots, dashes, spaces) are stripped before
//! checksum-style checks, so masked and raw input validate identically.

use crate::domain::card::CardBrand;
use crate::domain::format::digits_only;
use crate::domain::input::FieldInput;
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

// optional country code, area code, 4-5 + 4 digit subscriber number
static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\+?\d{2}\s?)?(?:\(\d{2}\)|\d{2})\s?\d{4,5}-?\d{4}$").expect("phone pattern compiles")
});

static EXPIRY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{2})/(\d{2})$").expect("expiry pattern compiles"));

/// Years ahead of today that a card expiry may still be considered plausible.
pub const MAX_EXPIRY_YEARS_AHEAD: i32 = 20;

fn digit_values(digits: &str) -> Vec<u32> {
    digits.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn all_same(digits: &[u32]) -> bool {
    digits.windows(2).all(|pair| pair[0] == pair[1])
}

/// Conservative `local@domain.tld` shape check on trimmed input.
pub fn is_valid_email<T: FieldInput + ?Sized>(input: &T) -> bool {
    input
        .as_text()
        .is_some_and(|text| EMAIL_RE.is_match(text.trim()))
}

/// Brazilian individual taxpayer ID (CPF) with both check digits.
///
/// ```
/// use storefront_forms::is_valid_cpf;
///
/// assert!(is_valid_cpf("529.982.247-25"));
/// assert!(!is_valid_cpf("111.111.111-11"));
/// ```
pub fn is_valid_cpf<T: FieldInput + ?Sized>(input: &T) -> bool {
    let digits = digit_values(&digits_only(input));
    if digits.len() != 11 || all_same(&digits) {
        return false;
    }

    let check = |len: usize| {
        let sum: u32 = digits[..len]
            .iter()
            .zip((2..=len as u32 + 1).rev())
            .map(|(d, weight)| d * weight)
            .sum();
        match (sum * 10) % 11 {
            10 => 0,
            rest => rest,
        }
    };

    check(9) == digits[9] && check(10) == digits[10]
}

/// Brazilian company taxpayer ID (CNPJ) with both check digits.
pub fn is_valid_cnpj<T: FieldInput + ?Sized>(input: &T) -> bool {
    const FIRST: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
    const SECOND: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

    let digits = digit_values(&digits_only(input));
    if digits.len() != 14 || all_same(&digits) {
        return false;
    }

    let check = |weights: &[u32]| {
        let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
        match sum % 11 {
            0 | 1 => 0,
            rest => 11 - rest,
        }
    };

    check(&FIRST[..]) == digits[12] && check(&SECOND[..]) == digits[13]
}

/// Brazilian postal code: exactly eight digits once formatting is removed.
pub fn is_valid_cep<T: FieldInput + ?Sized>(input: &T) -> bool {
    input.as_text().is_some() && digits_only(input).len() == 8
}

/// Phone shape: optional country code, two-digit area code and a
/// 4-5 + 4 digit subscriber number.
pub fn is_valid_phone<T: FieldInput + ?Sized>(input: &T) -> bool {
    input
        .as_text()
        .is_some_and(|text| PHONE_RE.is_match(text.trim()))
}

/// Card number integrity via the Luhn checksum (13 to 19 digits).
///
/// ```
/// use storefront_forms::is_valid_credit_card;
///
/// assert!(is_valid_credit_card("4532 0151 1283 0366"));
/// assert!(!is_valid_credit_card("1234567890123456"));
/// ```
pub fn is_valid_credit_card<T: FieldInput + ?Sized>(input: &T) -> bool {
    let digits = digit_values(&digits_only(input));
    if !(13..=19).contains(&digits.len()) {
        return false;
    }

    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();

    sum % 10 == 0
}

/// Security code length check: four digits for Amex, three for other known
/// brands, three or four when the brand is unknown.
pub fn is_valid_cvv<T: FieldInput + ?Sized>(input: &T, brand: Option<CardBrand>) -> bool {
    let Some(text) = input.as_text() else {
        return false;
    };
    let text = text.trim();
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    match brand {
        Some(brand) => text.len() == brand.cvv_length(),
        None => (3..=4).contains(&text.len()),
    }
}

/// Parse an `MM/YY` expiry into `(month, four-digit year)`.
///
/// Returns `None` for malformed input or a month outside `01..=12`.
pub fn parse_card_expiry<T: FieldInput + ?Sized>(input: &T) -> Option<(u32, i32)> {
    let text = input.as_text()?;
    let captures = EXPIRY_RE.captures(text.trim())?;
    let month: u32 = captures[1].parse().ok()?;
    let year: i32 = captures[2].parse().ok()?;
    (1..=12).contains(&month).then_some((month, 2000 + year))
}

/// A real `MM/YY` expiry that is neither in the past relative to `today`
/// nor implausibly far in the future.
pub fn is_valid_card_expiry<T: FieldInput + ?Sized>(input: &T, today: NaiveDate) -> bool {
    parse_card_expiry(input).is_some_and(|(month, year)| {
        (year, month) >= (today.year(), today.month())
            && year <= today.year() + MAX_EXPIRY_YEARS_AHEAD
    })
}

/// Overall strength bucket for a password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StrengthLevel {
    Weak,
    Medium,
    Strong,
}

/// Result of a password strength check.
///
/// Collects every violated requirement so a form can show them all at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordStrength {
    violations: Vec<String>,
    level: StrengthLevel,
}

impl PasswordStrength {
    /// Whether all requirements are met.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Human-readable descriptions of each unmet requirement.
    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    /// Strength bucket. Any violation makes a password `Weak`.
    pub fn level(&self) -> StrengthLevel {
        self.level
    }
}

/// Minimum password length accepted by [`is_strong_password`].
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Check a password against the length and character-class requirements.
///
/// ```
/// use storefront_forms::is_strong_password;
///
/// let result = is_strong_password("abc");
/// assert!(!result.is_valid());
/// assert_eq!(result.violations().len(), 3);
/// ```
pub fn is_strong_password<T: FieldInput + ?Sized>(input: &T) -> PasswordStrength {
    let password = input.as_text().unwrap_or_default();
    let mut violations = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        violations.push(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        ));
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        violations.push("Password must contain a lowercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        violations.push("Password must contain an uppercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        violations.push("Password must contain a number".to_string());
    }

    let has_special = password.chars().any(|c| !c.is_alphanumeric());
    let level = if !violations.is_empty() {
        StrengthLevel::Weak
    } else if password.chars().count() >= 12 && has_special {
        StrengthLevel::Strong
    } else {
        StrengthLevel::Medium
    };

    PasswordStrength { violations, level }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_email() {
        assert!(is_valid_email("ana@loja.com.br"));
        assert!(is_valid_email("  ana@loja.com  "));
        assert!(!is_valid_email("ana@loja"));
        assert!(!is_valid_email("ana loja@x.com"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email(&json!(null)));
        assert!(!is_valid_email(&json!(42)));
        assert!(!is_valid_email(&None::<String>));
    }

    #[test]
    fn test_cpf() {
        assert!(is_valid_cpf("529.982.247-25"));
        assert!(is_valid_cpf("52998224725"));
        assert!(!is_valid_cpf("529.982.247-26"));
        assert!(!is_valid_cpf("111.111.111-11"));
        assert!(!is_valid_cpf("000.000.000-00"));
        assert!(!is_valid_cpf("5299822472"));
        assert!(!is_valid_cpf(&json!(52998224725_u64)));
    }

    #[test]
    fn test_cnpj() {
        assert!(is_valid_cnpj("11.222.333/0001-81"));
        assert!(!is_valid_cnpj("11.222.333/0001-82"));
        assert!(!is_valid_cnpj("11111111111111"));
        assert!(!is_valid_cnpj("1122233300018"));
    }

    #[test]
    fn test_cep() {
        assert!(is_valid_cep("01310-100"));
        assert!(is_valid_cep("01310100"));
        assert!(!is_valid_cep("0131010"));
        assert!(!is_valid_cep("013101000"));
        assert!(!is_valid_cep(&json!(null)));
    }

    #[test]
    fn test_phone() {
        assert!(is_valid_phone("(11) 99999-9999"));
        assert!(is_valid_phone("(11) 3333-4444"));
        assert!(is_valid_phone("11999999999"));
        assert!(is_valid_phone("+55 11 99999-9999"));
        assert!(is_valid_phone("+55 (11) 3333-4444"));
        assert!(!is_valid_phone("9999-9999"));
        assert!(!is_valid_phone("(11) 999-9999"));
        assert!(!is_valid_phone("phone"));
        assert!(!is_valid_phone("(11 99999-9999"));
        assert!(!is_valid_phone("11) 99999-9999"));
    }

    #[test]
    fn test_luhn() {
        assert!(is_valid_credit_card("4532015112830366"));
        assert!(is_valid_credit_card("4532 0151 1283 0366"));
        assert!(is_valid_credit_card("378282246310005"));
        assert!(!is_valid_credit_card("1234567890123456"));
        assert!(!is_valid_credit_card("4532015112830367"));
        // too short / too long even if the checksum works out
        assert!(!is_valid_credit_card("0"));
        assert!(!is_valid_credit_card("00000000000000000000"));
        assert!(!is_valid_credit_card(&json!(4532015112830366_u64)));
    }

    #[test]
    fn test_cvv() {
        assert!(is_valid_cvv("123", Some(CardBrand::Visa)));
        assert!(!is_valid_cvv("1234", Some(CardBrand::Visa)));
        assert!(is_valid_cvv("1234", Some(CardBrand::Amex)));
        assert!(is_valid_cvv("1234", None));
        assert!(!is_valid_cvv("12a", None));
        assert!(!is_valid_cvv("", None));
    }

    #[test]
    fn test_expiry() {
        let today = date(2026, 10, 17);
        assert_eq!(parse_card_expiry("10/26"), Some((10, 2026)));
        assert_eq!(parse_card_expiry("13/30"), None);
        assert_eq!(parse_card_expiry("00/30"), None);
        assert_eq!(parse_card_expiry("1/30"), None);

        assert!(is_valid_card_expiry("10/26", today));
        assert!(is_valid_card_expiry("01/30", today));
        assert!(!is_valid_card_expiry("09/26", today));
        assert!(!is_valid_card_expiry("13/30", today));
        assert!(!is_valid_card_expiry("12/99", today));
    }

    #[test]
    fn test_password_collects_all_violations() {
        let result = is_strong_password("");
        assert_eq!(result.violations().len(), 4);
        assert_eq!(result.level(), StrengthLevel::Weak);

        let result = is_strong_password("abcdefgh");
        assert_eq!(
            result.violations(),
            &[
                "Password must contain an uppercase letter".to_string(),
                "Password must contain a number".to_string(),
            ]
        );
    }

    #[test]
    fn test_password_levels() {
        assert_eq!(is_strong_password("Abcdefg1").level(), StrengthLevel::Medium);
        assert_eq!(is_strong_password("Abcdefg1!xyz").level(), StrengthLevel::Strong);
        assert!(is_strong_password("Abcdefg1").is_valid());
        assert!(!is_strong_password(&json!(null)).is_valid());
    }
}
