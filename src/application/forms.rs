//! Predefined storefront form schemas and their typed payloads.
//!
//! Schemas are built once on first use. Field paths use the camelCase names
//! the storefront's forms submit.

use crate::application::schema::{lookup, Coercion, Field, Refinement, Rule, Schema};
use crate::domain::card::detect_card_brand;
use crate::domain::sanitize::detect_xss;
use crate::domain::validate::{
    is_strong_password, is_valid_cep, is_valid_cpf, is_valid_credit_card, is_valid_cvv,
    is_valid_email, is_valid_phone, parse_card_expiry, MAX_EXPIRY_YEARS_AHEAD,
};
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Brazilian federative unit codes accepted by the address form.
pub const BRAZILIAN_STATES: &[&str] = &[
    "AC", "AL", "AP", "AM", "BA", "CE", "DF", "ES", "GO", "MA", "MT", "MS", "MG", "PA", "PB", "PR",
    "PE", "PI", "RJ", "RN", "RS", "RO", "RR", "SC", "SP", "SE", "TO",
];

static PERSON_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L} .'-]+$").expect("name pattern compiles"));

static CVV_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{3,4}$").expect("cvv pattern compiles"));

fn email_field(path: &str) -> Field {
    Field::text(path)
        .required_message("Email is required")
        .rule(Rule::max_length(254, "Email is too long"))
        .rule(Rule::check(|s| is_valid_email(s), "Invalid email address"))
}

fn name_field(path: &str) -> Field {
    Field::text(path)
        .required_message("Name is required")
        .rule(Rule::min_length(2, "Name must be at least 2 characters"))
        .rule(Rule::max_length(100, "Name must be at most 100 characters"))
}

fn not_expired(expiry: &str, today: NaiveDate) -> bool {
    parse_card_expiry(expiry)
        .is_some_and(|(month, year)| (year, month) >= (today.year(), today.month()))
}

fn within_expiry_horizon(expiry: &str, today: NaiveDate) -> bool {
    parse_card_expiry(expiry).is_some_and(|(_, year)| year <= today.year() + MAX_EXPIRY_YEARS_AHEAD)
}

static LOGIN: Lazy<Schema> = Lazy::new(|| {
    Schema::new("login")
        .field(email_field("email"))
        .field(Field::text("password").required_message("Password is required"))
        .field(Field::new("remember", Coercion::Boolean).optional())
});

static REGISTER: Lazy<Schema> = Lazy::new(|| {
    Schema::new("register")
        .field(name_field("name"))
        .field(email_field("email"))
        .field(
            Field::text("password")
                .required_message("Password is required")
                .rule(Rule::check(
                    |s| is_strong_password(s).is_valid(),
                    "Password must have at least 8 characters, with uppercase, lowercase and a number",
                )),
        )
        .field(Field::text("confirmPassword").required_message("Please confirm your password"))
        .field(
            Field::new("acceptTerms", Coercion::Boolean)
                .required_message("You must accept the terms")
                .rule(Rule::accepted("You must accept the terms")),
        )
        .refine(Refinement::matches(
            "confirmPassword",
            "password",
            "Passwords do not match",
        ))
});

static ADDRESS: Lazy<Schema> = Lazy::new(|| {
    Schema::new("address")
        .field(
            Field::new("cep", Coercion::Digits)
                .required_message("CEP is required")
                .rule(Rule::check(|s| is_valid_cep(s), "Invalid CEP")),
        )
        .field(
            Field::text("street")
                .required_message("Street is required")
                .rule(Rule::min_length(3, "Street must be at least 3 characters"))
                .rule(Rule::max_length(200, "Street is too long")),
        )
        .field(
            Field::text("number")
                .required_message("Number is required")
                .rule(Rule::max_length(10, "Number is too long")),
        )
        .field(
            Field::text("complement")
                .optional()
                .rule(Rule::max_length(100, "Complement is too long")),
        )
        .field(
            Field::text("neighborhood")
                .required_message("Neighborhood is required")
                .rule(Rule::min_length(2, "Neighborhood must be at least 2 characters")),
        )
        .field(
            Field::text("city")
                .required_message("City is required")
                .rule(Rule::min_length(2, "City must be at least 2 characters")),
        )
        .field(
            Field::new("state", Coercion::Uppercase)
                .required_message("State is required")
                .rule(Rule::one_of(BRAZILIAN_STATES, "Invalid state")),
        )
});

static PAYMENT: Lazy<Schema> = Lazy::new(|| {
    Schema::new("payment")
        .field(
            Field::new("cardNumber", Coercion::Digits)
                .required_message("Card number is required")
                .rule(Rule::check(|s| is_valid_credit_card(s), "Invalid card number")),
        )
        .field(
            Field::new("cardName", Coercion::Uppercase)
                .required_message("Name on card is required")
                .rule(Rule::min_length(3, "Name on card must be at least 3 characters"))
                .rule(Rule::pattern(
                    PERSON_NAME_RE.clone(),
                    "Name on card may only contain letters",
                )),
        )
        .field(
            Field::text("expiry")
                .required_message("Expiry date is required")
                .rule(Rule::check(
                    |s| parse_card_expiry(s).is_some(),
                    "Invalid expiry date (MM/YY)",
                ))
                .rule(Rule::dated(not_expired, "Card has expired"))
                .rule(Rule::dated(
                    within_expiry_horizon,
                    "Expiry date is too far in the future",
                )),
        )
        .field(
            Field::new("cvv", Coercion::Digits)
                .required_message("CVV is required")
                .rule(Rule::pattern(CVV_RE.clone(), "Invalid CVV")),
        )
        .field(
            Field::new("installments", Coercion::Integer)
                .optional()
                .rule(Rule::range(1.0, 12.0, "Installments must be between 1 and 12")),
        )
        .refine(Refinement::new(
            "cvv",
            "Invalid CVV for this card",
            |form| {
                let brand = lookup(form, "cardNumber").and_then(|n| detect_card_brand(n));
                is_valid_cvv(&lookup(form, "cvv"), brand)
            },
        ))
});

static NEWSLETTER: Lazy<Schema> = Lazy::new(|| {
    Schema::new("newsletter")
        .field(email_field("email"))
        .field(
            Field::text("name")
                .optional()
                .rule(Rule::max_length(100, "Name must be at most 100 characters")),
        )
});

static CONTACT: Lazy<Schema> = Lazy::new(|| {
    Schema::new("contact")
        .field(name_field("name"))
        .field(email_field("email"))
        .field(
            Field::text("subject")
                .required_message("Subject is required")
                .rule(Rule::min_length(3, "Subject must be at least 3 characters"))
                .rule(Rule::max_length(120, "Subject must be at most 120 characters")),
        )
        .field(
            Field::text("message")
                .required_message("Message is required")
                .rule(Rule::min_length(10, "Message must be at least 10 characters"))
                .rule(Rule::max_length(2000, "Message must be at most 2000 characters"))
                .rule(Rule::check(
                    |s| !detect_xss(s),
                    "Message contains disallowed content",
                )),
        )
});

static PROFILE: Lazy<Schema> = Lazy::new(|| {
    Schema::new("profile")
        .field(name_field("name"))
        .field(email_field("email"))
        .field(
            Field::new("cpf", Coercion::Digits)
                .required_message("CPF is required")
                .rule(Rule::check(|s| is_valid_cpf(s), "Invalid CPF")),
        )
        .field(
            Field::new("phone", Coercion::Digits)
                .optional()
                .rule(Rule::check(|s| is_valid_phone(s), "Invalid phone number")),
        )
        .field(Field::new("newsletter", Coercion::Boolean).optional())
});

/// Email and password sign-in.
pub fn login() -> &'static Schema {
    &LOGIN
}

/// Account creation with password confirmation and terms acceptance.
pub fn register() -> &'static Schema {
    &REGISTER
}

/// Brazilian shipping address.
pub fn address() -> &'static Schema {
    &ADDRESS
}

/// Card payment step of checkout.
pub fn payment() -> &'static Schema {
    &PAYMENT
}

/// Newsletter signup.
pub fn newsletter() -> &'static Schema {
    &NEWSLETTER
}

/// Contact form; the free-text message is screened for script injection.
pub fn contact() -> &'static Schema {
    &CONTACT
}

/// Customer profile with CPF and optional phone.
pub fn profile() -> &'static Schema {
    &PROFILE
}

/// Validated login payload.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember: Option<bool>,
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("remember", &self.remember)
            .finish()
    }
}

/// Validated shipping address. `cep` holds digits only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressForm {
    pub cep: String,
    pub street: String,
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}

/// Validated card details. `Debug` masks everything but the last four digits.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentForm {
    pub card_number: String,
    pub card_name: String,
    pub expiry: String,
    pub cvv: String,
    #[serde(default)]
    pub installments: Option<u32>,
}

impl PaymentForm {
    /// Last four digits of the card number.
    pub fn last_four(&self) -> &str {
        let start = self.card_number.len().saturating_sub(4);
        self.card_number.get(start..).unwrap_or_default()
    }
}

impl fmt::Debug for PaymentForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentForm")
            .field("card_number", &format_args!("**** {}", self.last_four()))
            .field("card_name", &self.card_name)
            .field("expiry", &self.expiry)
            .field("cvv", &"***")
            .field("installments", &self.installments)
            .finish()
    }
}
