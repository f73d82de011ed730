//! # storefront-forms
//!
//! Form utilities for a storefront checkout: input masks and display
//! formatters, Brazilian document and payment card validators, declarative
//! form schemas, a persisted sliding-window rate limiter and script-injection
//! guards.
//!
//! ## Quick Start
//!
//! ```rust
//! use storefront_forms::application::forms;
//! use storefront_forms::{format_card_number, format_cep, is_valid_cpf};
//! use serde_json::json;
//!
//! // Masks are applied on every keystroke and are idempotent
//! assert_eq!(format_cep("01310100"), "01310-100");
//! assert_eq!(format_card_number("4532015112830366"), "4532 0151 1283 0366");
//! assert!(!is_valid_cpf("111.111.111-11"));
//!
//! // Schemas report one message per field
//! let errors = forms::login()
//!     .validate(&json!({"email": "not-an-email"}))
//!     .unwrap_err();
//! assert_eq!(errors.get("email"), Some("Invalid email address"));
//! assert_eq!(errors.get("password"), Some("Password is required"));
//! ```
//!
//! ## Throttling submissions
//!
//! ```rust
//! use storefront_forms::{MemoryStore, RateLimitConfig, RateLimiter};
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! let limiter = RateLimiter::new("login", RateLimitConfig::login(), store).unwrap();
//!
//! for _ in 0..5 {
//!     assert!(limiter.attempt());
//! }
//! assert!(!limiter.attempt());
//! assert!(limiter.check().reset_in.as_secs() > 0);
//! ```
//!
//! The limiter is a convenience throttle, not a security boundary: storage
//! failures and corrupt records are logged with `tracing` and treated as an
//! empty history, so a broken store never locks a shopper out.
//!
//! ## Features
//!
//! - **Formatters**: currency, percent and dates for `pt-BR`, `en-US` and
//!   `de-DE`; CEP, phone, CPF/CNPJ, card number and expiry masks
//! - **Validators**: email, CPF, CNPJ, CEP, phone, Luhn, CVV, expiry,
//!   password strength, card brand detection
//! - **Schemas**: login, register, address, payment, newsletter, contact and
//!   profile, with partial (per-field) validation
//! - **Guards**: `detect_xss`, `escape_html`, `sanitize_html` and a
//!   [`SubmissionGuard`] chaining honeypot, validation and rate limiting
//! - **Checkout**: a three-step [`CheckoutWizard`]
//!
//! ## Logging
//!
//! The crate emits `tracing` events and never installs a subscriber.
//! Storage failures are logged at `WARN`, blocked attempts and rejected
//! submissions at `DEBUG`.
//!
//! ## Testing
//!
//! Enable the `test-helpers` feature to get `MockClock`, `FailingStore` and
//! `CaptureLayer` under [`infrastructure::mocks`].

// Domain layer - pure logic
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - adapters
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    card::{detect_card_brand, CardBrand},
    format::{
        digits_only, format_card_expiry, format_card_number, format_cep, format_currency,
        format_date, format_document, format_percent, format_phone, truncate_text, LocaleFormat,
    },
    input::FieldInput,
    sanitize::{detect_xss, escape_html, sanitize_html, sanitize_payload, ALLOWED_TAGS},
    validate::{
        is_strong_password, is_valid_card_expiry, is_valid_cep, is_valid_cnpj, is_valid_cpf,
        is_valid_credit_card, is_valid_cvv, is_valid_email, is_valid_phone, parse_card_expiry,
        PasswordStrength, StrengthLevel,
    },
    window::{AttemptDecision, AttemptWindow, RateLimitStatus},
};

pub use application::{
    checkout::{CheckoutError, CheckoutStep, CheckoutWizard, OrderDraft, PaymentSummary},
    guard::{GuardError, SubmissionGuard},
    limiter::{BuildError, RateLimitConfig, RateLimiter, RateLimiterBuilder},
    metrics::{LimiterMetrics, MetricsSnapshot},
    ports::{Clock, KeyValueStore, StoreError, SubmitError, Submitter},
    schema::{
        validate_form, validate_form_at, Coercion, Field, FieldErrors, Refinement, Rule, Schema,
    },
};

pub use infrastructure::{clock::SystemClock, storage::MemoryStore};
