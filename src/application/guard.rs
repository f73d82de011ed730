//! Submission pipeline shared by every protected form.
//!
//! A [`SubmissionGuard`] runs, in order: the honeypot check, a script
//! injection scan of free-text fields, schema validation, the rate limiter
//! and finally the [`Submitter`]. Markup is stripped from the scanned
//! free-text fields only; every other validated value, credentials included,
//! is handed over unchanged. Rejected submissions never reach the submitter,
//! and only submissions that passed validation consume a rate-limit attempt.

use crate::application::limiter::RateLimiter;
use crate::application::ports::{KeyValueStore, SubmitError, Submitter};
use crate::application::schema::{insert_path, lookup, FieldErrors, Schema};
use crate::domain::sanitize::{detect_xss, sanitize_html};
use crate::infrastructure::clock::local_today;
use chrono::NaiveDate;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Message attached to fields that look like script injection.
pub const XSS_MESSAGE: &str = "Contains disallowed content";

/// Why a submission did not go through.
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    /// The honeypot field was filled in
    #[error("submission rejected as automated")]
    Bot,
    /// Field-level validation failed
    #[error("invalid form data: {0}")]
    Invalid(#[from] FieldErrors),
    /// Too many recent attempts
    #[error("too many attempts, try again in {}s", reset_in.as_secs())]
    RateLimited {
        /// Time until another attempt is allowed
        reset_in: Duration,
    },
    /// The downstream collaborator refused the payload
    #[error(transparent)]
    Submission(#[from] SubmitError),
}

impl GuardError {
    /// Field errors to render inline, if this is a validation failure.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            GuardError::Invalid(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Validates, throttles and sanitizes a form before handing it over.
#[derive(Debug)]
pub struct SubmissionGuard<S: KeyValueStore> {
    schema: Schema,
    limiter: RateLimiter<S>,
    scanned_fields: Vec<String>,
    honeypot: Option<String>,
}

impl<S: KeyValueStore> SubmissionGuard<S> {
    /// Guard `schema` with `limiter`. No fields are scanned and no honeypot
    /// is checked until configured.
    pub fn new(schema: Schema, limiter: RateLimiter<S>) -> Self {
        Self {
            schema,
            limiter,
            scanned_fields: Vec::new(),
            honeypot: None,
        }
    }

    /// Free-text fields (dot paths) screened with `detect_xss` and stripped
    /// of markup before submission.
    pub fn scan_fields(mut self, paths: &[&str]) -> Self {
        self.scanned_fields = paths.iter().map(|p| p.to_string()).collect();
        self
    }

    /// Hidden field that humans leave empty.
    pub fn with_honeypot(mut self, path: impl Into<String>) -> Self {
        self.honeypot = Some(path.into());
        self
    }

    /// The guarded schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The limiter consulted after validation.
    pub fn limiter(&self) -> &RateLimiter<S> {
        &self.limiter
    }

    /// Run the pipeline against today's local date.
    ///
    /// # Errors
    /// See [`GuardError`].
    pub fn submit<T: Submitter>(&self, data: &Value, submitter: &mut T) -> Result<T::Output, GuardError> {
        self.submit_at(data, local_today(), submitter)
    }

    /// Run the pipeline with an explicit validation date.
    ///
    /// # Errors
    /// See [`GuardError`].
    pub fn submit_at<T: Submitter>(
        &self,
        data: &Value,
        today: NaiveDate,
        submitter: &mut T,
    ) -> Result<T::Output, GuardError> {
        if self.honeypot_filled(data) {
            debug!(form = %self.schema.name(), "honeypot field filled, dropping submission");
            return Err(GuardError::Bot);
        }

        let suspicious = self.scan(data);
        if !suspicious.is_empty() {
            debug!(form = %self.schema.name(), fields = %suspicious, "script injection detected");
            return Err(GuardError::Invalid(suspicious));
        }

        let validated = self.schema.validate_at(data, today).map_err(|errors| {
            debug!(form = %self.schema.name(), errors = errors.len(), "form failed validation");
            errors
        })?;

        if !self.limiter.attempt() {
            let reset_in = self.limiter.check().reset_in;
            debug!(form = %self.schema.name(), ?reset_in, "submission rate limited");
            return Err(GuardError::RateLimited { reset_in });
        }

        Ok(submitter.submit(self.strip_markup(validated))?)
    }

    fn honeypot_filled(&self, data: &Value) -> bool {
        let Some(path) = &self.honeypot else {
            return false;
        };
        match lookup(data, path) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(Value::Bool(b)) => *b,
            Some(_) => true,
        }
    }

    fn strip_markup(&self, mut payload: Value) -> Value {
        for path in &self.scanned_fields {
            let cleaned = match lookup(&payload, path) {
                Some(Value::String(text)) => sanitize_html(text, false),
                _ => continue,
            };
            insert_path(&mut payload, path, Value::String(cleaned));
        }
        payload
    }

    fn scan(&self, data: &Value) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for path in &self.scanned_fields {
            if lookup(data, path)
                .and_then(Value::as_str)
                .is_some_and(detect_xss)
            {
                errors.insert(path.as_str(), XSS_MESSAGE);
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::forms;
    use crate::application::limiter::{RateLimitConfig, RateLimiterBuilder};
    use crate::infrastructure::mocks::MockClock;
    use crate::infrastructure::storage::MemoryStore;
    use serde_json::json;
    use std::sync::Arc;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn guard(max_attempts: u32) -> SubmissionGuard<Arc<MemoryStore>> {
        let limiter = RateLimiterBuilder::new("contact")
            .with_config(RateLimitConfig::new(max_attempts, Duration::from_secs(60)))
            .with_clock(Arc::new(MockClock::new(1_700_000_000_000)))
            .build(Arc::new(MemoryStore::new()))
            .unwrap();
        SubmissionGuard::new(forms::contact().clone(), limiter)
            .scan_fields(&["subject", "message"])
            .with_honeypot("website")
    }

    fn message() -> Value {
        json!({
            "name": "Ana",
            "email": "ana@example.com",
            "subject": "Order <b>question</b>",
            "message": "Where is my order #1234?"
        })
    }

    #[test]
    fn test_successful_submission_is_sanitized() {
        let guard = guard(3);
        let mut received = Vec::new();
        let mut submitter = |payload: Value| -> Result<u32, SubmitError> {
            received.push(payload);
            Ok(7)
        };

        let ticket = guard.submit_at(&message(), today(), &mut submitter).unwrap();
        assert_eq!(ticket, 7);
        assert_eq!(received.len(), 1);
        assert_eq!(received[0]["subject"], json!("Order question"));
        assert_eq!(guard.limiter().check().remaining, 2);
    }

    #[test]
    fn test_unscanned_fields_reach_submitter_unchanged() {
        let limiter = RateLimiterBuilder::new("login")
            .with_clock(Arc::new(MockClock::new(0)))
            .build(Arc::new(MemoryStore::new()))
            .unwrap();
        let guard = SubmissionGuard::new(forms::login().clone(), limiter);
        let mut passwords = Vec::new();
        let mut submitter = |payload: Value| -> Result<(), SubmitError> {
            passwords.push(payload["password"].clone());
            Ok(())
        };

        for password in ["Pa<ss>word1", "x<y9Secret"] {
            let data = json!({"email": "a@b.co", "password": password});
            guard.submit_at(&data, today(), &mut submitter).unwrap();
        }
        assert_eq!(passwords, vec![json!("Pa<ss>word1"), json!("x<y9Secret")]);
    }

    #[test]
    fn test_scanned_field_keeps_plain_comparisons() {
        let guard = guard(3);
        let mut data = message();
        data["message"] = json!("Is size 38 < 40? <b>Thanks</b>");
        let mut submitter = |payload: Value| -> Result<Value, SubmitError> { Ok(payload) };

        let sent = guard.submit_at(&data, today(), &mut submitter).unwrap();
        assert_eq!(sent["message"], json!("Is size 38 < 40? Thanks"));
        assert_eq!(sent["email"], json!("ana@example.com"));
    }

    #[test]
    fn test_honeypot_short_circuits() {
        let guard = guard(3);
        let mut data = message();
        data["website"] = json!("http://spam.example");
        let mut submitter = |_: Value| -> Result<(), SubmitError> { panic!("must not submit") };

        let err = guard.submit_at(&data, today(), &mut submitter).unwrap_err();
        assert!(matches!(err, GuardError::Bot));
        assert_eq!(guard.limiter().check().remaining, 3);
    }

    #[test]
    fn test_xss_reported_on_field() {
        let guard = guard(3);
        let mut data = message();
        data["subject"] = json!("<img src=x onerror=alert(1)>");
        let mut submitter = |_: Value| -> Result<(), SubmitError> { Ok(()) };

        let err = guard.submit_at(&data, today(), &mut submitter).unwrap_err();
        let errors = err.field_errors().unwrap();
        assert_eq!(errors.get("subject"), Some(XSS_MESSAGE));
        assert!(!errors.contains("message"));
    }

    #[test]
    fn test_invalid_data_does_not_consume_attempt() {
        let guard = guard(1);
        let mut submitter = |_: Value| -> Result<(), SubmitError> { Ok(()) };

        let err = guard
            .submit_at(&json!({"name": "A"}), today(), &mut submitter)
            .unwrap_err();
        assert!(err.field_errors().unwrap().contains("email"));
        assert!(guard.limiter().check().allowed);
    }

    #[test]
    fn test_rate_limited_after_budget() {
        let guard = guard(1);
        let mut submitter = |_: Value| -> Result<(), SubmitError> { Ok(()) };

        guard.submit_at(&message(), today(), &mut submitter).unwrap();
        let err = guard.submit_at(&message(), today(), &mut submitter).unwrap_err();
        match err {
            GuardError::RateLimited { reset_in } => assert_eq!(reset_in, Duration::from_secs(60)),
            other => panic!("expected rate limit, got {other:?}"),
        }
    }

    #[test]
    fn test_submitter_error_surfaces() {
        let guard = guard(3);
        let mut submitter = |_: Value| -> Result<(), SubmitError> { Err(SubmitError::new("503")) };

        let err = guard.submit_at(&message(), today(), &mut submitter).unwrap_err();
        assert_eq!(err.to_string(), "submission failed: 503");
    }
}
