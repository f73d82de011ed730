//! Multi-step checkout state machine.
//!
//! The wizard walks `Address -> Payment -> Confirmation`, validating each
//! step with the predefined schemas. Going back keeps what was entered.

use crate::application::forms::{self, AddressForm, PaymentForm};
use crate::application::schema::{validate_form_at, FieldErrors};
use crate::domain::card::{detect_card_brand, CardBrand};
use crate::infrastructure::clock::local_today;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Position in the checkout flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStep {
    Address,
    Payment,
    Confirmation,
}

impl CheckoutStep {
    /// Zero-based position, for progress indicators.
    pub fn index(&self) -> usize {
        match self {
            CheckoutStep::Address => 0,
            CheckoutStep::Payment => 1,
            CheckoutStep::Confirmation => 2,
        }
    }

    fn previous(self) -> Option<Self> {
        match self {
            CheckoutStep::Address => None,
            CheckoutStep::Payment => Some(CheckoutStep::Address),
            CheckoutStep::Confirmation => Some(CheckoutStep::Payment),
        }
    }
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CheckoutStep::Address => "address",
            CheckoutStep::Payment => "payment",
            CheckoutStep::Confirmation => "confirmation",
        })
    }
}

/// Errors raised by [`CheckoutWizard`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckoutError {
    /// The action does not belong to the current step
    #[error("cannot {action} during the {current} step")]
    WrongStep {
        current: CheckoutStep,
        action: &'static str,
    },
    /// The submitted step data is invalid
    #[error("invalid {step} data: {errors}")]
    Invalid {
        step: CheckoutStep,
        errors: FieldErrors,
    },
}

/// Card details safe to display and log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub brand: Option<CardBrand>,
    pub last_four: String,
    pub card_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installments: Option<u32>,
}

/// Result of a confirmed checkout, ready for the order service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub address: AddressForm,
    pub payment: PaymentSummary,
}

/// Checkout flow state.
#[derive(Debug, Clone)]
pub struct CheckoutWizard {
    step: CheckoutStep,
    address: Option<AddressForm>,
    payment: Option<PaymentForm>,
    today: Option<NaiveDate>,
}

impl Default for CheckoutWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckoutWizard {
    /// Start at the address step, validating expiry against the local date.
    pub fn new() -> Self {
        Self {
            step: CheckoutStep::Address,
            address: None,
            payment: None,
            today: None,
        }
    }

    /// Start at the address step with a fixed validation date.
    pub fn with_date(today: NaiveDate) -> Self {
        Self {
            today: Some(today),
            ..Self::new()
        }
    }

    /// Current step.
    pub fn step(&self) -> CheckoutStep {
        self.step
    }

    /// Last accepted address.
    pub fn address(&self) -> Option<&AddressForm> {
        self.address.as_ref()
    }

    /// Last accepted payment details.
    pub fn payment(&self) -> Option<&PaymentForm> {
        self.payment.as_ref()
    }

    fn expect_step(&self, expected: CheckoutStep, action: &'static str) -> Result<(), CheckoutError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(CheckoutError::WrongStep {
                current: self.step,
                action,
            })
        }
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(local_today)
    }

    /// Validate the shipping address and move to payment.
    ///
    /// # Errors
    /// `WrongStep` outside the address step, `Invalid` on field errors.
    pub fn submit_address(&mut self, data: &Value) -> Result<CheckoutStep, CheckoutError> {
        self.expect_step(CheckoutStep::Address, "submit an address")?;
        let address = validate_form_at(forms::address(), data, self.today()).map_err(|errors| {
            CheckoutError::Invalid {
                step: CheckoutStep::Address,
                errors,
            }
        })?;

        self.address = Some(address);
        self.step = CheckoutStep::Payment;
        Ok(self.step)
    }

    /// Validate card details and move to confirmation.
    ///
    /// # Errors
    /// `WrongStep` outside the payment step, `Invalid` on field errors.
    pub fn submit_payment(&mut self, data: &Value) -> Result<CheckoutStep, CheckoutError> {
        self.expect_step(CheckoutStep::Payment, "submit payment details")?;
        let payment = validate_form_at(forms::payment(), data, self.today()).map_err(|errors| {
            CheckoutError::Invalid {
                step: CheckoutStep::Payment,
                errors,
            }
        })?;

        self.payment = Some(payment);
        self.step = CheckoutStep::Confirmation;
        Ok(self.step)
    }

    /// Return to the previous step, keeping entered data.
    ///
    /// # Errors
    /// `WrongStep` on the first step.
    pub fn back(&mut self) -> Result<CheckoutStep, CheckoutError> {
        let previous = self.step.previous().ok_or(CheckoutError::WrongStep {
            current: self.step,
            action: "go back",
        })?;
        self.step = previous;
        Ok(previous)
    }

    /// Produce the order draft.
    ///
    /// # Errors
    /// `WrongStep` unless on the confirmation step.
    pub fn confirm(&self) -> Result<OrderDraft, CheckoutError> {
        self.expect_step(CheckoutStep::Confirmation, "confirm the order")?;
        let (Some(address), Some(payment)) = (&self.address, &self.payment) else {
            // unreachable through the public API
            return Err(CheckoutError::WrongStep {
                current: self.step,
                action: "confirm the order",
            });
        };

        Ok(OrderDraft {
            address: address.clone(),
            payment: PaymentSummary {
                brand: detect_card_brand(&payment.card_number),
                last_four: payment.last_four().to_string(),
                card_name: payment.card_name.clone(),
                installments: payment.installments,
            },
        })
    }
}
