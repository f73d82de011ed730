//! Checkout example: the step wizard followed by a guarded order submission.
//!
//! The wizard validates the address and payment steps. The confirmed order is
//! then submitted through a `SubmissionGuard` whose limiter allows 3 attempts
//! per 5 minutes, so the fourth submission is refused.

use serde_json::{json, Value};
use std::sync::Arc;
use storefront_forms::application::forms;
use storefront_forms::{
    format_card_number, CheckoutWizard, GuardError, MemoryStore, RateLimitConfig, RateLimiter,
    SubmissionGuard, SubmitError,
};
use tracing_subscriber::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Checkout Example ===\n");

    let payment = json!({
        "cardNumber": format_card_number("4532015112830366"),
        "cardName": "Joao Silva",
        "expiry": "12/30",
        "cvv": "123",
        "installments": 2
    });

    let mut wizard = CheckoutWizard::new();

    // A bad CEP keeps the wizard on the address step
    let bad_address = json!({"cep": "123", "street": "Av. Paulista", "state": "SP"});
    if let Err(err) = wizard.submit_address(&bad_address) {
        println!("Rejected: {err}");
    }

    wizard.submit_address(&json!({
        "cep": "01310-100",
        "street": "Av. Paulista",
        "number": "1000",
        "neighborhood": "Bela Vista",
        "city": "São Paulo",
        "state": "SP"
    }))?;
    println!("Address accepted, now on the {} step", wizard.step());

    wizard.submit_payment(&payment)?;
    let draft = wizard.confirm()?;
    println!("Order draft: {}\n", serde_json::to_string_pretty(&draft)?);

    let limiter = RateLimiter::new(
        "checkout",
        RateLimitConfig::checkout(),
        Arc::new(MemoryStore::new()),
    )?;
    let guard = SubmissionGuard::new(forms::payment().clone(), limiter);

    let mut orders = 0;
    let mut place_order = |_: Value| -> Result<u32, SubmitError> {
        orders += 1;
        Ok(orders)
    };

    println!("Submitting the order 4 times:");
    for i in 1..=4 {
        match guard.submit(&payment, &mut place_order) {
            Ok(order) => println!("  attempt {i}: order #{order} placed"),
            Err(GuardError::RateLimited { reset_in }) => {
                println!("  attempt {i}: throttled, retry in {}s", reset_in.as_secs());
            }
            Err(err) => println!("  attempt {i}: {err}"),
        }
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
