//! Stripe adapters: the real API client and a canned mock.

mod client;
mod mock;

pub use client::{StripeBillingClient, StripeConfig};
pub use mock::MockBillingProvider;
