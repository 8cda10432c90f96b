//! ReefLog billing - subscription lifecycle and affiliate commission engine.
//!
//! Processes signed payment-processor webhooks into a consistent per-user
//! subscription state, attributes paid invoices to referring partners, and
//! reconciles partner payouts without double-counting money.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
