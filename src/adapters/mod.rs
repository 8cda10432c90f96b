//! Adapters - implementations of the port interfaces.
//!
//! - `http` - Axum routers and handlers (webhook + admin surface)
//! - `postgres` - sqlx store implementations
//! - `stripe` - payment processor client and mock
//! - `memory` - in-memory stores for tests and local runs

pub mod http;
pub mod memory;
pub mod postgres;
pub mod stripe;
