// === PUBLIC CONTRACT ===
pub mod contract;

pub use contract::model;

// === ERROR CATALOG ===
pub mod errors;

// === MODULE DEFINITION ===
pub mod module;
pub use module::Booking;

pub mod config;
pub use config::BookingConfig;

// === INTERNAL MODULES ===
// Exposed for integration tests; only `contract` is a stable API.
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
