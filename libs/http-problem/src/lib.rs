//! RFC 9457 problem documents and the static error-catalog entries that build them.
//!
//! Every error leaving the HTTP edge is a [`Problem`]. Modules describe their
//! errors once as [`ErrDef`] constants and turn them into problems per request.

pub mod catalog;
pub mod problem;

pub use catalog::ErrDef;
pub use problem::{Problem, ProblemResponse, APPLICATION_PROBLEM_JSON};
