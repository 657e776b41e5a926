//! # sc-runner
//!
//! The execution gateway. [`Runner::run`] is the only way SafeClaw invokes a
//! capability: it checks the policy allow-list, the registry, and path
//! containment (in that order), runs the capability under the policy timeout,
//! and appends exactly one audit record describing the outcome.
//!
//! Gating failures never surface as `Err`; they come back as a [`RunResult`]
//! with `ok == false` and a typed [`RunFailure`].

pub mod error;
pub mod runner;

pub use error::RunFailure;
pub use runner::{RunResult, Runner};
