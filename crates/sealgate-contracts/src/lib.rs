//! # sealgate-contracts
//!
//! Shared types, records, and error contracts for the SEALGATE runtime.
//!
//! All crates in the workspace import from here. No algorithms live in this
//! crate, only data definitions and the error type.

pub mod audit;
pub mod error;
pub mod request;
pub mod retention;
