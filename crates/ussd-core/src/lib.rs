//! ussd-core: Shared types, errors, and configuration
//!
//! This crate provides the foundational types used across the USSD data service
//! workspace: value objects exchanged between the relational store, the chain
//! reader and the API, plus the error taxonomy every layer reports through.

pub mod config;
pub mod errors;
pub mod types;

pub use config::*;
pub use errors::*;
pub use types::*;
