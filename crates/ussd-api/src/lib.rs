//! ussd-api: HTTP API layer for the USSD data service
//!
//! JSON routes over the metadata store and the chain reader. Every data
//! response is wrapped in an `{ok, description, result}` envelope.

pub mod dto;
pub mod error;
pub mod routes;
pub mod server;
pub mod state;

pub use error::RouteError;
pub use server::*;
pub use state::AppState;
