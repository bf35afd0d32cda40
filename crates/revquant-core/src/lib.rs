//! Core types and the revenue-ranking engine for revquant.
//!
//! Everything here is a pure function over in-memory collections. Loading
//! the inputs and persisting the result are the job of the collaborators
//! described by the traits in [`store`]; this crate has no database or
//! runtime dependencies.

pub mod aggregate;
pub mod error;
pub mod event;
pub mod ids;
pub mod quantile;
pub mod revenue;
pub mod sample;
pub mod select;
pub mod stats;
pub mod store;

pub use error::{Error, Result};
pub use quantile::Quantile;
