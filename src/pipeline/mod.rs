//! Filter → aggregate → forecast → merge pipeline.
//!
//! Every user interaction runs the whole pipeline against the read-only base
//! dataset. Intermediate series are owned by the call and discarded after
//! the payload is built.

pub mod aggregate;
pub mod arima;
pub mod decomposition;
pub mod filter;
pub mod forecast;
pub mod merge;
pub mod recompute;
pub mod types;
pub mod utility;

pub use recompute::{Selection, recompute, recompute_bounded};
