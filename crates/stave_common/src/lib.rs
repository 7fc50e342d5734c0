//! Shared foundational types used across the Stave timing-path engine.
//!
//! This crate provides interned identifiers for pin, instance, net, corner, and
//! clock names, plus the internal result type used for invariant failures.

#![warn(missing_docs)]

pub mod ident;
pub mod result;

pub use ident::{Ident, Interner};
pub use result::{InternalError, StaveResult};
