//! Core types and trait definitions for the Scholar student registry.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it.
//!
//! The interesting logic lives in [`patch`] (partial-update merge) and
//! [`projection`] (the read model with derived `age`).

pub mod error;
pub mod patch;
pub mod projection;
pub mod store;
pub mod student;
pub mod validate;

pub use error::{Error, Result};
