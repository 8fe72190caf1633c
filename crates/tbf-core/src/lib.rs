//! Core domain + application logic for the Telegram → Bale channel relay.
//!
//! This crate is intentionally framework-agnostic. Telegram and Bale live
//! behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod domain;
pub mod entities;
pub mod errors;
pub mod formatting;
pub mod keyboard;
pub mod logging;
pub mod media_group;
pub mod pipeline;
pub mod ports;

pub use errors::{Error, Result};
