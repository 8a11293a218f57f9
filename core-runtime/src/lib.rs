//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the Wavify core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! Every other core crate depends on this one for its logging conventions,
//! for the validated [`CoreConfig`](config::CoreConfig) that carries the
//! injected bridges, and for the broadcast [`EventBus`](events::EventBus)
//! that cache and playback activity is published on.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
