//! Core use-case services.
//!
//! # Responsibility
//! - Shape counter store reads into the views HTTP callers render.
//! - Keep adapters decoupled from storage row shapes.

pub mod stats_service;
