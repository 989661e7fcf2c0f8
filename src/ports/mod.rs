//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and external systems (the prediction service).

mod prediction;

pub use prediction::{PredictionClient, PredictionError};
