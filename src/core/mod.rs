// src/core/mod.rs

//! Core data structures and types

// Declare modules within core
pub mod error;
pub mod clock;
pub mod resource;

// Re-export public types for convenient access via `purify::core::TypeName`
pub use error::PurifyError;
pub use clock::{ArrivalSchedule, Event, InterArrival, SimClock};
pub use resource::{teleportation_fidelity, DecoheringResource, PendingRequest};

pub mod constants;
pub use constants::{decibel_to_linear, generation_probability_from_attenuation, linear_to_decibel};
