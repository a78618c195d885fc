//! Core types and traits for the AxeOS device REST API.
//!
//! Payload DTOs keep the firmware's JSON keys so they round-trip with the device unchanged.

mod api;
mod dto;
mod traits;

pub use api::*;
pub use dto::*;
pub use traits::*;
