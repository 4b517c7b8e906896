//! Client-side booking model for the Smeagol booking server.
//!
//! This crate provides:
//! - `Booking`, a resource reserved for an event over a time span
//! - `RecurrenceRule`, the subset of RFC 5545 recurrence the server accepts
//! - `wire` module for the server's flat JSON format
//!
//! Nothing here performs I/O; the HTTP layer hands JSON text in and out.

pub mod booking;
pub mod config;
pub mod error;
pub mod recurrence;
pub mod timestamp;
pub mod wire;

// Re-export the main types at crate root for convenience
pub use booking::Booking;
pub use config::CodecOptions;
pub use error::{BookingError, BookingResult};
pub use recurrence::{DayOfWeek, Frequency, RecurrenceRule};
pub use timestamp::Timestamp;
pub use wire::WireCodec;
