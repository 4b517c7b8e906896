//! JSON wire codec for bookings.
//!
//! The codec only turns bookings into JSON text and back; moving that text
//! to and from the server is the caller's business. A `WireCodec` is a
//! plain value holding its options, so any number of differently
//! configured codecs can coexist.

pub mod booking;
pub mod scalar;

use serde_json::Value;

use crate::booking::Booking;
use crate::config::CodecOptions;
use crate::error::BookingResult;

pub use booking::WireBooking;

#[derive(Debug, Clone, Copy, Default)]
pub struct WireCodec {
    options: CodecOptions,
}

impl WireCodec {
    pub fn new(options: CodecOptions) -> Self {
        WireCodec { options }
    }

    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    pub fn encode_value(&self, booking: &Booking) -> Value {
        WireBooking::from(booking).into_json(self.options.emit_nulls)
    }

    /// Validate a JSON value as a booking.
    pub fn decode_value(&self, value: Value) -> BookingResult<Booking> {
        let wire: WireBooking = serde_json::from_value(value)?;
        Booking::try_from(wire)
    }

    #[tracing::instrument(skip_all, fields(id = ?booking.id()))]
    pub fn encode(&self, booking: &Booking) -> String {
        let json = self.render(&self.encode_value(booking));
        tracing::debug!(json_len = json.len(), "Encoded booking");
        json
    }

    /// Encode bookings as a JSON array.
    #[tracing::instrument(skip_all, fields(count = bookings.len()))]
    pub fn encode_all(&self, bookings: &[Booking]) -> String {
        let values: Vec<Value> = bookings.iter().map(|b| self.encode_value(b)).collect();
        self.render(&Value::Array(values))
    }

    #[tracing::instrument(skip(self, json), fields(json_len = json.len()))]
    pub fn decode(&self, json: &str) -> BookingResult<Booking> {
        let wire: WireBooking = serde_json::from_str(json).inspect_err(|e| {
            tracing::warn!(error = %e, "Malformed booking JSON");
        })?;

        let booking = Booking::try_from(wire).inspect_err(|e| {
            tracing::warn!(error = %e, "Rejected booking from wire");
        })?;

        tracing::debug!(id = ?booking.id(), "Decoded booking");
        Ok(booking)
    }

    /// Decode a JSON array of bookings. Fails on the first invalid element.
    #[tracing::instrument(skip(self, json), fields(json_len = json.len()))]
    pub fn decode_all(&self, json: &str) -> BookingResult<Vec<Booking>> {
        let wires: Vec<WireBooking> = serde_json::from_str(json).inspect_err(|e| {
            tracing::warn!(error = %e, "Malformed booking list JSON");
        })?;

        let bookings = wires
            .into_iter()
            .enumerate()
            .map(|(index, wire)| {
                Booking::try_from(wire).inspect_err(|e| {
                    tracing::warn!(index, error = %e, "Rejected booking in list");
                })
            })
            .collect::<BookingResult<Vec<_>>>()?;

        tracing::debug!(count = bookings.len(), "Decoded bookings");
        Ok(bookings)
    }

    fn render(&self, value: &Value) -> String {
        if self.options.pretty {
            format!("{:#}", value)
        } else {
            value.to_string()
        }
    }
}
