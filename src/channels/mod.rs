//! Channel implementations that the dispatcher can fan records out to.
//!
//! - [`stream::StreamChannel`] writes lines to stderr, stdout or a file.
//! - [`sms::AlertChannel`] pages operators through an SMS gateway.

pub mod sms;
pub mod stream;

pub use sms::{AlertChannel, AlertOptions, ConfigError};
pub use stream::StreamChannel;
