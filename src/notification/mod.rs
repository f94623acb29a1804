//! Clients for external notification media.
//!
//! Channels that page a human (rather than write to a stream) talk to their
//! medium through a client trait defined here, so they can be exercised
//! against a fake in tests.
pub mod messagebird;
