//! # pcf7931-client
//!
//! Delivers PCF7931 request packets to the RF peripheral.
//!
//! This crate provides:
//! - Serial (USB CDC) and TCP bridge streams to the peripheral
//! - Frame-level send and acknowledgment handling with timeouts
//! - A small client that knows which requests are acknowledged

pub mod client;
pub mod connection;
pub mod error;
pub mod serial;
pub mod stream;

pub use client::{Client, Outcome};
pub use connection::{Ack, Connection, ConnectionConfig, DeviceAddr};
pub use error::ClientError;
pub use serial::SerialConfig;
pub use stream::DeviceStream;
