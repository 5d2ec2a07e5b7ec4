//! # pcf7931-core
//!
//! Tag configuration and request encoding for PCF7931 transponders.
//!
//! This crate provides:
//! - The active tag configuration (password, init delay, timing offsets)
//! - Pure encoding of READ, WRITE and BRUTEFORCE requests
//! - Operand parsing and validation for operator commands
//! - Operator-facing status lines and usage text
//!
//! Nothing here performs I/O; delivering packets is the client's job.

pub mod config;
pub mod encoder;
pub mod error;
pub mod operation;
pub mod params;
pub mod report;

pub use config::{ConfigStore, Password, SharedConfigStore, TagConfig};
pub use encoder::{BruteforceRequest, PacketEncoder, WriteRequest};
pub use error::CoreError;
pub use operation::{ConfigCommand, Operation, OperationKind};
