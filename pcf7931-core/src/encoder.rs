//! Request encoding.
//!
//! [`PacketEncoder`] maps an operation and a configuration snapshot to a
//! [`RequestPacket`]. It never touches the [`ConfigStore`] it was built from
//! and performs no I/O.

use crate::config::{ConfigStore, Password, TagConfig};
use crate::error::CoreError;
use pcf7931_protocol::{RequestPacket, TimingSlots};

/// Highest addressable block on the tag.
pub const MAX_BLOCK: u8 = 7;
/// Highest byte index inside a block.
pub const MAX_BYTE_INDEX: u8 = 15;

/// A validated WRITE operand set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteRequest {
    block: u8,
    byte_index: u8,
    data: u8,
}

impl WriteRequest {
    pub fn new(block: u64, byte_index: u64, data: u8) -> Result<Self, CoreError> {
        if block > u64::from(MAX_BLOCK) {
            return Err(CoreError::BlockOutOfRange { block });
        }
        if byte_index > u64::from(MAX_BYTE_INDEX) {
            return Err(CoreError::ByteIndexOutOfRange { byte_index });
        }
        Ok(Self {
            block: block as u8,
            byte_index: byte_index as u8,
            data,
        })
    }

    pub fn block(&self) -> u8 {
        self.block
    }

    pub fn byte_index(&self) -> u8 {
        self.byte_index
    }

    pub fn data(&self) -> u8 {
        self.data
    }
}

/// A validated BRUTEFORCE operand set.
///
/// The firmware only varies the last two password bytes; the first five in
/// `start_password` must already be correct. This is not a keyspace search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BruteforceRequest {
    start_password: Password,
    tries: u8,
}

impl BruteforceRequest {
    pub fn new(start_password: impl Into<Password>, tries: u64) -> Result<Self, CoreError> {
        let tries = u8::try_from(tries).map_err(|_| CoreError::TriesOutOfRange { tries })?;
        Ok(Self {
            start_password: start_password.into(),
            tries,
        })
    }

    pub fn start_password(&self) -> &Password {
        &self.start_password
    }

    pub fn tries(&self) -> u8 {
        self.tries
    }
}

/// Builds request packets from one configuration snapshot.
#[derive(Debug, Clone, Copy)]
pub struct PacketEncoder {
    config: TagConfig,
}

impl PacketEncoder {
    pub fn new(config: TagConfig) -> Self {
        Self { config }
    }

    /// Snapshots `store` and builds an encoder from it.
    pub fn from_store(store: &ConfigStore) -> Self {
        Self::new(store.snapshot())
    }

    /// Slots 7, 8 and 9, shared by WRITE and BRUTEFORCE.
    pub fn timing(&self) -> TimingSlots {
        TimingSlots::new(
            self.config.init_delay,
            self.config.offset_width,
            self.config.offset_position,
        )
    }

    pub fn read(&self) -> RequestPacket {
        RequestPacket::read()
    }

    pub fn write(&self, request: &WriteRequest) -> RequestPacket {
        RequestPacket::write(
            request.block,
            request.byte_index,
            request.data,
            *self.config.password.bytes(),
            self.timing(),
        )
    }

    pub fn bruteforce(&self, request: &BruteforceRequest) -> RequestPacket {
        RequestPacket::bruteforce(
            request.start_password.bytes(),
            request.tries,
            self.timing(),
        )
    }
}
