//! Operator intents, parsed from already-tokenized arguments.

use crate::config::{ConfigStore, Password, TagConfig};
use crate::encoder::{BruteforceRequest, PacketEncoder, WriteRequest};
use crate::error::CoreError;
use crate::params;
use pcf7931_protocol::RequestPacket;
use std::fmt;

/// The kinds of operation an operator can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Read,
    Write,
    Bruteforce,
    Config,
}

impl OperationKind {
    pub const ALL: [OperationKind; 4] = [
        OperationKind::Read,
        OperationKind::Write,
        OperationKind::Bruteforce,
        OperationKind::Config,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "read" => Some(OperationKind::Read),
            "write" => Some(OperationKind::Write),
            "bruteforce" => Some(OperationKind::Bruteforce),
            "config" => Some(OperationKind::Config),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::Read => "read",
            OperationKind::Write => "write",
            OperationKind::Bruteforce => "bruteforce",
            OperationKind::Config => "config",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Local configuration commands. These never reach the peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigCommand {
    View,
    Reset,
    Set {
        password: Password,
        init_delay: u32,
        offset_width: i32,
        offset_position: i32,
    },
}

impl ConfigCommand {
    /// Parses `[r | <pwd> [delay] [offset width] [offset position]]`.
    ///
    /// Missing numeric operands default to zero.
    pub fn parse(args: &[&str]) -> Result<Self, CoreError> {
        match args {
            [] => Ok(ConfigCommand::View),
            [flag] if flag.eq_ignore_ascii_case("r") => Ok(ConfigCommand::Reset),
            [pwd, rest @ ..] => {
                if rest.len() > 3 {
                    return Err(CoreError::UnexpectedArgument(rest[3].to_string()));
                }
                let password: Password = pwd.parse()?;
                let init_delay = params::parse_optional_signed("delay", rest.first().copied())?;
                let offset_width =
                    params::parse_optional_signed("offset width", rest.get(1).copied())?;
                let offset_position =
                    params::parse_optional_signed("offset position", rest.get(2).copied())?;

                // Wrapping casts: the store keeps only the low 16 bits anyway.
                Ok(ConfigCommand::Set {
                    password,
                    init_delay: init_delay as u32,
                    offset_width: offset_width as i32,
                    offset_position: offset_position as i32,
                })
            }
        }
    }

    /// Applies the command and returns the resulting configuration.
    pub fn apply(&self, store: &mut ConfigStore) -> TagConfig {
        match *self {
            ConfigCommand::View => {}
            ConfigCommand::Reset => store.reset(),
            ConfigCommand::Set {
                password,
                init_delay,
                offset_width,
                offset_position,
            } => store.set(password, init_delay, offset_width, offset_position),
        }
        store.snapshot()
    }

    /// Returns whether applying the command changes the store.
    pub fn mutates(&self) -> bool {
        !matches!(self, ConfigCommand::View)
    }
}

/// A fully validated operator intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Write(WriteRequest),
    Bruteforce(BruteforceRequest),
    Config(ConfigCommand),
}

impl Operation {
    /// Parses an operation from its name and operand tokens.
    pub fn parse(name: &str, args: &[&str]) -> Result<Self, CoreError> {
        let kind =
            OperationKind::from_name(name).ok_or_else(|| CoreError::UnknownCommand(name.into()))?;
        Self::parse_kind(kind, args)
    }

    pub fn parse_kind(kind: OperationKind, args: &[&str]) -> Result<Self, CoreError> {
        match kind {
            OperationKind::Read => match args {
                [] => Ok(Operation::Read),
                [extra, ..] => Err(CoreError::UnexpectedArgument(extra.to_string())),
            },
            OperationKind::Write => {
                let block = args.first().ok_or(CoreError::MissingArgument("block address"))?;
                let byte = args.get(1).ok_or(CoreError::MissingArgument("byte address"))?;
                let data = args.get(2).ok_or(CoreError::MissingArgument("data"))?;
                if let Some(extra) = args.get(3) {
                    return Err(CoreError::UnexpectedArgument(extra.to_string()));
                }
                let request = WriteRequest::new(
                    params::parse_unsigned("block address", block)?,
                    params::parse_unsigned("byte address", byte)?,
                    params::parse_hex_byte(data)?,
                )?;
                Ok(Operation::Write(request))
            }
            OperationKind::Bruteforce => {
                let pwd = args
                    .first()
                    .ok_or(CoreError::MissingArgument("start password"))?;
                let tries = args.get(1).ok_or(CoreError::MissingArgument("tries"))?;
                if let Some(extra) = args.get(2) {
                    return Err(CoreError::UnexpectedArgument(extra.to_string()));
                }
                let password: Password = pwd.parse()?;
                let request =
                    BruteforceRequest::new(password, params::parse_unsigned("tries", tries)?)?;
                Ok(Operation::Bruteforce(request))
            }
            OperationKind::Config => ConfigCommand::parse(args).map(Operation::Config),
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Read => OperationKind::Read,
            Operation::Write(_) => OperationKind::Write,
            Operation::Bruteforce(_) => OperationKind::Bruteforce,
            Operation::Config(_) => OperationKind::Config,
        }
    }

    /// Encodes the operation, or `None` for local-only configuration commands.
    pub fn to_packet(&self, encoder: &PacketEncoder) -> Option<RequestPacket> {
        match self {
            Operation::Read => Some(encoder.read()),
            Operation::Write(request) => Some(encoder.write(request)),
            Operation::Bruteforce(request) => Some(encoder.bruteforce(request)),
            Operation::Config(_) => None,
        }
    }
}
