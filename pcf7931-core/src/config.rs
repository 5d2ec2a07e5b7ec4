//! Active tag configuration.
//!
//! The store always holds exactly one configuration. It changes only through
//! [`ConfigStore::set`] (all four fields replaced at once) or
//! [`ConfigStore::reset`]; encoding requests only reads snapshots.
//!
//! `ConfigStore` itself is not synchronized. Callers sharing a store between
//! threads should go through [`SharedConfigStore`].

use crate::error::CoreError;
use crate::params;
use parking_lot::Mutex;
use pcf7931_protocol::PASSWORD_LEN;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub const DEFAULT_PASSWORD: [u8; PASSWORD_LEN] = [0xFF; PASSWORD_LEN];
pub const DEFAULT_INIT_DELAY: u16 = 17500;
pub const DEFAULT_OFFSET_WIDTH: i32 = 0;
pub const DEFAULT_OFFSET_POSITION: i32 = 0;

/// A 7-byte tag password, stored least significant byte first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Password([u8; PASSWORD_LEN]);

impl Password {
    pub const fn new(bytes: [u8; PASSWORD_LEN]) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> &[u8; PASSWORD_LEN] {
        &self.0
    }

    /// Compact hex form, as accepted by [`FromStr`].
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }
}

impl Default for Password {
    fn default() -> Self {
        Self(DEFAULT_PASSWORD)
    }
}

impl From<[u8; PASSWORD_LEN]> for Password {
    fn from(bytes: [u8; PASSWORD_LEN]) -> Self {
        Self(bytes)
    }
}

impl FromStr for Password {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        params::parse_password(s).map(Self)
    }
}

/// Space-separated upper-case hex bytes, in stored order.
impl fmt::Display for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:02X}", b)?;
        }
        Ok(())
    }
}

impl Serialize for Password {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Password {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A snapshot of the tag configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagConfig {
    /// Tag password.
    pub password: Password,
    /// Tag initialization delay in microseconds.
    pub init_delay: u16,
    /// Correction of the low pulse width in microseconds.
    pub offset_width: i32,
    /// Correction of the low pulse position in microseconds.
    pub offset_position: i32,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            password: Password::default(),
            init_delay: DEFAULT_INIT_DELAY,
            offset_width: DEFAULT_OFFSET_WIDTH,
            offset_position: DEFAULT_OFFSET_POSITION,
        }
    }
}

/// Reduces an offset to its low 16 bits, read back as a signed value.
///
/// Out-of-range inputs wrap instead of being rejected; the firmware has only
/// ever been fed values produced this way.
pub fn truncate_offset(value: i32) -> i32 {
    i32::from(value as i16)
}

/// Reduces a delay to its low 16 bits.
pub fn truncate_delay(value: u32) -> u16 {
    (value & 0xFFFF) as u16
}

/// Holder of the single active configuration.
#[derive(Debug, Default)]
pub struct ConfigStore {
    current: TagConfig,
}

impl ConfigStore {
    /// Creates a store holding the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding a previously saved configuration.
    ///
    /// Offsets are truncated the same way [`set`](Self::set) truncates them.
    pub fn from_config(config: TagConfig) -> Self {
        let mut store = Self::new();
        store.set(
            config.password,
            u32::from(config.init_delay),
            config.offset_width,
            config.offset_position,
        );
        store
    }

    /// Restores the default configuration.
    pub fn reset(&mut self) {
        tracing::debug!("resetting tag configuration to defaults");
        self.current = TagConfig::default();
    }

    /// Replaces the whole configuration.
    ///
    /// `init_delay` keeps only its low 16 bits; both offsets keep their low
    /// 16 bits reinterpreted as signed. The password is stored verbatim.
    pub fn set(
        &mut self,
        password: impl Into<Password>,
        init_delay: u32,
        offset_width: i32,
        offset_position: i32,
    ) {
        let next = TagConfig {
            password: password.into(),
            init_delay: truncate_delay(init_delay),
            offset_width: truncate_offset(offset_width),
            offset_position: truncate_offset(offset_position),
        };
        if u32::from(next.init_delay) != init_delay {
            tracing::warn!(
                requested = init_delay,
                stored = next.init_delay,
                "init delay truncated to 16 bits"
            );
        }
        tracing::debug!(
            init_delay = next.init_delay,
            offset_width = next.offset_width,
            offset_position = next.offset_position,
            "tag configuration updated"
        );
        self.current = next;
    }

    /// Returns the current configuration by value.
    pub fn snapshot(&self) -> TagConfig {
        self.current
    }
}

/// A [`ConfigStore`] behind a mutex, for callers on more than one thread.
///
/// Each method takes the lock once, so every caller observes either the
/// configuration before or after a `set`/`reset`, never a mix.
#[derive(Debug, Clone, Default)]
pub struct SharedConfigStore {
    inner: Arc<Mutex<ConfigStore>>,
}

impl SharedConfigStore {
    pub fn new(store: ConfigStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    pub fn reset(&self) {
        self.inner.lock().reset();
    }

    pub fn set(
        &self,
        password: impl Into<Password>,
        init_delay: u32,
        offset_width: i32,
        offset_position: i32,
    ) {
        self.inner
            .lock()
            .set(password, init_delay, offset_width, offset_position);
    }

    pub fn snapshot(&self) -> TagConfig {
        self.inner.lock().snapshot()
    }

    /// Runs `f` with exclusive access to the store.
    pub fn with<R>(&self, f: impl FnOnce(&mut ConfigStore) -> R) -> R {
        f(&mut self.inner.lock())
    }
}
