//! Operator-facing status lines and usage text.

use crate::config::TagConfig;
use crate::encoder::{BruteforceRequest, WriteRequest};
use crate::operation::OperationKind;

/// Shown when the peripheral does not acknowledge a READ in time.
pub const READ_TIMEOUT_MESSAGE: &str = "command execution time out";

/// Shown after WRITE and BRUTEFORCE, which the firmware never acknowledges.
pub const UNACKNOWLEDGED_NOTE: &str =
    "Command sent. The peripheral does not acknowledge it, so success cannot be confirmed.";

pub const BRUTEFORCE_WARNING: [&str; 2] = [
    "!! THIS IS NOT INTENDED TO RECOVER THE FULL PASSWORD !!",
    "!! DO NOT USE UNLESS THE FIRST 5 BYTES OF THE PASSWORD ARE KNOWN !!",
];

/// Configuration dump.
pub fn config_lines(config: &TagConfig) -> Vec<String> {
    vec![
        format!("Password (LSB first on bytes) : {}", config.password),
        format!("Tag initialization delay      : {} us", config.init_delay),
        format!("Offset low pulses width       : {} us", config.offset_width),
        format!("Offset low pulses position    : {} us", config.offset_position),
    ]
}

/// Echo printed before a WRITE is sent.
pub fn write_lines(request: &WriteRequest) -> Vec<String> {
    vec![
        format!("Writing block: {}", request.block()),
        format!("          pos: {}", request.byte_index()),
        format!("         data: 0x{:02X}", request.data()),
    ]
}

/// Echo printed before a BRUTEFORCE is sent.
pub fn bruteforce_lines(request: &BruteforceRequest) -> Vec<String> {
    let bytes: Vec<String> = request
        .start_password()
        .bytes()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect();
    vec![
        format!("Bruteforcing from password: {}", bytes.join(" ")),
        format!("Trying each password {} times", request.tries()),
    ]
}

/// Usage text for one operation.
pub fn usage(kind: OperationKind) -> &'static str {
    match kind {
        OperationKind::Read => READ_USAGE,
        OperationKind::Write => WRITE_USAGE,
        OperationKind::Bruteforce => BRUTEFORCE_USAGE,
        OperationKind::Config => CONFIG_USAGE,
    }
}

/// One-line summary for command listings.
pub fn summary(kind: OperationKind) -> &'static str {
    match kind {
        OperationKind::Read => "Read content of a PCF7931 transponder",
        OperationKind::Write => "Write data on a PCF7931 transponder",
        OperationKind::Bruteforce => "Bruteforce a PCF7931 transponder password",
        OperationKind::Config => {
            "Configure the password, the tag initialization delay and time offsets (optional)"
        }
    }
}

const READ_USAGE: &str = "\
Usage: read [h]
This command tries to read a PCF7931 tag.
Options:
       h   This help
Examples:
      read";

const WRITE_USAGE: &str = "\
Usage: write [h] <block address> <byte address> <data>
This command tries to write a PCF7931 tag.
Options:
       h              This help
       block address  Block to save [0-7]
       byte address   Index of byte inside block to write [0-15]
       data           one byte of data (hex)
Examples:
      write 2 1 FF";

const BRUTEFORCE_USAGE: &str = "\
Usage: bruteforce [h] <start password> <tries>
This command tries to disable PAC of a PCF7931 transponder by bruteforcing the password.
!! THIS IS NOT INTENDED TO RECOVER THE FULL PASSWORD !!
!! DO NOT USE UNLESS THE FIRST 5 BYTES OF THE PASSWORD ARE KNOWN !!
Options:
       h                This help
       start password   hex password to start from
       tries            How many times to send the same data frame
Examples:
      bruteforce 00000000123456 3";

const CONFIG_USAGE: &str = "\
Usage: config [h] [r] <pwd> <delay> <offset width> <offset position>
This command sets the configuration used with PCF7931 commands.
The time offsets can correct the slew rate generated by the antenna.
Calling without parameters prints the current configuration.
Options:
       h                This help
       r                Reset configuration to default values
       pwd              Password, hex, 7 bytes, LSB-order
       delay            Tag initialization delay (in us) decimal
       offset width     Low pulses width (in us) decimal
       offset position  Low pulses position (in us) decimal
Examples:
      config
      config r
      config 11223344556677 20000
      config 11223344556677 17500 -10 30";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigStore;

    #[test]
    fn test_config_lines_defaults() {
        let lines = config_lines(&ConfigStore::new().snapshot());
        assert_eq!(
            lines,
            vec![
                "Password (LSB first on bytes) : FF FF FF FF FF FF FF",
                "Tag initialization delay      : 17500 us",
                "Offset low pulses width       : 0 us",
                "Offset low pulses position    : 0 us",
            ]
        );
    }

    #[test]
    fn test_config_lines_negative_offset() {
        let mut store = ConfigStore::new();
        store.set([0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77], 20000, -10, 30);
        let lines = config_lines(&store.snapshot());
        assert_eq!(lines[0], "Password (LSB first on bytes) : 11 22 33 44 55 66 77");
        assert_eq!(lines[2], "Offset low pulses width       : -10 us");
    }

    #[test]
    fn test_write_lines() {
        let lines = write_lines(&WriteRequest::new(2, 1, 0xFF).unwrap());
        assert_eq!(
            lines,
            vec!["Writing block: 2", "          pos: 1", "         data: 0xFF"]
        );
    }

    #[test]
    fn test_bruteforce_lines() {
        let request = BruteforceRequest::new([0, 0, 0, 0, 0x12, 0x34, 0x56], 3).unwrap();
        let lines = bruteforce_lines(&request);
        assert_eq!(
            lines[0],
            "Bruteforcing from password: 00 00 00 00 12 34 56"
        );
        assert_eq!(lines[1], "Trying each password 3 times");
    }

    #[test]
    fn test_usage_mentions_scope_warning() {
        let text = usage(OperationKind::Bruteforce);
        for line in BRUTEFORCE_WARNING {
            assert!(text.contains(line));
        }
        assert!(usage(OperationKind::Write).contains("[0-7]"));
        assert!(usage(OperationKind::Config).contains("config r"));
    }
}
