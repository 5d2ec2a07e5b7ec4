//! Command execution.

use crate::settings::Settings;
use colored::Colorize;
use pcf7931_client::{Client, ClientError, Outcome};
use pcf7931_core::report;
use pcf7931_core::{ConfigStore, CoreError, Operation, OperationKind, PacketEncoder};
use pcf7931_protocol::{Encoder, RequestPacket};
use std::path::PathBuf;

/// State shared by one-shot and REPL execution.
pub struct Session {
    settings: Settings,
    settings_path: Option<PathBuf>,
    store: ConfigStore,
    dirty: bool,
    dry_run: bool,
    client: Option<Client>,
}

impl Session {
    pub fn new(settings: Settings, settings_path: Option<PathBuf>, dry_run: bool) -> Self {
        let store = ConfigStore::from_config(settings.tag);
        Self {
            settings,
            settings_path,
            store,
            dirty: false,
            dry_run,
            client: None,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Parses and runs one command, returning the lines to print.
    pub async fn run(
        &mut self,
        kind: OperationKind,
        args: &[&str],
    ) -> Result<Vec<String>, Box<dyn std::error::Error>> {
        let op = Operation::parse_kind(kind, args).map_err(|e| with_usage(kind, e))?;
        self.execute(op).await
    }

    /// Runs an already parsed operation.
    pub async fn execute(
        &mut self,
        op: Operation,
    ) -> Result<Vec<String>, Box<dyn std::error::Error>> {
        if let Operation::Config(cmd) = op {
            let config = cmd.apply(&mut self.store);
            self.dirty |= cmd.mutates();
            return Ok(report::config_lines(&config));
        }

        let encoder = PacketEncoder::from_store(&self.store);
        let mut lines = match &op {
            Operation::Write(request) => report::write_lines(request),
            Operation::Bruteforce(request) => report::bruteforce_lines(request),
            _ => Vec::new(),
        };
        let Some(packet) = op.to_packet(&encoder) else {
            return Ok(lines);
        };

        if self.dry_run {
            lines.extend(dry_run_lines(&packet)?);
            return Ok(lines);
        }

        let client = self.client().await?;
        match client.execute(&packet).await {
            Ok(Outcome::Acknowledged(ack)) => {
                lines.extend(ack.device_output);
            }
            Ok(Outcome::Dispatched) => {
                lines.push(report::UNACKNOWLEDGED_NOTE.yellow().to_string());
            }
            Err(ClientError::Timeout) => {
                return Err(report::READ_TIMEOUT_MESSAGE.into());
            }
            Err(e) => {
                if !client.is_connected() {
                    self.client = None;
                }
                return Err(e.into());
            }
        }
        Ok(lines)
    }

    /// Writes the tag configuration back to the settings file if it changed.
    ///
    /// Only the `tag` section is replaced. The rest of the file is re-read so
    /// command-line and environment overrides never end up in it.
    pub fn persist(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if !self.dirty {
            return Ok(());
        }
        let Some(path) = &self.settings_path else {
            tracing::warn!("No settings file; tag configuration not saved");
            return Ok(());
        };
        let mut on_disk = if path.exists() {
            Settings::from_file(path)?
        } else {
            Settings::default()
        };
        on_disk.tag = self.store.snapshot();
        on_disk.save(path)?;
        self.dirty = false;
        Ok(())
    }

    /// Closes the device connection, if one was opened.
    pub async fn close(&mut self) {
        if let Some(mut client) = self.client.take() {
            let _ = client.close().await;
        }
    }

    async fn client(&mut self) -> Result<&mut Client, ClientError> {
        if self.client.is_none() {
            let config = self.settings.device.connection_config();
            let client = Client::open(&config).await?;
            self.client = Some(client);
        }
        self.client.as_mut().ok_or(ClientError::NotConnected)
    }
}

/// Encoded packet, for `--dry-run`.
pub fn dry_run_lines(packet: &RequestPacket) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let frame = packet.to_frame();
    let mut lines = vec![format!("{} {}", "Packet".bold(), packet.opcode())];
    lines.extend(frame.hex_dump()?.lines().map(str::to_string));
    lines.push(Encoder::describe(packet)?);
    Ok(lines)
}

/// Caller-input error plus the usage text of the command it came from.
#[derive(Debug)]
pub struct UsageError {
    pub kind: OperationKind,
    pub source: CoreError,
}

impl std::fmt::Display for UsageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)?;
        if self.source.wants_usage() {
            write!(f, "\n\n{}", report::usage(self.kind))?;
        }
        Ok(())
    }
}

impl std::error::Error for UsageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

fn with_usage(kind: OperationKind, source: CoreError) -> Box<dyn std::error::Error> {
    Box::new(UsageError { kind, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(path: Option<PathBuf>) -> Session {
        Session::new(Settings::default(), path, true)
    }

    #[tokio::test]
    async fn test_config_view_prints_defaults() {
        let mut session = session(None);
        let lines = session.run(OperationKind::Config, &[]).await.unwrap();
        assert_eq!(lines[0], "Password (LSB first on bytes) : FF FF FF FF FF FF FF");
        assert_eq!(lines[1], "Tag initialization delay      : 17500 us");
    }

    #[tokio::test]
    async fn test_config_set_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        let mut session = session(Some(path.clone()));

        session
            .run(OperationKind::Config, &["00000000000000", "20000", "-10", "30"])
            .await
            .unwrap();
        session.persist().unwrap();

        let saved = Settings::from_file(&path).unwrap();
        assert_eq!(saved.tag.init_delay, 20000);
        assert_eq!(saved.tag.offset_width, -10);
        assert_eq!(saved.tag.offset_position, 30);
    }

    #[tokio::test]
    async fn test_persist_leaves_device_overrides_out_of_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");

        let mut on_disk = Settings::default();
        on_disk.device.port = "/dev/ttyACM1".to_string();
        on_disk.tag.init_delay = 20000;
        on_disk.save(&path).unwrap();

        let mut settings = Settings::from_file(&path).unwrap();
        settings.device.port = "/dev/ttyUSB9".to_string();
        settings.device.ack_timeout_ms = 10;
        let mut session = Session::new(settings, Some(path.clone()), true);

        session.run(OperationKind::Config, &["r"]).await.unwrap();
        session.persist().unwrap();

        let saved = Settings::from_file(&path).unwrap();
        assert_eq!(saved.device.port, "/dev/ttyACM1");
        assert_eq!(saved.device.ack_timeout_ms, 2500);
        assert_eq!(saved.tag, pcf7931_core::TagConfig::default());
    }

    #[tokio::test]
    async fn test_config_view_does_not_write_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        let mut session = session(Some(path.clone()));

        session.run(OperationKind::Config, &[]).await.unwrap();
        session.persist().unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_dry_run_write_uses_config() {
        let mut session = session(None);
        session
            .run(OperationKind::Config, &["00000000000000", "20000", "-10", "30"])
            .await
            .unwrap();

        let lines = session
            .run(OperationKind::Write, &["2", "1", "FF"])
            .await
            .unwrap();
        assert_eq!(lines[0], "Writing block: 2");
        assert_eq!(lines[2], "         data: 0xFF");
        assert!(lines.iter().any(|l| l.starts_with("0000: 2202")));
        assert!(lines.iter().any(|l| l.contains("\"offset_width\": 118")));
    }

    #[tokio::test]
    async fn test_invalid_input_carries_usage() {
        let mut session = session(None);
        let err = session
            .run(OperationKind::Write, &["8", "1", "FF"])
            .await
            .unwrap_err();
        let text = err.to_string();
        assert!(text.starts_with("block address 8 out of range"));
        assert!(text.contains("Usage: write"));
    }

    #[test]
    fn test_dry_run_lines_for_read() {
        let lines = dry_run_lines(&RequestPacket::read()).unwrap();
        // Header, 17 dump lines, JSON summary.
        assert_eq!(lines.len(), 19);
        assert!(lines[1].starts_with("0000: 1702000000000000"));
    }
}
