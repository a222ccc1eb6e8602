//! CLI argument definitions for sysrelay-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use sysrelay_core::config::SysrelayConfig;

/// sysrelay syslog relay daemon.
///
/// Receives syslog datagrams, corrects per-device timestamps, normalizes
/// them to RFC 3164 and forwards them to a downstream collector.
#[derive(Parser, Debug)]
#[command(name = "sysrelay-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to sysrelay.toml configuration file.
    #[arg(short, long, default_value = "/etc/sysrelay/sysrelay.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration file and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,

    /// Override PID file path (takes precedence over config file).
    #[arg(long)]
    pub pid_file: Option<String>,

    /// Override inbound listen address (e.g. 0.0.0.0:513).
    #[arg(long)]
    pub listen: Option<String>,

    /// Override downstream collector address (e.g. 127.0.0.1:514).
    #[arg(long)]
    pub forward: Option<String>,
}

impl DaemonCli {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut SysrelayConfig) {
        if let Some(level) = &self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.general.log_format = format.clone();
        }
        if let Some(pid_file) = &self.pid_file {
            config.general.pid_file = pid_file.clone();
        }
        if let Some(listen) = &self.listen {
            config.relay.listen_addr = listen.clone();
        }
        if let Some(forward) = &self.forward {
            config.relay.forward_addr = forward.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_arguments() {
        let cli = DaemonCli::try_parse_from(["sysrelay-daemon"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("/etc/sysrelay/sysrelay.toml"));
        assert!(!cli.validate);
        assert!(cli.listen.is_none());
    }

    #[test]
    fn overrides_take_precedence() {
        let cli = DaemonCli::try_parse_from([
            "sysrelay-daemon",
            "--config",
            "/tmp/relay.toml",
            "--log-level",
            "debug",
            "--listen",
            "127.0.0.1:5513",
            "--forward",
            "10.0.0.5:514",
            "--pid-file",
            "",
        ])
        .unwrap();

        let mut config = SysrelayConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.general.log_format, "json");
        assert_eq!(config.relay.listen_addr, "127.0.0.1:5513");
        assert_eq!(config.relay.forward_addr, "10.0.0.5:514");
        assert_eq!(config.general.pid_file, "");
    }

    #[test]
    fn validate_flag() {
        let cli = DaemonCli::try_parse_from(["sysrelay-daemon", "--validate"]).unwrap();
        assert!(cli.validate);
    }
}
