use std::time::Duration;

use crate::cli::Cli;
use crate::controller::{RunOptions, DEFAULT_CAPTURE_PAUSE};
use crate::domain::ProtocolClass;
use crate::error::ConfigError;
use crate::reporter::TraceFilter;

/// Environment variable overriding the pause between capture attempts.
pub const PAUSE_ENV: &str = "SEEPACKETS_PAUSE_MS";

/// Everything one run needs, resolved from the command line and environment.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub interface: String,
    pub max_duration: Option<Duration>,
    pub trace: TraceFilter,
    pub show_payloads: bool,
    pub capture_pause: Duration,
}

impl RunConfig {
    /// Resolve the command line, then apply environment overrides.
    pub fn load(cli: Cli) -> Result<Self, ConfigError> {
        let mut config = Self::from(cli);
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup(PAUSE_ENV) {
            let millis: u64 = val.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: PAUSE_ENV,
                value: val.clone(),
            })?;
            self.capture_pause = Duration::from_millis(millis);
        }
        Ok(())
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            max_duration: self.max_duration,
            capture_pause: self.capture_pause,
        }
    }
}

impl From<Cli> for RunConfig {
    fn from(cli: Cli) -> Self {
        let flags = [
            (cli.tcp, ProtocolClass::Tcp),
            (cli.udp, ProtocolClass::Udp),
            (cli.icmp, ProtocolClass::Icmp),
            (cli.igmp, ProtocolClass::Igmp),
            (cli.ospf, ProtocolClass::Ospf),
            (cli.arp, ProtocolClass::Arp),
            (cli.other, ProtocolClass::OtherIpv4),
            (cli.other, ProtocolClass::OtherNonIpv4),
        ];
        let trace = flags
            .into_iter()
            .filter(|(on, _)| *on)
            .fold(TraceFilter::none(), |filter, (_, class)| filter.with(class));

        Self {
            interface: cli.interface,
            max_duration: cli.max_duration.map(Duration::from_secs),
            trace,
            show_payloads: cli.payloads,
            capture_pause: DEFAULT_CAPTURE_PAUSE,
        }
    }
}
