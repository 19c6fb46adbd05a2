//! Structure mirroring the TOML configuration file format.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::transport::SocksCredentials;

use super::{ConfigError, Pacing, VerifierOptions};

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub(crate) smtp: SmtpSection,
    #[serde(default)]
    pub(crate) retry: RetrySection,
    #[serde(default)]
    pub(crate) pacing: PacingSection,
    #[serde(default)]
    pub(crate) tor: TorSection,
    #[serde(default)]
    pub(crate) providers: ProvidersSection,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct SmtpSection {
    pub(crate) port: Option<u16>,
    pub(crate) connect_timeout_secs: Option<u64>,
    pub(crate) helo_domain: Option<String>,
    pub(crate) mail_from: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct RetrySection {
    pub(crate) max_retries: Option<u32>,
    pub(crate) retry_delay_secs: Option<u64>,
    pub(crate) soft_fail_codes: Option<Vec<u16>>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct PacingSection {
    pub(crate) mean_secs: Option<f64>,
    pub(crate) jitter_secs: Option<f64>,
    pub(crate) per_hour: Option<u32>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct TorSection {
    pub(crate) enabled: Option<bool>,
    pub(crate) socks_addr: Option<String>,
    pub(crate) control_addr: Option<String>,
    pub(crate) control_password: Option<String>,
    pub(crate) socks_username: Option<String>,
    pub(crate) socks_password: Option<String>,
    pub(crate) health_timeout_secs: Option<u64>,
    pub(crate) restart_settle_secs: Option<u64>,
    pub(crate) restart_command: Option<Vec<String>>,
    pub(crate) rotate_after: Option<u32>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct ProvidersSection {
    pub(crate) tentative: Option<Vec<String>>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        Self::parse(&raw, &display)
    }

    pub fn parse(raw: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    /// Overlay the values present in the file on top of `options`.
    pub fn apply(&self, options: &mut VerifierOptions) -> Result<(), ConfigError> {
        let smtp = &self.smtp;
        if let Some(port) = smtp.port {
            options.port = port;
        }
        if let Some(secs) = smtp.connect_timeout_secs {
            options.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(helo) = &smtp.helo_domain {
            options.helo_domain = helo.clone();
        }
        if let Some(from) = &smtp.mail_from {
            options.mail_from = from.clone();
        }

        let retry = &self.retry;
        if let Some(n) = retry.max_retries {
            options.max_retries = n;
        }
        if let Some(secs) = retry.retry_delay_secs {
            options.retry_delay = Duration::from_secs(secs);
        }
        if let Some(codes) = &retry.soft_fail_codes {
            options.soft_fail_codes = codes.clone();
        }

        options.pacing = self.pacing.resolve(options.pacing)?;

        let tor = &self.tor;
        if let Some(enabled) = tor.enabled {
            options.tor.enabled = enabled;
        }
        if let Some(addr) = &tor.socks_addr {
            options.tor.socks_addr = parse_addr("tor.socks_addr", addr)?;
        }
        if let Some(addr) = &tor.control_addr {
            options.tor.control_addr = parse_addr("tor.control_addr", addr)?;
        }
        if let Some(pw) = &tor.control_password {
            options.tor.control_password = Some(pw.clone());
        }
        match (&tor.socks_username, &tor.socks_password) {
            (Some(username), Some(password)) => {
                options.tor.socks_credentials = Some(SocksCredentials {
                    username: username.clone(),
                    password: password.clone(),
                });
            }
            (None, None) => {}
            _ => {
                return Err(ConfigError::invalid(
                    "tor.socks_username",
                    "socks_username and socks_password go together",
                ));
            }
        }
        if let Some(secs) = tor.health_timeout_secs {
            options.tor.health_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = tor.restart_settle_secs {
            options.tor.restart_settle = Duration::from_secs(secs);
        }
        if let Some(cmd) = &tor.restart_command {
            options.tor.restart_command = cmd.clone();
        }
        if let Some(n) = tor.rotate_after {
            options.rotate_after = n;
        }

        if let Some(list) = &self.providers.tentative {
            options.tentative_providers = list.clone();
        }
        Ok(())
    }
}

impl PacingSection {
    fn resolve(&self, current: Pacing) -> Result<Pacing, ConfigError> {
        let jitter = match self.jitter_secs {
            Some(secs) => secs_f64("pacing.jitter_secs", secs)?,
            None => current.jitter,
        };
        match (self.per_hour, self.mean_secs) {
            (Some(_), Some(_)) => Err(ConfigError::invalid(
                "pacing.per_hour",
                "set either per_hour or mean_secs, not both",
            )),
            (Some(rate), None) => Ok(Pacing::per_hour(rate, jitter)),
            (None, Some(mean)) => Ok(Pacing::new(secs_f64("pacing.mean_secs", mean)?, jitter)),
            (None, None) => Ok(Pacing::new(current.mean, jitter)),
        }
    }
}

fn secs_f64(field: &'static str, secs: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(secs).map_err(|err| ConfigError::invalid(field, err.to_string()))
}

pub(crate) fn parse_addr(field: &'static str, raw: &str) -> Result<SocketAddr, ConfigError> {
    raw.parse()
        .map_err(|_| ConfigError::invalid(field, format!("'{raw}' is not host:port")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlays_only_present_values() {
        let file = ConfigFile::parse(
            r#"
            [smtp]
            helo_domain = "probe.example.net"

            [retry]
            retry_delay_secs = 2

            [tor]
            control_password = "hunter2"
            restart_command = ["brew", "services", "restart", "tor"]

            [providers]
            tentative = ["google.com"]
            "#,
            "inline",
        )
        .expect("parse");

        let mut opts = VerifierOptions::default();
        file.apply(&mut opts).expect("apply");
        assert_eq!(opts.helo_domain, "probe.example.net");
        assert_eq!(opts.retry_delay, Duration::from_secs(2));
        assert_eq!(opts.max_retries, 3);
        assert_eq!(opts.tor.control_password.as_deref(), Some("hunter2"));
        assert_eq!(opts.tor.restart_command[0], "brew");
        assert_eq!(opts.tentative_providers, vec!["google.com".to_string()]);
        assert_eq!(opts.mail_from, "test@example.com");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ConfigFile::parse("[smtp]\nhelo = \"x\"\n", "inline").expect_err("should fail");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn per_hour_sets_pacing_mean() {
        let file = ConfigFile::parse("[pacing]\nper_hour = 360\njitter_secs = 0.5\n", "inline")
            .expect("parse");
        let mut opts = VerifierOptions::default();
        file.apply(&mut opts).expect("apply");
        assert_eq!(opts.pacing.mean, Duration::from_secs(10));
        assert_eq!(opts.pacing.jitter, Duration::from_millis(500));
    }

    #[test]
    fn bad_socket_address_is_invalid() {
        let file = ConfigFile::parse("[tor]\nsocks_addr = \"localhost\"\n", "inline")
            .expect("parse");
        let mut opts = VerifierOptions::default();
        assert!(matches!(
            file.apply(&mut opts),
            Err(ConfigError::Invalid {
                field: "tor.socks_addr",
                ..
            })
        ));
    }
}
