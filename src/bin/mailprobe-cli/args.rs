use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use mailprobe_lib::{ConfigFile, Pacing, ReportFormat, SocksCredentials, VerifierOptions};

#[derive(Parser)]
#[command(name = "mailprobe-cli", version, about = "Sonde SMTP (RCPT TO) de boîtes aux lettres")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// vérifie une liste d'adresses (une par ligne) et écrit les valides en JSON
    Verify(VerifyArgs),
    /// vérifie une seule adresse
    Check(CheckArgs),
    /// génère les adresses candidates d'une personne
    Permute(PermuteArgs),
}

#[derive(Args)]
pub struct VerifyArgs {
    /// fichier d'entrée (une adresse par ligne)
    #[arg(long, short, env = "MAILPROBE_INPUT")]
    pub input: PathBuf,

    /// tableau JSON des adresses valides
    #[arg(long, short, env = "MAILPROBE_OUTPUT", default_value = "verified.json")]
    pub output: PathBuf,

    /// rapport détaillé par adresse (voir --report-format)
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// format du rapport: ndjson|csv
    #[arg(long, default_value = "ndjson")]
    pub report_format: String,

    #[command(flatten)]
    pub probe: ProbeArgs,
}

impl VerifyArgs {
    pub fn report_format(&self) -> Result<ReportFormat> {
        Ok(self.report_format.parse()?)
    }
}

#[derive(Args)]
pub struct CheckArgs {
    /// adresse e-mail à tester
    pub email: String,

    /// format de sortie: human|json
    #[arg(long, default_value = "human")]
    pub format: String,

    #[command(flatten)]
    pub probe: ProbeArgs,
}

#[derive(Args)]
pub struct PermuteArgs {
    /// prénom
    #[arg(long)]
    pub first: String,

    /// nom
    #[arg(long)]
    pub last: String,

    /// site web ou domaine de l'entreprise
    #[arg(long)]
    pub website: String,

    /// écrit les adresses dans ce fichier au lieu de stdout
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Réglages communs à `verify` et `check`; ils priment sur le fichier TOML.
#[derive(Args, Default)]
pub struct ProbeArgs {
    /// fichier de configuration TOML
    #[arg(long, env = "MAILPROBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// journal (ajout en fin de fichier)
    #[arg(long, env = "MAILPROBE_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// connexion TCP directe, sans Tor
    #[arg(long, env = "MAILPROBE_DIRECT")]
    pub direct: bool,

    /// nom utilisé pour EHLO/HELO
    #[arg(long, env = "MAILPROBE_HELO")]
    pub helo: Option<String>,

    /// enveloppe MAIL FROM
    #[arg(long = "from", env = "MAILPROBE_MAIL_FROM")]
    pub mail_from: Option<String>,

    /// port SMTP des MX
    #[arg(long, env = "MAILPROBE_PORT")]
    pub port: Option<u16>,

    /// timeout de connexion et de lecture (s)
    #[arg(long = "timeout", env = "MAILPROBE_TIMEOUT")]
    pub timeout_secs: Option<u64>,

    /// tentatives par MX
    #[arg(long, env = "MAILPROBE_MAX_RETRIES")]
    pub max_retries: Option<u32>,

    /// délai de base entre tentatives (s), multiplié par le numéro de tentative
    #[arg(long = "retry-delay", env = "MAILPROBE_RETRY_DELAY")]
    pub retry_delay_secs: Option<u64>,

    /// pause moyenne entre adresses (s)
    #[arg(long = "pace", env = "MAILPROBE_PACE")]
    pub pace_secs: Option<f64>,

    /// variation aléatoire de la pause (s)
    #[arg(long = "jitter", env = "MAILPROBE_JITTER")]
    pub jitter_secs: Option<f64>,

    /// proxy SOCKS5 (host:port)
    #[arg(long, env = "MAILPROBE_SOCKS")]
    pub socks: Option<String>,

    /// port de contrôle Tor (host:port)
    #[arg(long, env = "MAILPROBE_CONTROL")]
    pub control: Option<String>,

    /// mot de passe du port de contrôle
    #[arg(long, env = "MAILPROBE_CONTROL_PASSWORD", hide_env_values = true)]
    pub control_password: Option<String>,

    /// identifiant SOCKS (isolation de circuit)
    #[arg(long, env = "MAILPROBE_SOCKS_USER", requires = "socks_password")]
    pub socks_user: Option<String>,

    /// mot de passe SOCKS
    #[arg(long, env = "MAILPROBE_SOCKS_PASSWORD", hide_env_values = true)]
    pub socks_password: Option<String>,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}

impl ProbeArgs {
    /// Defaults, then the TOML file, then flags and environment.
    pub fn options(&self) -> Result<VerifierOptions> {
        let mut options = VerifierOptions::default();
        if let Some(path) = &self.config {
            let file = ConfigFile::load(path)?;
            file.apply(&mut options)
                .with_context(|| format!("apply {}", path.display()))?;
        }
        self.apply(&mut options)?;
        options.validate()?;
        Ok(options)
    }

    fn apply(&self, options: &mut VerifierOptions) -> Result<()> {
        if self.direct {
            options.tor.enabled = false;
        }
        if let Some(helo) = &self.helo {
            options.helo_domain = helo.clone();
        }
        if let Some(from) = &self.mail_from {
            options.mail_from = from.clone();
        }
        if let Some(port) = self.port {
            options.port = port;
        }
        if let Some(secs) = self.timeout_secs {
            options.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(n) = self.max_retries {
            options.max_retries = n;
        }
        if let Some(secs) = self.retry_delay_secs {
            options.retry_delay = Duration::from_secs(secs);
        }
        if self.pace_secs.is_some() || self.jitter_secs.is_some() {
            let mean = match self.pace_secs {
                Some(secs) => seconds("--pace", secs)?,
                None => options.pacing.mean,
            };
            let jitter = match self.jitter_secs {
                Some(secs) => seconds("--jitter", secs)?,
                None => options.pacing.jitter.min(mean),
            };
            options.pacing = Pacing::new(mean, jitter);
        }
        if let Some(addr) = &self.socks {
            options.tor.socks_addr = addr
                .parse()
                .with_context(|| format!("--socks '{addr}' n'est pas host:port"))?;
        }
        if let Some(addr) = &self.control {
            options.tor.control_addr = addr
                .parse()
                .with_context(|| format!("--control '{addr}' n'est pas host:port"))?;
        }
        if let Some(pw) = &self.control_password {
            options.tor.control_password = Some(pw.clone());
        }
        if let (Some(username), Some(password)) = (&self.socks_user, &self.socks_password) {
            options.tor.socks_credentials = Some(SocksCredentials {
                username: username.clone(),
                password: password.clone(),
            });
        }
        Ok(())
    }
}

fn seconds(flag: &str, secs: f64) -> Result<Duration> {
    match Duration::try_from_secs_f64(secs) {
        Ok(d) => Ok(d),
        Err(_) => bail!("{flag} attend un nombre de secondes positif, reçu {secs}"),
    }
}
