use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use mailprobe_lib::{
    Anonymizer, Connector, DirectConnector, NoAnonymizer, RunSummary, SmtpProber,
    Socks5Connector, TorController, VerifierOptions, VerifierSession, load_candidates, logging,
    system_resolver, write_report, write_verified,
};

use crate::args::{CheckArgs, VerifyArgs};
use crate::output;

const DEFAULT_LOG_FILE: &str = "mailprobe.log";

pub fn run_verify(args: &VerifyArgs) -> Result<()> {
    let options = args.probe.options()?;
    let report_format = args.report_format()?;
    let log_file = args
        .probe
        .log_file
        .clone()
        .unwrap_or_else(|| DEFAULT_LOG_FILE.into());
    logging::init(Some(log_file.as_path()))?;

    let addresses = read_input(&args.input)?;
    info!(
        target: "mailprobe",
        "{} addresses loaded from {}",
        addresses.len(),
        args.input.display()
    );

    let summary = probe_all(options, &addresses)?;

    write_verified(&args.output, &summary.verified)
        .with_context(|| format!("write {}", args.output.display()))?;
    info!(
        target: "mailprobe",
        "{} verified addresses written to {}",
        summary.verified.len(),
        args.output.display()
    );
    if let Some(path) = &args.report {
        write_report(path, &summary.outcomes, report_format)
            .with_context(|| format!("write {}", path.display()))?;
    }
    Ok(())
}

/// Returns whether the address was found valid.
pub fn run_check(args: &CheckArgs) -> Result<bool> {
    let options = args.probe.options()?;
    logging::init(args.probe.log_file.as_deref())?;

    let summary = probe_all(options, std::slice::from_ref(&args.email))?;
    let Some(outcome) = summary.outcomes.first() else {
        return Ok(false);
    };
    output::print_outcome(outcome, &args.format)?;
    Ok(!summary.verified.is_empty())
}

fn read_input(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    load_candidates(BufReader::new(file)).with_context(|| format!("read {}", path.display()))
}

/// Build the engine for the configured egress and run it over `addresses`.
fn probe_all(options: VerifierOptions, addresses: &[String]) -> Result<RunSummary> {
    let timeout = options.connect_timeout;
    if options.tor.enabled {
        let connector = Socks5Connector::new(options.tor.socks_addr, timeout, timeout)
            .with_credentials(options.tor.socks_credentials.clone());
        let tor = TorController::from_options(&options.tor);
        info!(
            target: "mailprobe",
            "routing through SOCKS5 proxy {}",
            options.tor.socks_addr
        );
        execute(options, connector, tor, addresses)
    } else {
        info!(target: "mailprobe", "direct mode: no proxy");
        execute(
            options,
            DirectConnector::new(timeout, timeout),
            NoAnonymizer,
            addresses,
        )
    }
}

fn execute<C, A>(
    options: VerifierOptions,
    connector: C,
    anonymizer: A,
    addresses: &[String],
) -> Result<RunSummary>
where
    C: Connector,
    A: Anonymizer,
{
    let resolver = system_resolver()?;
    let prober = SmtpProber::new(connector, options.port, options.envelope());
    let mut session = VerifierSession::new(resolver, prober, anonymizer, options);
    Ok(session.run(addresses))
}
