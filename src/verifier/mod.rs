//! The probing engine.
//!
//! [`VerifierSession`] owns every piece of per-run state (MX cache,
//! consecutive-timeout counter, verified set) and drives addresses through
//! `START -> NOMX | PROBING -> VALID | INVALID | TENTATIVE | TIMEOUT` one at a
//! time.

mod classify;

use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::address::CandidateAddress;
use crate::anonymizer::Anonymizer;
use crate::config::VerifierOptions;
use crate::mx::{LookupMx, MxCache};
use crate::pause::{Pause, ThreadPause};
use crate::smtp::{HostProber, ProbeError};
use crate::types::{ProbeOutcome, ProbeResult, RunSummary, VerifiedSet};

use classify::classify_reply;

const TARGET: &str = "mailprobe";

pub struct VerifierSession<R, P, A, Z = ThreadPause>
where
    R: LookupMx,
    P: HostProber,
    A: Anonymizer,
    Z: Pause,
{
    resolver: R,
    prober: P,
    anonymizer: A,
    pauser: Z,
    options: VerifierOptions,
    mx_cache: MxCache,
    consecutive_timeouts: u32,
    verified: VerifiedSet,
    rotations: u32,
    rng: StdRng,
}

impl<R, P, A> VerifierSession<R, P, A, ThreadPause>
where
    R: LookupMx,
    P: HostProber,
    A: Anonymizer,
{
    pub fn new(resolver: R, prober: P, anonymizer: A, options: VerifierOptions) -> Self {
        Self {
            resolver,
            prober,
            anonymizer,
            pauser: ThreadPause,
            options,
            mx_cache: MxCache::new(),
            consecutive_timeouts: 0,
            verified: VerifiedSet::new(),
            rotations: 0,
            rng: StdRng::from_entropy(),
        }
    }
}

impl<R, P, A, Z> VerifierSession<R, P, A, Z>
where
    R: LookupMx,
    P: HostProber,
    A: Anonymizer,
    Z: Pause,
{
    /// Swap the delay implementation (backoff, pacing, settle).
    pub fn with_pause<Z2: Pause>(self, pauser: Z2) -> VerifierSession<R, P, A, Z2> {
        VerifierSession {
            resolver: self.resolver,
            prober: self.prober,
            anonymizer: self.anonymizer,
            pauser,
            options: self.options,
            mx_cache: self.mx_cache,
            consecutive_timeouts: self.consecutive_timeouts,
            verified: self.verified,
            rotations: self.rotations,
            rng: self.rng,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn options(&self) -> &VerifierOptions {
        &self.options
    }

    pub fn prober(&self) -> &P {
        &self.prober
    }

    pub fn anonymizer(&self) -> &A {
        &self.anonymizer
    }

    pub fn pauser(&self) -> &Z {
        &self.pauser
    }

    pub fn verified(&self) -> &VerifiedSet {
        &self.verified
    }

    pub fn consecutive_timeouts(&self) -> u32 {
        self.consecutive_timeouts
    }

    /// Exchange hosts for `domain`, lowest preference first. Cached for the
    /// rest of the run; empty when resolution fails.
    pub fn resolve_mx(&mut self, domain: &str) -> Vec<String> {
        self.mx_cache
            .resolve(&self.resolver, domain)
            .iter()
            .map(|record| record.exchange.clone())
            .collect()
    }

    /// Probe every exchange host of `address` until a conclusive answer.
    pub fn probe(&mut self, address: &CandidateAddress) -> ProbeOutcome {
        let mailbox = address.mailbox();
        let hosts = self.resolve_mx(&address.domain);
        if hosts.is_empty() {
            let err = ProbeError::NoMxRecord {
                domain: address.domain.clone(),
            };
            return ProbeOutcome::new(mailbox, ProbeResult::NoMx, err.to_string());
        }

        let max_retries = self.options.max_retries.max(1);
        let mut attempts = 0u32;
        let mut saw_timeout = false;
        let mut last: Option<(String, ProbeError)> = None;

        for host in &hosts {
            for attempt in 1..=max_retries {
                attempts += 1;
                let result = self
                    .prober
                    .probe_host(host, address)
                    .and_then(|reply| classify_reply(&self.options, host, reply));

                let err = match result {
                    Ok(reply) => {
                        let mut outcome =
                            ProbeOutcome::new(&mailbox, ProbeResult::Valid, reply.to_string());
                        outcome.host = Some(host.clone());
                        outcome.code = Some(reply.code);
                        outcome.attempts = attempts;
                        return outcome;
                    }
                    Err(err) => err,
                };

                let terminal = match &err {
                    ProbeError::HardRejectCode { .. } => Some(ProbeResult::Invalid),
                    ProbeError::AmbiguousProviderCode { .. } => Some(ProbeResult::Tentative),
                    _ => None,
                };
                if let Some(result) = terminal {
                    let mut outcome = ProbeOutcome::new(&mailbox, result, err.to_string());
                    outcome.host = Some(host.clone());
                    outcome.code = err.code();
                    outcome.attempts = attempts;
                    return outcome;
                }

                saw_timeout |= err.is_timeout();
                if attempt < max_retries && err.is_retryable() {
                    let delay = self.options.retry_delay.saturating_mul(attempt);
                    warn!(
                        target: TARGET,
                        "[{mailbox}] attempt {attempt}/{max_retries} on {host}: {err}; retrying in {}s",
                        delay.as_secs_f32()
                    );
                    self.pauser.pause(delay);
                    last = Some((host.clone(), err));
                } else {
                    warn!(
                        target: TARGET,
                        "[{mailbox}] attempt {attempt}/{max_retries} on {host}: {err}; giving up on this host"
                    );
                    last = Some((host.clone(), err));
                    break;
                }
            }
        }

        let (host, err) = match last {
            Some((host, err)) => (Some(host), Some(err)),
            None => (None, None),
        };
        let detail = err
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no exchange host answered".to_string());
        let result = if saw_timeout {
            ProbeResult::Timeout
        } else {
            ProbeResult::Error(detail.clone())
        };
        let mut outcome = ProbeOutcome::new(&mailbox, result, detail);
        outcome.host = host;
        outcome.code = err.as_ref().and_then(ProbeError::code);
        outcome.attempts = attempts;
        outcome
    }

    /// Ask the proxy for a new exit identity and reset the counter. Failure
    /// is logged and otherwise ignored.
    pub fn rotate_identity(&mut self) {
        if self.anonymizer.is_enabled() {
            info!(
                target: TARGET,
                "{} consecutive inconclusive results, requesting new identity",
                self.consecutive_timeouts
            );
            match self.anonymizer.new_identity() {
                Ok(()) => {
                    self.rotations += 1;
                    info!(target: TARGET, "identity rotated");
                }
                Err(err) => warn!(target: TARGET, "identity rotation failed: {err}"),
            }
        }
        self.consecutive_timeouts = 0;
    }

    /// Restart the proxy daemon when its ports stop answering.
    pub fn ensure_transport_healthy(&mut self) {
        if !self.anonymizer.is_enabled() {
            return;
        }
        match self.anonymizer.check_health() {
            Ok(()) => debug!(target: TARGET, "proxy healthy"),
            Err(err) => {
                warn!(target: TARGET, "{err}; restarting proxy service");
                if let Err(restart_err) = self.anonymizer.restart() {
                    warn!(target: TARGET, "{restart_err}");
                }
                let settle = self.options.tor.restart_settle;
                info!(
                    target: TARGET,
                    "waiting {}s for proxy to settle",
                    settle.as_secs_f32()
                );
                self.pauser.pause(settle);
            }
        }
    }

    /// Full treatment of one input line: parse, health check, probe, record.
    pub fn verify(&mut self, raw: &str) -> ProbeOutcome {
        let outcome = match CandidateAddress::parse(raw) {
            Ok(address) => {
                self.ensure_transport_healthy();
                self.probe(&address)
            }
            Err(err) => ProbeOutcome::new(
                raw.trim(),
                ProbeResult::Invalid,
                format!("malformed address: {err}"),
            ),
        };

        match &outcome.result {
            ProbeResult::Valid => info!(
                target: TARGET,
                "[{}] {} - {}",
                outcome.result.label(),
                outcome.address,
                outcome.detail
            ),
            _ => warn!(
                target: TARGET,
                "[{}] {} - {}",
                outcome.result.label(),
                outcome.address,
                outcome.detail
            ),
        }

        if outcome.result == ProbeResult::Valid {
            self.verified.insert(outcome.address.clone());
        }
        self.track(&outcome.result);
        outcome
    }

    /// Verify every address in order, pacing between probes.
    pub fn run<I, S>(&mut self, addresses: I) -> RunSummary
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let addresses: Vec<S> = addresses.into_iter().collect();
        let total = addresses.len();
        let mut outcomes = Vec::with_capacity(total);

        for (idx, raw) in addresses.iter().enumerate() {
            debug!(target: TARGET, "({}/{total}) {}", idx + 1, raw.as_ref());
            let outcome = self.verify(raw.as_ref());
            let touched = outcome.touched_network();
            outcomes.push(outcome);
            if touched && idx + 1 < total {
                self.pace();
            }
        }

        let summary = RunSummary {
            verified: self.verified.clone(),
            outcomes,
            rotations: self.rotations,
        };
        info!(target: TARGET, "{}", summary.summary_line());
        summary
    }

    fn pace(&mut self) {
        let delay: Duration = self.options.pacing.sample(&mut self.rng);
        if !delay.is_zero() {
            debug!(target: TARGET, "pacing {:.1}s", delay.as_secs_f32());
            self.pauser.pause(delay);
        }
    }

    /// Timeouts, errors and tentative answers all count toward rotation.
    fn track(&mut self, result: &ProbeResult) {
        if result.is_conclusive() {
            self.consecutive_timeouts = 0;
            return;
        }
        if matches!(
            result,
            ProbeResult::Timeout | ProbeResult::Error(_) | ProbeResult::Tentative
        ) {
            self.consecutive_timeouts += 1;
            if self.consecutive_timeouts >= self.options.rotate_after {
                self.rotate_identity();
            }
        }
    }
}
