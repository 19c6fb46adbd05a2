use crate::config::VerifierOptions;
use crate::smtp::{ProbeError, SmtpReply};

/// Map a RCPT reply to acceptance or a typed failure.
///
/// Precedence: 250/251 accept, soft-fail codes retry, 550 rejects even on
/// tentative providers, any other code from a tentative provider is
/// ambiguous, the rest reject.
pub(crate) fn classify_reply(
    options: &VerifierOptions,
    host: &str,
    reply: SmtpReply,
) -> Result<SmtpReply, ProbeError> {
    let SmtpReply { code, message } = reply;
    if matches!(code, 250 | 251) {
        return Ok(SmtpReply { code, message });
    }
    let host = host.to_string();
    if options.is_soft_fail(code) {
        return Err(ProbeError::SoftFailCode {
            host,
            code,
            message,
        });
    }
    if code != 550 && options.is_tentative_provider(&host) {
        return Err(ProbeError::AmbiguousProviderCode {
            host,
            code,
            message,
        });
    }
    Err(ProbeError::HardRejectCode {
        host,
        code,
        message,
    })
}
