//! Anonymizing egress management: proxy health, restart and identity rotation.

mod error;
mod tor;

pub use error::AnonymizerError;
pub use tor::TorController;

/// Operations the verifier needs from the anonymizing network.
pub trait Anonymizer {
    /// Short connect-probe of the proxy's data and control ports.
    fn check_health(&self) -> Result<(), AnonymizerError>;

    /// Ask the local service manager to restart the proxy daemon.
    fn restart(&self) -> Result<(), AnonymizerError>;

    /// Request a fresh exit identity.
    fn new_identity(&self) -> Result<(), AnonymizerError>;

    fn is_enabled(&self) -> bool {
        true
    }
}

/// Direct egress: nothing to check, restart or rotate.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAnonymizer;

impl Anonymizer for NoAnonymizer {
    fn check_health(&self) -> Result<(), AnonymizerError> {
        Ok(())
    }

    fn restart(&self) -> Result<(), AnonymizerError> {
        Ok(())
    }

    fn new_identity(&self) -> Result<(), AnonymizerError> {
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}
