use thiserror::Error;

/// Raised when a line of the input list is not a usable `local@domain` address.
#[derive(Debug, Error)]
pub enum AddressError {
    #[error("must contain exactly one '@'")]
    MissingAt,
    #[error("local part length {0} invalid (1..=64)")]
    LocalLength(usize),
    #[error("invalid local part '{0}'")]
    LocalChars(String),
    #[error("domain IDNA conversion failed")]
    Idna,
    #[error("invalid domain: {0}")]
    Domain(String),
}
