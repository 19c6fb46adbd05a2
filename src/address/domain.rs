use crate::address::AddressError;

/// Convertit le domaine en ASCII (IDNA) et vérifie les labels.
pub(crate) fn to_ascii_domain(domain: &str) -> Result<String, AddressError> {
    let ascii = idna::domain_to_ascii(domain.trim()).map_err(|_| AddressError::Idna)?;
    let ascii = ascii.trim_end_matches('.').to_string();

    if ascii.is_empty() {
        return Err(AddressError::Domain("empty after IDNA conversion".into()));
    }
    if !ascii.contains('.') {
        return Err(AddressError::Domain(format!(
            "'{ascii}' must contain at least one dot"
        )));
    }

    for label in ascii.split('.') {
        if label.is_empty() {
            return Err(AddressError::Domain("empty domain label".into()));
        }
        if label.len() > 63 {
            return Err(AddressError::Domain(format!(
                "label '{label}' length {} > 63",
                label.len()
            )));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(AddressError::Domain(format!(
                "label '{label}' cannot start/end with '-'"
            )));
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(AddressError::Domain(format!(
                "label '{label}' has invalid chars"
            )));
        }
    }
    Ok(ascii)
}
