use crate::server::response::ApiError;

const MAX_NAME_LEN: usize = 100;

/// Business line and cost center names are free-form display strings; only
/// emptiness and length are constrained.
pub fn validate_name(name: &str, entity: &str) -> Result<(), ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::bad_request(format!(
            "{entity} name cannot be empty"
        )));
    }
    if trimmed.len() > MAX_NAME_LEN {
        return Err(ApiError::bad_request(format!(
            "{entity} name cannot exceed {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Marketing", "Business line").is_ok());
        assert!(validate_name("R&D / Platform", "Cost center").is_ok());
        assert!(validate_name("   ", "Business line").is_err());
        assert!(validate_name(&"x".repeat(101), "Business line").is_err());
    }
}
