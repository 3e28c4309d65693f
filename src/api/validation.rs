use super::ApiError;

/// Reject-not-clamp policy for pagination input.
pub fn validate_page(page: i64) -> Result<u64, ApiError> {
    if page < 1 {
        return Err(ApiError::validation(format!(
            "Invalid page: {}. Page must be a positive integer",
            page
        )));
    }
    #[allow(clippy::cast_sign_loss)]
    let page = page as u64;
    Ok(page)
}

pub fn validate_limit(limit: i64) -> Result<u64, ApiError> {
    const MAX_LIMIT: i64 = 100;

    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(ApiError::validation(format!(
            "Invalid limit: {}. Limit must be between 1 and {}",
            limit, MAX_LIMIT
        )));
    }
    #[allow(clippy::cast_sign_loss)]
    let limit = limit as u64;
    Ok(limit)
}

/// Minimal shape check; the real proof of ownership is the emailed code.
pub fn validate_email(email: &str) -> Result<String, ApiError> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }

    let Some((local, domain)) = trimmed.split_once('@') else {
        return Err(ApiError::validation("Invalid email address"));
    };

    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(ApiError::validation("Invalid email address"));
    }

    Ok(trimmed.to_lowercase())
}

pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), ApiError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(ApiError::validation(format!(
            "Invalid latitude: {}. Latitude must be between -90 and 90",
            latitude
        )));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(ApiError::validation(format!(
            "Invalid longitude: {}. Longitude must be between -180 and 180",
            longitude
        )));
    }
    Ok(())
}

/// A required text field: present and non-blank after trimming.
pub fn validate_required<'a>(value: &'a str, field: &str) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation(format!("{} is required", field)));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_page() {
        assert_eq!(validate_page(1).unwrap(), 1);
        assert_eq!(validate_page(42).unwrap(), 42);
        assert!(validate_page(0).is_err());
        assert!(validate_page(-3).is_err());
    }

    #[test]
    fn test_validate_limit() {
        assert_eq!(validate_limit(1).unwrap(), 1);
        assert_eq!(validate_limit(100).unwrap(), 100);
        assert!(validate_limit(0).is_err());
        assert!(validate_limit(-1).is_err());
        assert!(validate_limit(101).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email(" A@x.Com ").unwrap(), "a@x.com");
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("@x.com").is_err());
        assert!(validate_email("a@nodot").is_err());
    }

    #[test]
    fn test_validate_coordinates() {
        assert!(validate_coordinates(12.97, 77.59).is_ok());
        assert!(validate_coordinates(-90.0, 180.0).is_ok());
        assert!(validate_coordinates(90.1, 0.0).is_err());
        assert!(validate_coordinates(0.0, -180.5).is_err());
    }

    #[test]
    fn test_validate_required() {
        assert_eq!(validate_required("  abc ", "Name").unwrap(), "abc");
        assert!(validate_required("   ", "Name").is_err());
    }
}
