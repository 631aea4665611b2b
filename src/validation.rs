use crate::error::AppError;

pub const MAX_FIELD_LEN: usize = 255;

/// Trim the address and lowercase its domain part. The local part keeps its case.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Loose structural check: `local@domain.tld`, no whitespace, single `@`.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) || email.matches('@').count() != 1 {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

/// Normalize and validate an email, returning the normalized form.
pub fn validate_email(email: &str) -> Result<String, AppError> {
    let email = normalize_email(email);
    if email.is_empty() {
        return Err(AppError::BadRequest("email is required".into()));
    }
    if email.chars().count() > MAX_FIELD_LEN {
        return Err(AppError::BadRequest(format!(
            "email must be at most {MAX_FIELD_LEN} characters"
        )));
    }
    if !is_valid_email(&email) {
        return Err(AppError::BadRequest("enter a valid email address".into()));
    }
    Ok(email)
}

pub fn validate_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }
    if name.chars().count() > MAX_FIELD_LEN {
        return Err(AppError::BadRequest(format!(
            "name must be at most {MAX_FIELD_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

pub fn validate_password(password: &str, min_len: usize) -> Result<(), AppError> {
    if password.trim().is_empty() {
        return Err(AppError::BadRequest("password may not be blank".into()));
    }
    if password.chars().count() < min_len {
        return Err(AppError::BadRequest(format!(
            "password must be at least {min_len} characters"
        )));
    }
    Ok(())
}
