//! Field-level request validation.
//!
//! Handlers collect every problem with a payload before rejecting it, so the
//! client receives the full `details` list in one response.

use serde::Serialize;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|e| e.field.as_str())
    }

    pub fn into_details(self) -> Vec<FieldError> {
        self.0
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Accumulates field errors; `finish` turns them into a single result.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.errors.push(FieldError::new(field, message));
        self
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.add(field, message);
        }
        self
    }

    pub fn required(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(!value.trim().is_empty(), field, "is required")
    }

    /// Same as `required` but only when the field is present (partial updates).
    pub fn required_if_present(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        match value {
            Some(v) => self.required(field, v),
            None => self,
        }
    }

    pub fn max_len(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
        if value.chars().count() > max {
            self.add(field, format!("must be at most {} characters", max));
        }
        self
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        if let Err(message) = validate_email_format(value) {
            self.add(field, message);
        }
        self
    }

    pub fn password(&mut self, field: &str, value: &str) -> &mut Self {
        if value.chars().count() < MIN_PASSWORD_LENGTH {
            self.add(
                field,
                format!("must be at least {} characters", MIN_PASSWORD_LENGTH),
            );
        }
        self
    }

    /// Parses a closed-set text value, recording an error listing the accepted values.
    pub fn parse_enum<T>(&mut self, field: &str, value: &str) -> Option<T>
    where
        T: FromStr + TextEnum,
    {
        match value.parse::<T>() {
            Ok(v) => Some(v),
            Err(_) => {
                self.add(field, format!("must be one of {}", T::accepted().join(", ")));
                None
            }
        }
    }

    pub fn finish(&mut self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(std::mem::take(&mut self.errors)))
        }
    }
}

/// Closed text enumerations stored as TEXT columns.
pub trait TextEnum {
    fn accepted() -> Vec<&'static str>;
}

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Basic email validation for registration and user management.
pub fn validate_email_format(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("is required".to_string());
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err("must be a valid email address".to_string());
    }
    if !parts[1].contains('.') || parts[1].starts_with('.') || parts[1].ends_with('.') {
        return Err("must be a valid email address".to_string());
    }
    if email.chars().any(char::is_whitespace) {
        return Err("must be a valid email address".to_string());
    }

    Ok(())
}

/// Trims optional text; blank strings become `None`.
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
