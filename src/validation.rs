use crate::errors::{DomainError, DomainResult, ValidationError};
use regex::Regex;
use std::sync::OnceLock;

/// A trait that entities should implement for validation.
pub trait Validate {
    /// Validates the entity and returns an error if validation fails.
    fn validate(&self) -> DomainResult<()>;
}

// Common regex patterns
fn phone_regex() -> &'static Regex {
    static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
    PHONE_REGEX.get_or_init(|| Regex::new(r"^\+?[0-9]{8,15}$").unwrap())
}

fn pincode_regex() -> &'static Regex {
    static PINCODE_REGEX: OnceLock<Regex> = OnceLock::new();
    PINCODE_REGEX.get_or_init(|| Regex::new(r"^[1-9][0-9]{5}$").unwrap())
}

/// Struct for configuring validations in a fluent style
#[derive(Default)]
pub struct ValidationBuilder<T> {
    field_name: String,
    value: Option<T>,
    errors: Vec<ValidationError>,
}

/// Generic validation implementations
impl<T> ValidationBuilder<T> {
    pub fn new(field_name: &str, value: Option<T>) -> Self {
        Self {
            field_name: field_name.to_string(),
            value,
            errors: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self
    where
        T: Default + PartialEq,
    {
        if self.value.is_none() || self.value == Some(T::default()) {
            self.errors.push(ValidationError::required(&self.field_name));
        }
        self
    }

    pub fn validate_with<F>(mut self, validator: F) -> Self
    where
        F: FnOnce(&T) -> Result<(), ValidationError>,
    {
        if let Some(value) = &self.value {
            if let Err(err) = validator(value) {
                self.errors.push(err);
            }
        }
        self
    }

    /// Complete validation and return result
    pub fn validate(self) -> DomainResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            // Return the first error for simplicity
            Err(DomainError::Validation(self.errors[0].clone()))
        }
    }
}

/// String-specific validations
impl ValidationBuilder<String> {
    pub fn min_length(mut self, min: usize) -> Self {
        if let Some(value) = &self.value {
            if value.len() < min {
                self.errors
                    .push(ValidationError::min_length(&self.field_name, min));
            }
        }
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        if let Some(value) = &self.value {
            if value.len() > max {
                self.errors
                    .push(ValidationError::max_length(&self.field_name, max));
            }
        }
        self
    }

    pub fn matches_pattern(mut self, pattern: &Regex, message: &str) -> Self {
        if let Some(value) = &self.value {
            if !pattern.is_match(value) {
                self.errors
                    .push(ValidationError::format(&self.field_name, message));
            }
        }
        self
    }

    pub fn phone(self) -> Self {
        self.matches_pattern(phone_regex(), "must be a valid phone number")
    }

    pub fn pincode(self) -> Self {
        self.matches_pattern(pincode_regex(), "must be a 6-digit pincode not starting with 0")
    }

    pub fn one_of(mut self, allowed_values: &[&str], message: Option<&str>) -> Self {
        if let Some(value) = &self.value {
            if !allowed_values.contains(&value.as_str()) {
                let reason = message.unwrap_or("must be one of the allowed values");
                self.errors
                    .push(ValidationError::invalid_value(&self.field_name, reason));
            }
        }
        self
    }
}

/// Numeric validations
impl<T> ValidationBuilder<T>
where
    T: PartialOrd + Clone + std::fmt::Display,
{
    pub fn min(mut self, min: T) -> Self {
        if let Some(value) = &self.value {
            if value < &min {
                self.errors.push(ValidationError::range(
                    &self.field_name,
                    min.to_string(),
                    "maximum".to_string(),
                ));
            }
        }
        self
    }

    pub fn max(mut self, max: T) -> Self {
        if let Some(value) = &self.value {
            if value > &max {
                self.errors.push(ValidationError::range(
                    &self.field_name,
                    "minimum".to_string(),
                    max.to_string(),
                ));
            }
        }
        self
    }

    pub fn range(mut self, min: T, max: T) -> Self {
        if let Some(value) = &self.value {
            if value < &min || value > &max {
                self.errors.push(ValidationError::range(
                    &self.field_name,
                    min.to_string(),
                    max.to_string(),
                ));
            }
        }
        self
    }
}

// Common validation utility module for frequently validated entities
pub mod common {
    use super::*;
    use crate::domains::complaint::types::{Category, ComplaintStatus};
    use crate::domains::staff::types::{StaffRole, StaffStatus};

    pub fn validate_category(category: &str) -> DomainResult<()> {
        if Category::from_str(category).is_some() {
            Ok(())
        } else {
            Err(DomainError::Validation(ValidationError::invalid_value(
                "category",
                "must be a known complaint category",
            )))
        }
    }

    pub fn validate_complaint_status(status: &str) -> DomainResult<()> {
        if ComplaintStatus::from_str(status).is_some() {
            Ok(())
        } else {
            Err(DomainError::Validation(ValidationError::invalid_value(
                "complaint_status",
                "must be a known complaint status",
            )))
        }
    }

    pub fn validate_staff_role(role: &str) -> DomainResult<()> {
        if StaffRole::from_str(role).is_some() {
            Ok(())
        } else {
            Err(DomainError::Validation(ValidationError::invalid_value(
                "role",
                "must be a known staff role",
            )))
        }
    }

    pub fn validate_staff_status(status: &str) -> DomainResult<()> {
        if StaffStatus::from_str(status).is_some() {
            Ok(())
        } else {
            Err(DomainError::Validation(ValidationError::invalid_value(
                "status",
                "must be a known staff status",
            )))
        }
    }

    pub fn validate_rating(rating: f64) -> DomainResult<()> {
        ValidationBuilder::new("performance_rating", Some(rating))
            .range(0.0, 5.0)
            .validate()
    }

    pub fn validate_priority_score(score: f64) -> DomainResult<()> {
        ValidationBuilder::new("priority_score", Some(score))
            .range(0.0, 10.0)
            .validate()
    }
}
