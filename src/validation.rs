use crate::errors::{ValidationError, DomainResult, DomainError};

/// A trait that payloads should implement for validation.
pub trait Validate {
    /// Validates the payload and returns an error if validation fails.
    fn validate(&self) -> DomainResult<()>;
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
    where T: Default + PartialEq {
        if self.value.is_none() || self.value == Some(T::default()) {
            self.errors.push(ValidationError::required(&self.field_name));
        }
        self
    }

    /// Complete validation and return result
    pub fn validate(self) -> DomainResult<()> {
        match self.errors.into_iter().next() {
            None => Ok(()),
            // First error only; the dialog shows one message at a time
            Some(first) => Err(DomainError::Validation(first)),
        }
    }
}

/// String-specific validations
impl ValidationBuilder<String> {
    /// Rejects strings made only of whitespace. Pair with `required` for absence.
    pub fn not_blank(mut self) -> Self {
        if let Some(value) = &self.value {
            if value.trim().is_empty() && !self.has_required_error() {
                self.errors.push(ValidationError::required(&self.field_name));
            }
        }
        self
    }

    fn has_required_error(&self) -> bool {
        self.errors.iter().any(|e| matches!(e, ValidationError::Required { .. }))
    }
}

/// Numeric validations
impl<T> ValidationBuilder<T>
where T: PartialOrd + Clone + std::fmt::Display
{
    /// Lower bound only; there is no upper bound to report.
    pub fn min(mut self, min: T) -> Self {
        if let Some(value) = &self.value {
            if value < &min {
                self.errors.push(ValidationError::min(&self.field_name, min));
            }
        }
        self
    }
}
