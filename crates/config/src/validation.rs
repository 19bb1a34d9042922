//! Validation helpers for configuration values
//!
//! Each config section implements [`ConfigSection`] and builds its checks
//! from the small set of [`Validator`] helpers below.

pub use crate::error::ValidationError;

/// A config section that can validate and merge itself
pub trait ConfigSection: Default {
    /// Returns every problem found in the section
    fn validate(&self) -> Result<(), Vec<ValidationError>>;

    /// Merges another section into this one; values from `other` win
    fn merge(&mut self, other: Self);

    /// Section name used in error reporting
    fn section_name(&self) -> &'static str;
}

/// Common validators for config values
pub struct Validator;

impl Validator {
    /// Validates that a numeric value is within a range
    pub fn in_range<T>(value: T, min: T, max: T, field: &str) -> Result<(), ValidationError>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if value < min || value > max {
            Err(ValidationError::with_value(
                field,
                format!("must be between {} and {}", min, max),
                value,
            ))
        } else {
            Ok(())
        }
    }

    /// Validates that a string is not empty
    pub fn not_empty(value: &str, field: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            Err(ValidationError::new(field, "must not be empty"))
        } else {
            Ok(())
        }
    }

    /// Validates a menu of minutes: starts with 0 (off) and strictly ascends
    pub fn menu_starting_at_zero(options: &[u32], field: &str) -> Result<(), ValidationError> {
        let listed = || {
            options
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };

        if options.first() != Some(&0) {
            return Err(ValidationError::with_value(
                field,
                "must start with 0 (off)",
                listed(),
            ));
        }

        if options.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(ValidationError::with_value(
                field,
                "must be in ascending order",
                listed(),
            ));
        }

        Ok(())
    }

    /// Collects multiple validation results into a single result
    pub fn collect_errors(
        results: Vec<Result<(), ValidationError>>,
    ) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<ValidationError> = results.into_iter().filter_map(|r| r.err()).collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
