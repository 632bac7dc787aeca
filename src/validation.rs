//! Input integrity checks run before generation.
//!
//! The generator assumes well-formed records; anything that reaches it
//! through the HTTP layer passes through [`validate_input`] first.
//! Detects:
//! - Required text fields left empty
//! - Duplicate teacher IDs
//! - Subject requirements with no batches

use crate::data::TimetableInput;
use std::collections::HashSet;
use std::fmt;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// A required field is empty.
    MissingField,
    /// Two teachers share the same ID.
    DuplicateId,
    /// A requirement names no batch to schedule.
    NoBatches,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    fn missing(record: &str, index: usize, field: &str) -> Self {
        Self::new(
            ValidationErrorKind::MissingField,
            format!("{} #{} is missing {}", record, index + 1, field),
        )
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Validates the input records of a generation run.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with every detected issue.
pub fn validate_input(input: &TimetableInput) -> ValidationResult {
    let mut errors = Vec::new();

    let mut teacher_ids = HashSet::new();
    for (i, teacher) in input.teachers.iter().enumerate() {
        if teacher.name.trim().is_empty() {
            errors.push(ValidationError::missing("teacher", i, "name"));
        }
        if !teacher_ids.insert(teacher.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate teacher ID: {}", teacher.id),
            ));
        }
    }

    for (i, slot) in input.fixed_slots.iter().enumerate() {
        let fields = [
            ("department", &slot.department),
            ("subject", &slot.subject),
            ("faculty", &slot.teacher),
            ("day", &slot.day),
            ("time", &slot.time),
            ("room", &slot.room),
            ("batch", &slot.batch),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                errors.push(ValidationError::missing("fixed slot", i, field));
            }
        }
    }

    for (i, req) in input.subject_requirements.iter().enumerate() {
        if req.subject.trim().is_empty() {
            errors.push(ValidationError::missing("subject requirement", i, "subject"));
        }
        if req.department.trim().is_empty() {
            errors.push(ValidationError::missing("subject requirement", i, "department"));
        }
        if req.batches.iter().all(|b| b.trim().is_empty()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::NoBatches,
                format!("Subject requirement {} has no batches", req.subject),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
