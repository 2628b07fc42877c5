//! # Person Schema
//!
//! Attribute declarations for the person resource and the validation that
//! runs before any store call.
//!
//! | attribute    | required | immutable | constraint                       |
//! |--------------|----------|-----------|----------------------------------|
//! | `person_id`  | yes      | yes       | non-empty, no `/`, ≤ 256 bytes   |
//! | `last_name`  | yes      | yes       | 1–30 characters                  |
//! | `first_name` | no       | no        | non-empty when set               |

use crate::primitives::{
    IDENTIFIER_SEPARATOR, LAST_NAME_MAX_LENGTH, LAST_NAME_MIN_LENGTH, PERSON_ID_MAX_LENGTH,
};
use crate::{PersonError, PersonId, PersonRecord, PersonSpec};

/// Declaration of a single person attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSchema {
    pub name: &'static str,
    pub required: bool,
    /// A change to this attribute forces delete-and-recreate.
    pub force_new: bool,
}

pub const PERSON_ID: AttributeSchema = AttributeSchema {
    name: "person_id",
    required: true,
    force_new: true,
};

pub const LAST_NAME: AttributeSchema = AttributeSchema {
    name: "last_name",
    required: true,
    force_new: true,
};

pub const FIRST_NAME: AttributeSchema = AttributeSchema {
    name: "first_name",
    required: false,
    force_new: false,
};

/// All attributes of the person resource, in declaration order.
pub const PERSON_ATTRIBUTES: [AttributeSchema; 3] = [PERSON_ID, LAST_NAME, FIRST_NAME];

/// Validate a declared person and turn it into a storable record.
///
/// # Errors
///
/// Returns `PersonError::ValidationFailed` naming the first offending
/// attribute.
pub fn validate(declared: &PersonSpec) -> Result<PersonRecord, PersonError> {
    for attribute in PERSON_ATTRIBUTES.iter().filter(|a| a.required) {
        if declared_value(declared, attribute).is_none_or(str::is_empty) {
            return Err(invalid(*attribute, "is required"));
        }
    }

    let id = validate_person_id(&declared.person_id)?;

    let last_len = declared.last_name.chars().count();
    if !(LAST_NAME_MIN_LENGTH..=LAST_NAME_MAX_LENGTH).contains(&last_len) {
        return Err(invalid(
            LAST_NAME,
            format!(
                "expected length between {} and {}, got {}",
                LAST_NAME_MIN_LENGTH, LAST_NAME_MAX_LENGTH, last_len
            ),
        ));
    }

    if let Some(first) = &declared.first_name
        && first.is_empty()
    {
        return Err(invalid(FIRST_NAME, "must not be empty when set"));
    }

    Ok(PersonRecord::new(
        id,
        declared.last_name.clone(),
        declared.first_name.clone(),
    ))
}

fn declared_value<'a>(declared: &'a PersonSpec, attribute: &AttributeSchema) -> Option<&'a str> {
    match attribute.name {
        "person_id" => Some(declared.person_id.as_str()),
        "last_name" => Some(declared.last_name.as_str()),
        "first_name" => declared.first_name.as_deref(),
        _ => None,
    }
}

/// Validate a bare person id (used by delete and lookup).
pub fn validate_person_id(raw: &str) -> Result<PersonId, PersonError> {
    if raw.is_empty() {
        return Err(invalid(PERSON_ID, "must not be empty"));
    }
    if raw.len() > PERSON_ID_MAX_LENGTH {
        return Err(invalid(
            PERSON_ID,
            format!("longer than {} bytes", PERSON_ID_MAX_LENGTH),
        ));
    }
    if raw.contains(IDENTIFIER_SEPARATOR) {
        return Err(invalid(
            PERSON_ID,
            format!("must not contain '{}'", IDENTIFIER_SEPARATOR),
        ));
    }
    Ok(PersonId::new(raw))
}

fn invalid(attribute: AttributeSchema, reason: impl Into<String>) -> PersonError {
    PersonError::ValidationFailed {
        field: attribute.name,
        reason: reason.into(),
    }
}
