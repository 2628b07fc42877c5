//! # Change Planning
//!
//! Diff between the last observed state of a person and its declared state.
//!
//! This is the caller-side half of the immutability rule: any change to a
//! `force_new` attribute turns into a [`ChangePlan::Replace`], which a host
//! executes as delete followed by create. Only plans of kind
//! [`ChangePlan::UpdateInPlace`] may be sent to [`crate::Reconciler::update`].

use crate::reconciler::ResourceState;
use crate::schema::{FIRST_NAME, LAST_NAME, PERSON_ID};
use crate::{PersonRecord, PersonSpec};

/// What a host has to do to converge a person to its declared state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangePlan {
    /// Nothing is managed yet; run create.
    Create,
    /// Observed and declared state agree.
    NoChange,
    /// Only mutable attributes differ.
    UpdateInPlace { fields: Vec<&'static str> },
    /// At least one immutable attribute differs. `fields` lists those.
    Replace { fields: Vec<&'static str> },
}

impl ChangePlan {
    /// Compute the plan for a declared person against the prior state.
    #[must_use]
    pub fn diff(prior: &ResourceState, declared: &PersonSpec) -> Self {
        let Some(current) = prior.person() else {
            return Self::Create;
        };

        let changed = changed_fields(current, declared);
        let force_new: Vec<_> = changed
            .iter()
            .filter(|a| a.force_new)
            .map(|a| a.name)
            .collect();

        if !force_new.is_empty() {
            Self::Replace { fields: force_new }
        } else if !changed.is_empty() {
            Self::UpdateInPlace {
                fields: changed.iter().map(|a| a.name).collect(),
            }
        } else {
            Self::NoChange
        }
    }

    /// Whether executing the plan destroys the current record.
    #[must_use]
    pub fn requires_replacement(&self) -> bool {
        matches!(self, Self::Replace { .. })
    }

    /// Short name for display.
    #[must_use]
    pub fn action(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::NoChange => "no-op",
            Self::UpdateInPlace { .. } => "update",
            Self::Replace { .. } => "replace",
        }
    }
}

fn changed_fields(
    current: &PersonRecord,
    declared: &PersonSpec,
) -> Vec<crate::schema::AttributeSchema> {
    let mut changed = Vec::new();
    if current.id.as_str() != declared.person_id {
        changed.push(PERSON_ID);
    }
    if current.last_name != declared.last_name {
        changed.push(LAST_NAME);
    }
    if current.first_name != declared.first_name {
        changed.push(FIRST_NAME);
    }
    changed
}
