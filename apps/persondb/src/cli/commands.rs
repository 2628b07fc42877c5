//! # CLI Command Implementations
//!
//! Each command runs one reconciler operation and returns an [`Outcome`];
//! printing is left to [`render`].

use crate::config::ProviderConfig;
use persondb_core::{
    ChangePlan, ExternalId, PersonError, PersonId, PersonRecord, PersonSpec, Reconciler,
    ResourceState,
};
use serde::Serialize;
use std::fmt::Write as _;

// =============================================================================
// OUTPUT TYPES
// =============================================================================

/// State of a managed person as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateView {
    /// `/person/<id>`, or `None` once the record is gone.
    pub id: Option<String>,
    pub person_id: Option<String>,
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub exists: bool,
}

impl From<&ResourceState> for StateView {
    fn from(state: &ResourceState) -> Self {
        let person = state.person();
        Self {
            id: state.identifier().map(ToString::to_string),
            person_id: person.map(|p| p.id.to_string()),
            last_name: person.map(|p| p.last_name.clone()),
            first_name: person.and_then(|p| p.first_name.clone()),
            exists: state.is_present(),
        }
    }
}

/// One row of `list` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonRow {
    pub id: String,
    pub person_id: String,
    pub last_name: String,
    pub first_name: Option<String>,
}

impl From<&PersonRecord> for PersonRow {
    fn from(record: &PersonRecord) -> Self {
        Self {
            id: ExternalId::for_person(record.id.clone()).to_string(),
            person_id: record.id.to_string(),
            last_name: record.last_name.clone(),
            first_name: record.first_name.clone(),
        }
    }
}

/// Result of a single command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Initialized {
        database_filename: String,
        backend: String,
    },
    State(StateView),
    Plan {
        action: &'static str,
        fields: Vec<&'static str>,
    },
    List {
        persons: Vec<PersonRow>,
    },
}

// =============================================================================
// COMMANDS
// =============================================================================

/// Report the store that `connect` just opened (and created if missing).
#[must_use]
pub fn cmd_init(config: &ProviderConfig) -> Outcome {
    tracing::info!(backend = %config.backend, "store initialized");
    Outcome::Initialized {
        database_filename: config.database_filename.display().to_string(),
        backend: config.backend.to_string(),
    }
}

pub fn cmd_create(reconciler: &Reconciler, declared: &PersonSpec) -> Result<Outcome, PersonError> {
    let state = reconciler.create(declared)?;
    Ok(Outcome::State(StateView::from(&state)))
}

pub fn cmd_read(reconciler: &Reconciler, identifier: &str) -> Result<Outcome, PersonError> {
    let state = reconciler.read(identifier)?;
    Ok(Outcome::State(StateView::from(&state)))
}

pub fn cmd_update(
    reconciler: &Reconciler,
    identifier: &str,
    declared: &PersonSpec,
) -> Result<Outcome, PersonError> {
    let identifier = ExternalId::parse(identifier)?;
    let state = reconciler.update(&identifier, declared)?;
    Ok(Outcome::State(StateView::from(&state)))
}

pub fn cmd_delete(reconciler: &Reconciler, person_id: &str) -> Result<Outcome, PersonError> {
    let state = reconciler.delete(&PersonId::new(person_id))?;
    Ok(Outcome::State(StateView::from(&state)))
}

/// Import followed by the mandatory first read.
pub fn cmd_import(reconciler: &Reconciler, identifier: &str) -> Result<Outcome, PersonError> {
    let imported = reconciler.import(identifier);
    let state = reconciler.read(imported.identifier())?;
    if !state.is_present() {
        return Err(PersonError::NotFound(
            ExternalId::parse(imported.identifier())?.into_person_id(),
        ));
    }
    Ok(Outcome::State(StateView::from(&state)))
}

pub fn cmd_lookup(reconciler: &Reconciler, person_id: &str) -> Result<Outcome, PersonError> {
    let state = reconciler.lookup(person_id)?;
    Ok(Outcome::State(StateView::from(&state)))
}

/// Plan against the current store contents. Without an identifier the person
/// is treated as unmanaged.
pub fn cmd_plan(
    reconciler: &Reconciler,
    identifier: Option<&str>,
    declared: &PersonSpec,
) -> Result<Outcome, PersonError> {
    let prior = match identifier {
        Some(identifier) => reconciler.read(identifier)?,
        None => ResourceState::Absent,
    };
    let plan = reconciler.plan(&prior, declared);
    let fields = match &plan {
        ChangePlan::UpdateInPlace { fields } | ChangePlan::Replace { fields } => fields.clone(),
        ChangePlan::Create | ChangePlan::NoChange => Vec::new(),
    };
    Ok(Outcome::Plan {
        action: plan.action(),
        fields,
    })
}

pub fn cmd_list(reconciler: &Reconciler) -> Result<Outcome, PersonError> {
    let persons = reconciler.list()?.iter().map(PersonRow::from).collect();
    Ok(Outcome::List { persons })
}

// =============================================================================
// RENDERING
// =============================================================================

/// Format an outcome for stdout.
pub fn render(outcome: &Outcome, json_mode: bool) -> Result<String, serde_json::Error> {
    if json_mode {
        let mut json = serde_json::to_string_pretty(outcome)?;
        json.push('\n');
        return Ok(json);
    }

    let mut out = String::new();
    match outcome {
        Outcome::Initialized {
            database_filename,
            backend,
        } => {
            let _ = writeln!(out, "Initialized {backend} store at {database_filename}");
        }
        Outcome::State(view) => match &view.id {
            Some(id) => {
                let _ = writeln!(out, "id:         {id}");
                let _ = writeln!(
                    out,
                    "last_name:  {}",
                    view.last_name.as_deref().unwrap_or_default()
                );
                let _ = writeln!(
                    out,
                    "first_name: {}",
                    view.first_name.as_deref().unwrap_or("(null)")
                );
            }
            None => {
                let _ = writeln!(out, "Person does not exist");
            }
        },
        Outcome::Plan { action, fields } => {
            if fields.is_empty() {
                let _ = writeln!(out, "Plan: {action}");
            } else {
                let _ = writeln!(out, "Plan: {action} ({})", fields.join(", "));
            }
        }
        Outcome::List { persons } => {
            if persons.is_empty() {
                let _ = writeln!(out, "No persons stored");
            }
            for row in persons {
                let _ = writeln!(
                    out,
                    "{}\t{}\t{}",
                    row.id,
                    row.last_name,
                    row.first_name.as_deref().unwrap_or("")
                );
            }
        }
    }
    Ok(out)
}
