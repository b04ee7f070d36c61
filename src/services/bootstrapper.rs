//! Schema bootstrap: plan, apply and verify a [`SchemaDefinition`].
//!
//! Everything runs sequentially in declaration order. Each collection is
//! created before its indexes. Nothing is rolled back on failure: the first
//! error is returned and whatever was already created stays.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::domain::models::{IndexSpec, SchemaDefinition, SchemaViolation};
use crate::domain::ports::{CollectionOutcome, ExistingIndex, SchemaStore, StoreError};

/// Bootstrap failures
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Invalid schema definition: {0}")]
    InvalidSchema(#[from] SchemaViolation),

    #[error("Schema targets database '{expected}' but the store is bound to '{actual}'")]
    DatabaseMismatch { expected: String, actual: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Whether a planned step still has to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionState {
    Pending,
    Satisfied,
}

/// One creation step of the bootstrap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlannedAction {
    CreateCollection {
        name: String,
        state: ActionState,
    },
    CreateIndex {
        collection: String,
        index: IndexSpec,
        state: ActionState,
    },
}

impl PlannedAction {
    pub const fn state(&self) -> ActionState {
        match self {
            Self::CreateCollection { state, .. } | Self::CreateIndex { state, .. } => *state,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state() == ActionState::Pending
    }
}

/// Ordered list of steps the bootstrap would take against the current state.
#[derive(Debug, Clone, Serialize)]
pub struct BootstrapPlan {
    pub database: String,
    pub actions: Vec<PlannedAction>,
}

impl BootstrapPlan {
    pub fn pending(&self) -> impl Iterator<Item = &PlannedAction> {
        self.actions.iter().filter(|a| a.is_pending())
    }

    pub fn is_up_to_date(&self) -> bool {
        self.pending().next().is_none()
    }
}

/// What a bootstrap run did.
#[derive(Debug, Clone, Serialize)]
pub struct BootstrapReport {
    pub run_id: Uuid,
    pub database: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub collections_created: Vec<String>,
    pub collections_existing: Vec<String>,
    /// `collection.index_name`
    pub indexes_created: Vec<String>,
    /// `collection.index_name`
    pub indexes_existing: Vec<String>,
}

impl BootstrapReport {
    pub fn changed_anything(&self) -> bool {
        !self.collections_created.is_empty() || !self.indexes_created.is_empty()
    }
}

/// An index present under the expected name but with a different definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexMismatch {
    pub collection: String,
    pub expected: IndexSpec,
    pub actual: ExistingIndex,
}

/// Live state compared with the definition.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VerificationReport {
    pub database: String,
    pub missing_collections: Vec<String>,
    /// `collection.index_name`
    pub missing_indexes: Vec<String>,
    pub mismatched_indexes: Vec<IndexMismatch>,
}

impl VerificationReport {
    pub fn is_satisfied(&self) -> bool {
        self.missing_collections.is_empty()
            && self.missing_indexes.is_empty()
            && self.mismatched_indexes.is_empty()
    }
}

/// Creates the collections and indexes of a schema definition.
pub struct SchemaBootstrapper<S: SchemaStore> {
    store: S,
    definition: SchemaDefinition,
}

impl<S: SchemaStore> SchemaBootstrapper<S> {
    /// # Errors
    /// - `InvalidSchema` if the definition does not validate
    /// - `DatabaseMismatch` if the store is bound to another database
    pub fn new(store: S, definition: SchemaDefinition) -> Result<Self, BootstrapError> {
        definition.validate()?;
        if store.database_name() != definition.database {
            return Err(BootstrapError::DatabaseMismatch {
                expected: definition.database,
                actual: store.database_name().to_string(),
            });
        }
        Ok(Self { store, definition })
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn definition(&self) -> &SchemaDefinition {
        &self.definition
    }

    /// Inspect the store and list what `apply` would do. Mutates nothing.
    #[instrument(skip(self), fields(database = %self.definition.database))]
    pub async fn plan(&self) -> Result<BootstrapPlan, BootstrapError> {
        let existing: HashSet<String> = self.store.list_collections().await?.into_iter().collect();
        let mut actions = Vec::new();

        for collection in &self.definition.collections {
            let present = existing.contains(&collection.name);
            actions.push(PlannedAction::CreateCollection {
                name: collection.name.clone(),
                state: state_of(present),
            });

            let indexes = if present {
                self.store.list_indexes(&collection.name).await?
            } else {
                Vec::new()
            };
            for index in &collection.indexes {
                let satisfied = matches!(index_presence(&indexes, index), IndexPresence::Satisfied);
                actions.push(PlannedAction::CreateIndex {
                    collection: collection.name.clone(),
                    index: index.clone(),
                    state: state_of(satisfied),
                });
            }
        }

        Ok(BootstrapPlan {
            database: self.definition.database.clone(),
            actions,
        })
    }

    /// Create every collection and index of the definition that is missing.
    ///
    /// Safe to re-run: existing collections and identical indexes are left
    /// untouched and reported as existing.
    #[instrument(skip(self), fields(database = %self.definition.database))]
    pub async fn apply(&self) -> Result<BootstrapReport, BootstrapError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(%run_id, collections = self.definition.collections.len(), "bootstrapping schema");

        let existing: HashSet<String> = self.store.list_collections().await?.into_iter().collect();
        let mut report = BootstrapReport {
            run_id,
            database: self.definition.database.clone(),
            started_at,
            finished_at: started_at,
            collections_created: Vec::new(),
            collections_existing: Vec::new(),
            indexes_created: Vec::new(),
            indexes_existing: Vec::new(),
        };

        for collection in &self.definition.collections {
            let outcome = if existing.contains(&collection.name) {
                CollectionOutcome::AlreadyExists
            } else {
                self.store.create_collection(&collection.name).await?
            };
            match outcome {
                CollectionOutcome::Created => {
                    info!(collection = %collection.name, outcome = "created", "collection ready");
                    report.collections_created.push(collection.name.clone());
                }
                CollectionOutcome::AlreadyExists => {
                    debug!(collection = %collection.name, outcome = "exists", "collection ready");
                    report.collections_existing.push(collection.name.clone());
                }
            }

            if collection.indexes.is_empty() {
                continue;
            }
            let present = self.store.list_indexes(&collection.name).await?;
            for index in &collection.indexes {
                let already = matches!(index_presence(&present, index), IndexPresence::Satisfied);
                let name = self.store.create_index(&collection.name, index).await?;
                let qualified = format!("{}.{}", collection.name, name);
                if already {
                    debug!(collection = %collection.name, index = %name, outcome = "exists", "index ready");
                    report.indexes_existing.push(qualified);
                } else {
                    info!(collection = %collection.name, index = %name, unique = index.unique, outcome = "created", "index ready");
                    report.indexes_created.push(qualified);
                }
            }
        }

        report.finished_at = Utc::now();
        info!(
            %run_id,
            collections_created = report.collections_created.len(),
            indexes_created = report.indexes_created.len(),
            "schema bootstrap complete"
        );
        Ok(report)
    }

    /// Compare the live state with the definition.
    #[instrument(skip(self), fields(database = %self.definition.database))]
    pub async fn verify(&self) -> Result<VerificationReport, BootstrapError> {
        let existing: HashSet<String> = self.store.list_collections().await?.into_iter().collect();
        let mut report = VerificationReport {
            database: self.definition.database.clone(),
            ..VerificationReport::default()
        };

        for collection in &self.definition.collections {
            if !existing.contains(&collection.name) {
                report.missing_collections.push(collection.name.clone());
                report.missing_indexes.extend(
                    collection
                        .indexes
                        .iter()
                        .map(|i| format!("{}.{}", collection.name, i.name())),
                );
                continue;
            }

            let present = self.store.list_indexes(&collection.name).await?;
            for index in &collection.indexes {
                match index_presence(&present, index) {
                    IndexPresence::Satisfied => {}
                    IndexPresence::Mismatched(actual) => {
                        report.mismatched_indexes.push(IndexMismatch {
                            collection: collection.name.clone(),
                            expected: index.clone(),
                            actual: actual.clone(),
                        });
                    }
                    IndexPresence::Missing => report
                        .missing_indexes
                        .push(format!("{}.{}", collection.name, index.name())),
                }
            }
        }

        debug!(satisfied = report.is_satisfied(), "schema verified");
        Ok(report)
    }
}

/// How a declared index relates to the indexes a collection already has.
enum IndexPresence<'a> {
    /// Present under its default name with the same keys and options.
    Satisfied,
    /// Its default name or its key pattern is taken by a different index;
    /// creating it would conflict.
    Mismatched(&'a ExistingIndex),
    Missing,
}

fn index_presence<'a>(present: &'a [ExistingIndex], index: &IndexSpec) -> IndexPresence<'a> {
    let name = index.name();
    match present.iter().find(|i| i.name == name) {
        Some(actual) if actual.satisfies(index) => IndexPresence::Satisfied,
        Some(actual) => IndexPresence::Mismatched(actual),
        None => present
            .iter()
            .find(|i| index.matches_keys(&i.keys))
            .map_or(IndexPresence::Missing, IndexPresence::Mismatched),
    }
}

const fn state_of(satisfied: bool) -> ActionState {
    if satisfied {
        ActionState::Satisfied
    } else {
        ActionState::Pending
    }
}
