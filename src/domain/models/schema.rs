//! Declarative schema of the testbench metadata store.
//!
//! The schema is a list of collections, each with the indexes that the
//! evaluation pipeline relies on. Field order inside an index is significant:
//! it is the order of the compound key.

use std::collections::HashSet;
use std::fmt;

use mongodb::bson::{Bson, Document};
use serde::{Deserialize, Serialize};

/// Name of the database the pipeline services connect to.
pub const DEFAULT_DATABASE: &str = "pocket-ml-testbench";

/// Sort direction of one index key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    /// Numeric form used in key documents (`1` / `-1`).
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::Ascending => 1,
            Self::Descending => -1,
        }
    }

    /// Read a key direction back from a server key document.
    ///
    /// Drivers and shells write the direction as int32, int64 or double.
    /// Special index kinds (`"text"`, `"hashed"`, ...) yield `None`.
    pub fn from_bson(value: &Bson) -> Option<Self> {
        let n = match value {
            Bson::Int32(v) => f64::from(*v),
            #[allow(clippy::cast_precision_loss)]
            Bson::Int64(v) => *v as f64,
            Bson::Double(v) => *v,
            _ => return None,
        };
        if n > 0.0 {
            Some(Self::Ascending)
        } else if n < 0.0 {
            Some(Self::Descending)
        } else {
            None
        }
    }
}

/// One key of an index: a dotted field path and its direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexField {
    pub path: String,
    pub order: SortOrder,
}

impl IndexField {
    pub fn ascending(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            order: SortOrder::Ascending,
        }
    }
}

/// An index over an ordered tuple of fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub fields: Vec<IndexField>,
    #[serde(default)]
    pub unique: bool,
}

impl IndexSpec {
    /// Compound ascending index over `paths`, in the given order.
    pub fn ascending<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: paths.into_iter().map(IndexField::ascending).collect(),
            unique: false,
        }
    }

    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Server default index name: `<path>_<order>` joined by `_`.
    pub fn name(&self) -> String {
        self.fields
            .iter()
            .map(|f| format!("{}_{}", f.path, f.order.as_i32()))
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Ordered key document, e.g. `{ task_id: 1, done: 1 }`.
    pub fn keys(&self) -> Document {
        let mut keys = Document::new();
        for field in &self.fields {
            keys.insert(field.path.clone(), field.order.as_i32());
        }
        keys
    }

    /// True if `keys` names the same fields, in the same order and
    /// direction, as this spec.
    pub fn matches_keys(&self, keys: &Document) -> bool {
        if keys.len() != self.fields.len() {
            return false;
        }
        keys.iter().zip(&self.fields).all(|((path, value), field)| {
            path == &field.path && SortOrder::from_bson(value) == Some(field.order)
        })
    }

    /// Field paths of this index, in key order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.path.as_str())
    }
}

impl fmt::Display for IndexSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.paths().collect::<Vec<_>>().join(", "))?;
        if self.unique {
            write!(f, " unique")?;
        }
        Ok(())
    }
}

/// A collection and the indexes declared on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSpec {
    pub name: String,
    #[serde(default)]
    pub indexes: Vec<IndexSpec>,
}

impl CollectionSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            indexes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_index(mut self, index: IndexSpec) -> Self {
        self.indexes.push(index);
        self
    }
}

/// Why a schema definition was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaViolation {
    #[error("database name cannot be empty")]
    EmptyDatabaseName,

    #[error("collection name cannot be empty")]
    EmptyCollectionName,

    #[error("collection '{0}' is declared more than once")]
    DuplicateCollection(String),

    #[error("index on '{0}' has no fields")]
    EmptyIndex(String),

    #[error("index on '{collection}' repeats field '{field}'")]
    RepeatedField { collection: String, field: String },
}

/// The full set of collections to create in one database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub database: String,
    pub collections: Vec<CollectionSpec>,
}

impl SchemaDefinition {
    /// The evaluation pipeline's metadata store.
    ///
    /// Declaration order is the order in which the bootstrap creates things.
    /// `results` deliberately carries no index.
    pub fn testbench() -> Self {
        Self {
            database: DEFAULT_DATABASE.to_string(),
            collections: vec![
                CollectionSpec::new("tokenizers").with_index(IndexSpec::ascending(["hash"])),
                CollectionSpec::new("tasks").with_index(IndexSpec::ascending([
                    "tasks",
                    "framework",
                    "requester_args.address",
                    "requester_args.service",
                    "done",
                ])),
                CollectionSpec::new("instances")
                    .with_index(IndexSpec::ascending(["task_id", "done"])),
                CollectionSpec::new("prompts")
                    .with_index(IndexSpec::ascending(["task_id", "instance_id", "done"])),
                CollectionSpec::new("responses").with_index(IndexSpec::ascending([
                    "task_id",
                    "instance_id",
                    "prompt_id",
                    "ok",
                ])),
                CollectionSpec::new("nodes")
                    .with_index(IndexSpec::ascending(["address", "service"]).unique()),
                CollectionSpec::new("results"),
            ],
        }
    }

    /// Same collections, different target database.
    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn collection(&self, name: &str) -> Option<&CollectionSpec> {
        self.collections.iter().find(|c| c.name == name)
    }

    pub fn index_count(&self) -> usize {
        self.collections.iter().map(|c| c.indexes.len()).sum()
    }

    pub fn validate(&self) -> Result<(), SchemaViolation> {
        if self.database.trim().is_empty() {
            return Err(SchemaViolation::EmptyDatabaseName);
        }

        let mut seen = HashSet::new();
        for collection in &self.collections {
            if collection.name.trim().is_empty() {
                return Err(SchemaViolation::EmptyCollectionName);
            }
            if !seen.insert(collection.name.as_str()) {
                return Err(SchemaViolation::DuplicateCollection(collection.name.clone()));
            }

            for index in &collection.indexes {
                if index.fields.is_empty() {
                    return Err(SchemaViolation::EmptyIndex(collection.name.clone()));
                }
                let mut fields = HashSet::new();
                for path in index.paths() {
                    if !fields.insert(path) {
                        return Err(SchemaViolation::RepeatedField {
                            collection: collection.name.clone(),
                            field: path.to_string(),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

impl Default for SchemaDefinition {
    fn default() -> Self {
        Self::testbench()
    }
}

/// Resolve a dotted path (`requester_args.address`) inside a document.
pub fn lookup_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = doc.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Bson::Document(inner) => inner.get(segment)?,
            _ => return None,
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn test_testbench_schema_declares_seven_collections_in_order() {
        let schema = SchemaDefinition::testbench();
        let names: Vec<&str> = schema.collections.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["tokenizers", "tasks", "instances", "prompts", "responses", "nodes", "results"]
        );
        assert_eq!(schema.database, "pocket-ml-testbench");
        assert_eq!(schema.index_count(), 6);
        schema.validate().expect("built-in schema should be valid");
    }

    #[test]
    fn test_tasks_index_field_order() {
        let schema = SchemaDefinition::testbench();
        let tasks = schema.collection("tasks").expect("tasks collection");
        let paths: Vec<&str> = tasks.indexes[0].paths().collect();
        assert_eq!(
            paths,
            vec![
                "tasks",
                "framework",
                "requester_args.address",
                "requester_args.service",
                "done"
            ]
        );
    }

    #[test]
    fn test_only_nodes_index_is_unique() {
        let schema = SchemaDefinition::testbench();
        for collection in &schema.collections {
            for index in &collection.indexes {
                assert_eq!(index.unique, collection.name == "nodes", "{}", collection.name);
            }
        }
        assert!(schema.collection("results").unwrap().indexes.is_empty());
    }

    #[test]
    fn test_index_name_matches_server_default() {
        let index = IndexSpec::ascending(["task_id", "instance_id", "prompt_id", "ok"]);
        assert_eq!(index.name(), "task_id_1_instance_id_1_prompt_id_1_ok_1");

        let index = IndexSpec::ascending(["requester_args.address"]);
        assert_eq!(index.name(), "requester_args.address_1");
    }

    #[test]
    fn test_keys_document_preserves_order() {
        let index = IndexSpec::ascending(["address", "service"]);
        let keys_doc = index.keys();
        let keys: Vec<&String> = keys_doc.keys().collect();
        assert_eq!(keys, vec!["address", "service"]);
    }

    #[test]
    fn test_matches_keys_accepts_any_numeric_direction() {
        let index = IndexSpec::ascending(["task_id", "done"]);
        assert!(index.matches_keys(&doc! { "task_id": 1, "done": 1 }));
        assert!(index.matches_keys(&doc! { "task_id": 1_i64, "done": 1.0 }));
        assert!(!index.matches_keys(&doc! { "done": 1, "task_id": 1 }));
        assert!(!index.matches_keys(&doc! { "task_id": 1, "done": -1 }));
        assert!(!index.matches_keys(&doc! { "task_id": "hashed" }));
    }

    #[test]
    fn test_validate_rejects_duplicate_collection() {
        let schema = SchemaDefinition {
            database: "db".to_string(),
            collections: vec![CollectionSpec::new("nodes"), CollectionSpec::new("nodes")],
        };
        assert_eq!(
            schema.validate(),
            Err(SchemaViolation::DuplicateCollection("nodes".to_string()))
        );
    }

    #[test]
    fn test_validate_rejects_repeated_field() {
        let schema = SchemaDefinition {
            database: "db".to_string(),
            collections: vec![CollectionSpec::new("prompts")
                .with_index(IndexSpec::ascending(["task_id", "task_id"]))],
        };
        assert!(matches!(
            schema.validate(),
            Err(SchemaViolation::RepeatedField { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_empty_database_and_index() {
        let schema = SchemaDefinition::testbench().with_database("  ");
        assert_eq!(schema.validate(), Err(SchemaViolation::EmptyDatabaseName));

        let schema = SchemaDefinition {
            database: "db".to_string(),
            collections: vec![CollectionSpec::new("tasks").with_index(IndexSpec::ascending(
                Vec::<String>::new(),
            ))],
        };
        assert_eq!(
            schema.validate(),
            Err(SchemaViolation::EmptyIndex("tasks".to_string()))
        );
    }

    #[test]
    fn test_lookup_path_walks_nested_documents() {
        let document = doc! {
            "requester_args": { "address": "pokt1abc", "service": "0001" },
            "done": false,
        };
        assert_eq!(
            lookup_path(&document, "requester_args.address"),
            Some(&Bson::String("pokt1abc".to_string()))
        );
        assert_eq!(lookup_path(&document, "done"), Some(&Bson::Boolean(false)));
        assert_eq!(lookup_path(&document, "requester_args.method"), None);
        assert_eq!(lookup_path(&document, "done.nested"), None);
    }
}
