//! Document shapes written by the evaluation pipeline services.
//!
//! The database does not enforce these shapes. They exist so tooling and
//! tests build documents whose field names line up with the declared indexes.

use mongodb::bson::oid::ObjectId;
use mongodb::bson::{self, Bson, Document};
use serde::{Deserialize, Serialize};

/// A typed document that belongs to one collection of the schema.
pub trait CollectionRecord: Serialize {
    /// Collection the record is stored in.
    const COLLECTION: &'static str;

    fn to_document(&self) -> Result<Document, bson::ser::Error> {
        bson::to_document(self)
    }
}

/// Cached tokenizer definition, keyed by content hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenizerRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub hash: String,
    #[serde(default)]
    pub tokenizer: Document,
}

impl CollectionRecord for TokenizerRecord {
    const COLLECTION: &'static str = "tokenizers";
}

/// Endpoint a task's requests are relayed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequesterArgs {
    pub address: String,
    pub service: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default = "default_path")]
    pub path: String,
}

fn default_method() -> String {
    "POST".to_string()
}

fn default_path() -> String {
    "/v1/completions".to_string()
}

impl RequesterArgs {
    pub fn new(address: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            service: service.into(),
            method: default_method(),
            path: default_path(),
        }
    }
}

/// An evaluation job registered by the requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub framework: String,
    pub tasks: String,
    pub requester_args: RequesterArgs,
    #[serde(default)]
    pub blacklist: Vec<i64>,
    pub qty: i64,
    pub total_instances: i64,
    pub request_type: String,
    #[serde(default)]
    pub done: bool,
}

impl CollectionRecord for TaskRecord {
    const COLLECTION: &'static str = "tasks";
}

/// A group of prompts within a task. Finished once all its prompts are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub task_id: ObjectId,
    #[serde(default)]
    pub done: bool,
}

impl CollectionRecord for InstanceRecord {
    const COLLECTION: &'static str = "instances";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub task_id: ObjectId,
    pub instance_id: ObjectId,
    /// Raw prompt text or a serialized completion request.
    pub data: Bson,
    #[serde(default)]
    pub timeout: i64,
    #[serde(default)]
    pub done: bool,
}

impl CollectionRecord for PromptRecord {
    const COLLECTION: &'static str = "prompts";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub task_id: ObjectId,
    pub instance_id: ObjectId,
    pub prompt_id: ObjectId,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Bson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CollectionRecord for ResponseRecord {
    const COLLECTION: &'static str = "responses";
}

/// A staked worker endpoint. At most one per `(address, service)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub address: String,
    pub service: String,
}

impl NodeRecord {
    pub fn new(address: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            id: None,
            address: address.into(),
            service: service.into(),
        }
    }
}

impl CollectionRecord for NodeRecord {
    const COLLECTION: &'static str = "nodes";
}
