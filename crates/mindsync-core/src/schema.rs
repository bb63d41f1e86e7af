//! Schema mapper between domain entities and backend records
//!
//! This is the only place that knows the backend schema. It defines the
//! stable record-type names, the field names of each record type, and the
//! [`RecordMapping`] conversions for the synchronized entities.
//!
//! ## Compatibility rules
//!
//! - Record types and field names are additive-only. Never rename or reuse
//!   a constant; add a new one instead.
//! - Decoding ignores unknown fields and treats absent optional fields as
//!   empty, so older and newer clients can keep exchanging records.
//! - A missing required field or a wrongly typed value is a
//!   [`SchemaError`], which the sync engine reports as corrupted data.
//!
//! ## Wire format
//!
//! | Domain type        | Record value                                  |
//! |--------------------|-----------------------------------------------|
//! | ids                | UUID string                                   |
//! | `DateTime<Utc>`    | RFC 3339 string, full precision, `Z` suffix   |
//! | `version`          | unsigned integer                              |
//! | id sets and lists  | array of UUID strings                         |
//! | position           | two numbers, `positionX` / `positionY`        |

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::{MediaId, MindMap, MindMapId, Node, NodeId, Position, TagId};

/// Backend record-type names
pub mod record_types {
    pub const MIND_MAP: &str = "MindMap";
    pub const NODE: &str = "Node";
    pub const MEDIA: &str = "Media";
    pub const TAG: &str = "Tag";
}

/// Field names of `MindMap` records
pub mod mind_map_fields {
    pub const TITLE: &str = "title";
    pub const ROOT_NODE_ID: &str = "rootNodeID";
    pub const NODE_IDS: &str = "nodeIDs";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
    pub const VERSION: &str = "version";
    pub const DELETED_AT: &str = "deletedAt";
}

/// Field names of `Node` records
pub mod node_fields {
    pub const MIND_MAP_ID: &str = "mindMapID";
    pub const TEXT: &str = "text";
    pub const POSITION_X: &str = "positionX";
    pub const POSITION_Y: &str = "positionY";
    pub const PARENT_ID: &str = "parentID";
    pub const CHILD_IDS: &str = "childIDs";
    pub const TAG_IDS: &str = "tagIDs";
    pub const MEDIA_IDS: &str = "mediaIDs";
    pub const IS_TASK: &str = "isTask";
    pub const IS_COMPLETED: &str = "isCompleted";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
    pub const VERSION: &str = "version";
    pub const DELETED_AT: &str = "deletedAt";
}

/// Field names of `Media` records
pub mod media_fields {
    pub const NODE_ID: &str = "nodeID";
    pub const FILE_NAME: &str = "fileName";
    pub const MIME_TYPE: &str = "mimeType";
    pub const ASSET: &str = "asset";
    pub const CREATED_AT: &str = "createdAt";
}

/// Field names of `Tag` records
pub mod tag_fields {
    pub const NAME: &str = "name";
    pub const COLOR: &str = "color";
    pub const CREATED_AT: &str = "createdAt";
}

/// Errors raised while decoding a backend record
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("expected record type {expected}, got {actual}")]
    WrongRecordType { expected: String, actual: String },

    #[error("{record_type} record is missing required field '{field}'")]
    MissingField { record_type: String, field: String },

    #[error("{record_type} record has invalid field '{field}': {reason}")]
    InvalidField {
        record_type: String,
        field: String,
        reason: String,
    },

    #[error("invalid record name '{0}'")]
    InvalidRecordName(String),
}

/// A backend record: the wire form of one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub record_type: String,
    /// Unique name of the record within its type; the entity id
    pub record_name: String,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(record_type: impl Into<String>, record_name: impl Into<String>) -> Self {
        Self {
            record_type: record_type.into(),
            record_name: record_name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Sets a field, skipping `None` so absent optionals stay absent
    pub fn set(&mut self, field: &str, value: impl Into<Option<Value>>) {
        if let Some(value) = value.into() {
            self.fields.insert(field.to_string(), value);
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).filter(|v| !v.is_null())
    }
}

/// Conversion between a domain entity and its backend record
pub trait RecordMapping: Sized {
    /// Backend record type of this entity
    const RECORD_TYPE: &'static str;

    fn to_record(&self) -> Record;

    fn from_record(record: &Record) -> Result<Self, SchemaError>;
}

// ============================================================================
// Value encoding helpers
// ============================================================================

fn encode_datetime(dt: DateTime<Utc>) -> Value {
    Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

fn encode_ids<'a, I, T>(ids: I) -> Value
where
    I: IntoIterator<Item = &'a T>,
    T: ToString + 'a,
{
    Value::Array(ids.into_iter().map(|id| Value::String(id.to_string())).collect())
}

/// Typed accessors over the fields of one record
struct FieldReader<'a> {
    record: &'a Record,
}

impl<'a> FieldReader<'a> {
    fn new(record: &'a Record, expected_type: &str) -> Result<Self, SchemaError> {
        if record.record_type != expected_type {
            return Err(SchemaError::WrongRecordType {
                expected: expected_type.to_string(),
                actual: record.record_type.clone(),
            });
        }
        Ok(Self { record })
    }

    fn missing(&self, field: &str) -> SchemaError {
        SchemaError::MissingField {
            record_type: self.record.record_type.clone(),
            field: field.to_string(),
        }
    }

    fn invalid(&self, field: &str, reason: impl Into<String>) -> SchemaError {
        SchemaError::InvalidField {
            record_type: self.record.record_type.clone(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    fn name<T: FromStr>(&self) -> Result<T, SchemaError> {
        self.record
            .record_name
            .parse()
            .map_err(|_| SchemaError::InvalidRecordName(self.record.record_name.clone()))
    }

    fn optional_str(&self, field: &str) -> Result<Option<&'a str>, SchemaError> {
        match self.record.get(field) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(self.invalid(field, format!("expected string, got {other}"))),
        }
    }

    fn required_str(&self, field: &str) -> Result<&'a str, SchemaError> {
        self.optional_str(field)?.ok_or_else(|| self.missing(field))
    }

    fn required_u64(&self, field: &str) -> Result<u64, SchemaError> {
        let value = self.record.get(field).ok_or_else(|| self.missing(field))?;
        value
            .as_u64()
            .ok_or_else(|| self.invalid(field, format!("expected unsigned integer, got {value}")))
    }

    fn f64_or_zero(&self, field: &str) -> Result<f64, SchemaError> {
        match self.record.get(field) {
            None => Ok(0.0),
            Some(value) => value
                .as_f64()
                .ok_or_else(|| self.invalid(field, format!("expected number, got {value}"))),
        }
    }

    fn bool_or_false(&self, field: &str) -> Result<bool, SchemaError> {
        match self.record.get(field) {
            None => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(self.invalid(field, format!("expected bool, got {other}"))),
        }
    }

    fn optional_datetime(&self, field: &str) -> Result<Option<DateTime<Utc>>, SchemaError> {
        self.optional_str(field)?
            .map(|s| {
                DateTime::parse_from_rfc3339(s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| self.invalid(field, e.to_string()))
            })
            .transpose()
    }

    fn required_datetime(&self, field: &str) -> Result<DateTime<Utc>, SchemaError> {
        self.optional_datetime(field)?
            .ok_or_else(|| self.missing(field))
    }

    fn optional_id<T: FromStr>(&self, field: &str) -> Result<Option<T>, SchemaError> {
        self.optional_str(field)?
            .map(|s| {
                s.parse()
                    .map_err(|_| self.invalid(field, format!("invalid id '{s}'")))
            })
            .transpose()
    }

    fn required_id<T: FromStr>(&self, field: &str) -> Result<T, SchemaError> {
        self.optional_id(field)?.ok_or_else(|| self.missing(field))
    }

    fn id_list<T: FromStr>(&self, field: &str) -> Result<Vec<T>, SchemaError> {
        let items = match self.record.get(field) {
            None => return Ok(Vec::new()),
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(self.invalid(field, format!("expected array, got {other}")));
            }
        };

        items
            .iter()
            .map(|item| {
                item.as_str()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| self.invalid(field, format!("invalid id {item}")))
            })
            .collect()
    }
}

// ============================================================================
// MindMap mapping
// ============================================================================

impl RecordMapping for MindMap {
    const RECORD_TYPE: &'static str = record_types::MIND_MAP;

    fn to_record(&self) -> Record {
        use crate::domain::SyncableItem;
        use mind_map_fields as f;

        let mut record = Record::new(Self::RECORD_TYPE, self.id().to_string());
        record.set(f::TITLE, Value::String(self.title().to_string()));
        record.set(
            f::ROOT_NODE_ID,
            self.root_node_id().map(|id| Value::String(id.to_string())),
        );
        record.set(f::NODE_IDS, encode_ids(self.node_ids()));
        record.set(f::CREATED_AT, encode_datetime(self.created_at()));
        record.set(f::UPDATED_AT, encode_datetime(self.updated_at()));
        record.set(f::VERSION, Value::from(self.version()));
        record.set(f::DELETED_AT, self.deleted_at().map(encode_datetime));
        record
    }

    fn from_record(record: &Record) -> Result<Self, SchemaError> {
        use mind_map_fields as f;

        let reader = FieldReader::new(record, Self::RECORD_TYPE)?;
        let id: MindMapId = reader.name()?;

        let map = MindMap::with_id(
            id,
            reader.required_str(f::TITLE)?,
            reader.required_datetime(f::CREATED_AT)?,
        )
        .with_node_ids(reader.id_list::<NodeId>(f::NODE_IDS)?)
        .with_root_node(reader.optional_id(f::ROOT_NODE_ID)?)
        .with_deleted_at(reader.optional_datetime(f::DELETED_AT)?)
        .at_revision(
            reader.required_u64(f::VERSION)?,
            reader.required_datetime(f::UPDATED_AT)?,
        );

        Ok(map)
    }
}

// ============================================================================
// Node mapping
// ============================================================================

impl RecordMapping for Node {
    const RECORD_TYPE: &'static str = record_types::NODE;

    fn to_record(&self) -> Record {
        use crate::domain::SyncableItem;
        use node_fields as f;

        let mut record = Record::new(Self::RECORD_TYPE, self.id().to_string());
        record.set(f::MIND_MAP_ID, Value::String(self.mind_map_id().to_string()));
        record.set(f::TEXT, Value::String(self.text().to_string()));
        record.set(f::POSITION_X, Value::from(self.position().x));
        record.set(f::POSITION_Y, Value::from(self.position().y));
        record.set(
            f::PARENT_ID,
            self.parent_id().map(|id| Value::String(id.to_string())),
        );
        record.set(f::CHILD_IDS, encode_ids(self.child_ids()));
        record.set(f::TAG_IDS, encode_ids(self.tag_ids()));
        record.set(f::MEDIA_IDS, encode_ids(self.media_ids()));
        record.set(f::IS_TASK, Value::Bool(self.is_task()));
        record.set(f::IS_COMPLETED, Value::Bool(self.is_completed()));
        record.set(f::CREATED_AT, encode_datetime(self.created_at()));
        record.set(f::UPDATED_AT, encode_datetime(self.updated_at()));
        record.set(f::VERSION, Value::from(self.version()));
        record.set(f::DELETED_AT, self.deleted_at().map(encode_datetime));
        record
    }

    fn from_record(record: &Record) -> Result<Self, SchemaError> {
        use node_fields as f;

        let reader = FieldReader::new(record, Self::RECORD_TYPE)?;
        let id: NodeId = reader.name()?;

        let node = Node::with_id(
            id,
            reader.required_id(f::MIND_MAP_ID)?,
            reader.optional_str(f::TEXT)?.unwrap_or_default(),
            Position::new(
                reader.f64_or_zero(f::POSITION_X)?,
                reader.f64_or_zero(f::POSITION_Y)?,
            ),
            reader.required_datetime(f::CREATED_AT)?,
        )
        .with_parent(reader.optional_id(f::PARENT_ID)?)
        .with_children(reader.id_list::<NodeId>(f::CHILD_IDS)?)
        .with_tags(reader.id_list::<TagId>(f::TAG_IDS)?)
        .with_media(reader.id_list::<MediaId>(f::MEDIA_IDS)?)
        .with_task(
            reader.bool_or_false(f::IS_TASK)?,
            reader.bool_or_false(f::IS_COMPLETED)?,
        )
        .with_deleted_at(reader.optional_datetime(f::DELETED_AT)?)
        .at_revision(
            reader.required_u64(f::VERSION)?,
            reader.required_datetime(f::UPDATED_AT)?,
        );

        Ok(node)
    }
}
