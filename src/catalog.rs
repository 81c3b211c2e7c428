//! Versioned schemas for the consumer offsets topic.
//!
//! Three independent version tables:
//!
//! | Table | Versions | Layout |
//! |-------|----------|--------|
//! | message key | 0, 1 | offset key `{group, topic, partition}` |
//! | message key | 2 | group key `{group}` |
//! | offset value | 0..=3 | see [`OffsetValueSchema`] |
//! | group value | 0..=3 | group header + `members`, each member in the matching member layout |
//!
//! The catalog is built once at startup and shared read-only (usually
//! behind an `Arc`) by every decoder.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::DecoderConfig;
use crate::constants::*;
use crate::consumer_protocol::ConsumerProtocol;
use crate::error::{Error, Result};
use crate::schema::{BoundField, Field, Schema, WireType};

/// Offset commit key layout with its resolved fields.
#[derive(Debug, Clone)]
pub struct OffsetKeySchema {
    pub schema: Arc<Schema>,
    pub group: BoundField,
    pub topic: BoundField,
    pub partition: BoundField,
}

/// Group metadata key layout with its resolved field.
#[derive(Debug, Clone)]
pub struct GroupKeySchema {
    pub schema: Arc<Schema>,
    pub group: BoundField,
}

/// One offset value version with its resolved fields.
///
/// Fields a version does not carry are `None`. Version 0 names its commit
/// time `timestamp`; `commit_timestamp` is bound to it.
///
/// | Version | Fields |
/// |---------|--------|
/// | 0 | offset, metadata, timestamp |
/// | 1 | offset, metadata, commit_timestamp, expire_timestamp |
/// | 2 | offset, metadata, commit_timestamp |
/// | 3 | offset, leader_epoch, metadata, commit_timestamp |
#[derive(Debug, Clone)]
pub struct OffsetValueSchema {
    pub version: i16,
    pub schema: Arc<Schema>,
    pub offset: BoundField,
    pub leader_epoch: Option<BoundField>,
    pub metadata: BoundField,
    pub commit_timestamp: BoundField,
    pub expire_timestamp: Option<BoundField>,
}

/// One group value version and the member layout it embeds.
#[derive(Debug, Clone)]
pub struct GroupValueSchema {
    pub version: i16,
    pub schema: Arc<Schema>,
    pub member: Arc<Schema>,
}

/// Every schema the offsets decoder needs, keyed by version.
#[derive(Debug, Clone)]
pub struct SchemaCatalog {
    config: DecoderConfig,
    offset_key: OffsetKeySchema,
    group_key: GroupKeySchema,
    message_keys: BTreeMap<i16, Arc<Schema>>,
    offset_values: BTreeMap<i16, OffsetValueSchema>,
    group_values: BTreeMap<i16, GroupValueSchema>,
    members: BTreeMap<i16, Arc<Schema>>,
    consumer_protocol: ConsumerProtocol,
}

impl SchemaCatalog {
    pub fn new() -> Result<Self> {
        Self::with_config(DecoderConfig::default())
    }

    pub fn with_config(config: DecoderConfig) -> Result<Self> {
        let max = config.max_array_len;

        let (offset_key, group_key) = build_key_schemas()?;
        let mut message_keys = BTreeMap::new();
        message_keys.insert(0, Arc::clone(&offset_key.schema));
        message_keys.insert(CURRENT_OFFSET_KEY_SCHEMA_VERSION, Arc::clone(&offset_key.schema));
        message_keys.insert(CURRENT_GROUP_KEY_SCHEMA_VERSION, Arc::clone(&group_key.schema));

        let mut offset_values = BTreeMap::new();
        for version in 0..=CURRENT_OFFSET_VALUE_SCHEMA_VERSION {
            offset_values.insert(version, build_offset_value_schema(version)?);
        }

        let members = build_member_schemas()?;
        let mut group_values = BTreeMap::new();
        for version in 0..=CURRENT_GROUP_VALUE_SCHEMA_VERSION {
            let member = members.get(&version).ok_or(Error::UnknownVersion {
                what: "member metadata",
                version,
            })?;
            let schema = build_group_value_schema(version, member, max)?;
            group_values.insert(
                version,
                GroupValueSchema {
                    version,
                    schema,
                    member: Arc::clone(member),
                },
            );
        }

        let consumer_protocol = ConsumerProtocol::with_config(&config)?;

        Ok(Self {
            config,
            offset_key,
            group_key,
            message_keys,
            offset_values,
            group_values,
            members,
            consumer_protocol,
        })
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn offset_key(&self) -> &OffsetKeySchema {
        &self.offset_key
    }

    pub fn group_key(&self) -> &GroupKeySchema {
        &self.group_key
    }

    pub fn consumer_protocol(&self) -> &ConsumerProtocol {
        &self.consumer_protocol
    }

    pub fn key_schema(&self, version: i16) -> Result<&Arc<Schema>> {
        self.message_keys
            .get(&version)
            .ok_or(Error::UnknownVersion {
                what: "message key",
                version,
            })
    }

    pub fn offset_value_schema(&self, version: i16) -> Result<&OffsetValueSchema> {
        self.offset_values
            .get(&version)
            .ok_or(Error::UnknownVersion {
                what: "offset value",
                version,
            })
    }

    pub fn group_value_schema(&self, version: i16) -> Result<&GroupValueSchema> {
        self.group_values
            .get(&version)
            .ok_or(Error::UnknownVersion {
                what: "group value",
                version,
            })
    }

    pub fn member_schema(&self, version: i16) -> Result<&Arc<Schema>> {
        self.members.get(&version).ok_or(Error::UnknownVersion {
            what: "member metadata",
            version,
        })
    }

    /// Known message key versions, ascending.
    pub fn key_versions(&self) -> impl Iterator<Item = i16> + '_ {
        self.message_keys.keys().copied()
    }

    pub fn offset_value_versions(&self) -> impl Iterator<Item = i16> + '_ {
        self.offset_values.keys().copied()
    }

    pub fn group_value_versions(&self) -> impl Iterator<Item = i16> + '_ {
        self.group_values.keys().copied()
    }
}

fn build_key_schemas() -> Result<(OffsetKeySchema, GroupKeySchema)> {
    let schema = Schema::new([
        Field::new(GROUP_KEY, WireType::String),
        Field::new(TOPIC_KEY, WireType::String),
        Field::new(PARTITION_KEY, WireType::Int32),
    ])?;
    let offset_key = OffsetKeySchema {
        group: schema.get(GROUP_KEY)?.clone(),
        topic: schema.get(TOPIC_KEY)?.clone(),
        partition: schema.get(PARTITION_KEY)?.clone(),
        schema,
    };

    let schema = Schema::new([Field::new(GROUP_KEY, WireType::String)])?;
    let group_key = GroupKeySchema {
        group: schema.get(GROUP_KEY)?.clone(),
        schema,
    };

    Ok((offset_key, group_key))
}

fn build_offset_value_schema(version: i16) -> Result<OffsetValueSchema> {
    let offset = Field::new(OFFSET_KEY, WireType::Int64);
    let metadata = Field::new(METADATA_KEY, WireType::String)
        .with_doc("Associated metadata.")
        .with_default("")?;
    let commit_timestamp = Field::new(COMMIT_TIMESTAMP_KEY, WireType::Int64);

    let (fields, commit_name) = match version {
        0 => (
            vec![offset, metadata, Field::new(TIMESTAMP_KEY, WireType::Int64)],
            TIMESTAMP_KEY,
        ),
        1 => (
            vec![
                offset,
                metadata,
                commit_timestamp,
                Field::new(EXPIRE_TIMESTAMP_KEY, WireType::Int64),
            ],
            COMMIT_TIMESTAMP_KEY,
        ),
        2 => (vec![offset, metadata, commit_timestamp], COMMIT_TIMESTAMP_KEY),
        3 => (
            vec![
                offset,
                Field::new(LEADER_EPOCH_KEY, WireType::Int32),
                metadata,
                commit_timestamp,
            ],
            COMMIT_TIMESTAMP_KEY,
        ),
        _ => {
            return Err(Error::UnknownVersion {
                what: "offset value",
                version,
            });
        }
    };

    let schema = Schema::new(fields)?;
    let optional = |name: &str| {
        schema
            .has_field(name)
            .then(|| schema.get(name).cloned())
            .transpose()
    };
    Ok(OffsetValueSchema {
        version,
        offset: schema.get(OFFSET_KEY)?.clone(),
        leader_epoch: optional(LEADER_EPOCH_KEY)?,
        metadata: schema.get(METADATA_KEY)?.clone(),
        commit_timestamp: schema.get(commit_name)?.clone(),
        expire_timestamp: optional(EXPIRE_TIMESTAMP_KEY)?,
        schema,
    })
}

/// Member layouts for group value versions 0..=3. Versions 1 and 2 share
/// one schema instance.
fn build_member_schemas() -> Result<BTreeMap<i16, Arc<Schema>>> {
    let v0 = Schema::new([
        Field::new(MEMBER_ID_KEY, WireType::String),
        Field::new(CLIENT_ID_KEY, WireType::String),
        Field::new(CLIENT_HOST_KEY, WireType::String),
        Field::new(SESSION_TIMEOUT_KEY, WireType::Int32),
        Field::new(SUBSCRIPTION_KEY, WireType::Bytes),
        Field::new(ASSIGNMENT_KEY, WireType::Bytes),
    ])?;

    let v1 = Schema::new([
        Field::new(MEMBER_ID_KEY, WireType::String),
        Field::new(CLIENT_ID_KEY, WireType::String),
        Field::new(CLIENT_HOST_KEY, WireType::String),
        Field::new(REBALANCE_TIMEOUT_KEY, WireType::Int32),
        Field::new(SESSION_TIMEOUT_KEY, WireType::Int32),
        Field::new(SUBSCRIPTION_KEY, WireType::Bytes),
        Field::new(ASSIGNMENT_KEY, WireType::Bytes),
    ])?;

    let v3 = Schema::new([
        Field::new(MEMBER_ID_KEY, WireType::String),
        Field::new(GROUP_INSTANCE_ID_KEY, WireType::NullableString),
        Field::new(CLIENT_ID_KEY, WireType::String),
        Field::new(CLIENT_HOST_KEY, WireType::String),
        Field::new(SESSION_TIMEOUT_KEY, WireType::Int32),
        Field::new(SUBSCRIPTION_KEY, WireType::Bytes),
        Field::new(ASSIGNMENT_KEY, WireType::Bytes),
    ])?;

    let mut members = BTreeMap::new();
    members.insert(0, v0);
    members.insert(1, Arc::clone(&v1));
    members.insert(2, v1);
    members.insert(3, v3);
    Ok(members)
}

fn build_group_value_schema(
    version: i16,
    member: &Arc<Schema>,
    max_array_len: usize,
) -> Result<Arc<Schema>> {
    let mut fields = vec![
        Field::new(PROTOCOL_TYPE_KEY, WireType::String),
        Field::new(GENERATION_KEY, WireType::Int32),
        Field::new(PROTOCOL_KEY, WireType::NullableString),
        Field::new(LEADER_KEY, WireType::NullableString),
    ];
    if version >= GROUP_VALUE_STATE_TIMESTAMP_VERSION {
        fields.push(Field::new(CURRENT_STATE_TIMESTAMP_KEY, WireType::Int64));
    }
    // A negative member count decodes as absent and loads the group Empty.
    fields.push(Field::new(
        MEMBERS_KEY,
        WireType::nullable_array_of(WireType::Struct(Arc::clone(member)))
            .with_max_len(max_array_len),
    ));
    Schema::new(fields)
}
