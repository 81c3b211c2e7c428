//! Decoder for consumer offsets topic records.
//!
//! Every record starts with an INT16 version. The decoder reads it, picks
//! the matching schema from the [`SchemaCatalog`], decodes the record and
//! assembles the domain object for that version.
//!
//! # Example
//!
//! ```
//! use kafkaesque_offsets::buffer::ByteWindow;
//! use kafkaesque_offsets::decoder::GroupMetadataDecoder;
//! use kafkaesque_offsets::types::BaseKey;
//!
//! let decoder = GroupMetadataDecoder::new().unwrap();
//!
//! // version 2 group key for group "g"
//! let mut key = ByteWindow::wrap(vec![0, 2, 0, 1, b'g']);
//! match decoder.read_message_key(&mut key).unwrap() {
//!     BaseKey::GroupMetadata(k) => assert_eq!(k.key, "g"),
//!     BaseKey::Offset(_) => unreachable!(),
//! }
//! ```

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, trace};

use crate::buffer::ByteWindow;
use crate::catalog::{OffsetValueSchema, SchemaCatalog};
use crate::config::DecoderConfig;
use crate::constants::*;
use crate::error::{Error, Result, ResultExt};
use crate::schema::{BoundField, Record, Value};
use crate::types::{
    BaseKey, GroupMetadata, GroupMetadataKey, GroupState, GroupTopicPartition, MemberMetadata,
    OffsetAndMetadata, OffsetKey, TopicPartition,
};

/// Decodes message keys, offset values and group values.
///
/// Cheap to clone; all clones share one catalog.
#[derive(Debug, Clone)]
pub struct GroupMetadataDecoder {
    catalog: Arc<SchemaCatalog>,
}

impl GroupMetadataDecoder {
    /// Decoder over a freshly built catalog with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(DecoderConfig::default())
    }

    pub fn with_config(config: DecoderConfig) -> Result<Self> {
        Ok(Self::from_catalog(Arc::new(SchemaCatalog::with_config(
            config,
        )?)))
    }

    /// Decoder over an existing, shared catalog.
    pub fn from_catalog(catalog: Arc<SchemaCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Arc<SchemaCatalog> {
        &self.catalog
    }

    /// Decode a message key.
    ///
    /// Versions 0 and 1 are offset commit keys, version 2 is a group
    /// metadata key.
    pub fn read_message_key(&self, window: &mut ByteWindow) -> Result<BaseKey> {
        let version = read_version(window)?;
        let record = self.catalog.key_schema(version)?.read(window)?;
        debug!(version, "Decoding message key");

        match version {
            0..=CURRENT_OFFSET_KEY_SCHEMA_VERSION => {
                let fields = self.catalog.offset_key();
                let group = record.get_string(&fields.group).in_field(GROUP_KEY)?;
                let topic = record.get_string(&fields.topic).in_field(TOPIC_KEY)?;
                let partition = record.get_int(&fields.partition).in_field(PARTITION_KEY)?;
                Ok(BaseKey::Offset(OffsetKey {
                    version,
                    key: GroupTopicPartition::new(group, TopicPartition::new(topic, partition)),
                }))
            }
            CURRENT_GROUP_KEY_SCHEMA_VERSION => {
                let fields = self.catalog.group_key();
                Ok(BaseKey::GroupMetadata(GroupMetadataKey {
                    version,
                    key: record.get_string(&fields.group).in_field(GROUP_KEY)?,
                }))
            }
            _ => Err(Error::UnknownVersion {
                what: "message key",
                version,
            }),
        }
    }

    /// Decode an offset commit value.
    pub fn read_offset_value(&self, window: &mut ByteWindow) -> Result<OffsetAndMetadata> {
        let version = read_version(window)?;
        let fields = self.catalog.offset_value_schema(version)?;
        let record = fields.schema.read(window)?;
        debug!(version, "Decoding offset value");
        offset_value(fields, &record)
    }

    /// Decode a group metadata value for `group_id`.
    ///
    /// The group id is not part of the value; callers take it from the key.
    pub fn read_group_value(&self, group_id: &str, window: &mut ByteWindow) -> Result<GroupMetadata> {
        let version = read_version(window)?;
        let schema = self.catalog.group_value_schema(version)?;
        let record = schema.schema.read(window)?;

        let protocol_type = record
            .get_string(PROTOCOL_TYPE_KEY)
            .in_field(PROTOCOL_TYPE_KEY)?;
        let generation_id = record.get_int(GENERATION_KEY).in_field(GENERATION_KEY)?;
        let protocol = record.get_string(PROTOCOL_KEY).in_field(PROTOCOL_KEY)?;
        let leader_id = record.get_string(LEADER_KEY).in_field(LEADER_KEY)?;
        let members = self.array(&record, MEMBERS_KEY).in_field(MEMBERS_KEY)?;

        let initial_state = match members {
            Some(_) => GroupState::Stable,
            None => GroupState::Empty,
        };

        let current_state_timestamp = if version == GROUP_VALUE_STATE_TIMESTAMP_VERSION
            && record.has_field(CURRENT_STATE_TIMESTAMP_KEY)
        {
            record
                .get_int64(CURRENT_STATE_TIMESTAMP_KEY)
                .in_field(CURRENT_STATE_TIMESTAMP_KEY)?
        } else {
            0
        };

        debug!(
            group_id,
            version,
            generation_id,
            members = members.as_ref().map_or(0, |m| m.len()),
            "Decoding group value"
        );

        let mut group = GroupMetadata::new(group_id, initial_state, now_millis());
        group.generation_id = generation_id;
        group.protocol_type = protocol_type;
        group.protocol = protocol;
        group.leader_id = leader_id;
        group.current_state_timestamp = current_state_timestamp;

        for item in members.as_deref().unwrap_or_default() {
            let member = self
                .read_member(version, &group, item)
                .in_field(MEMBERS_KEY)?;
            group.add_member(member);
        }

        Ok(group)
    }

    fn read_member(
        &self,
        version: i16,
        group: &GroupMetadata,
        item: &Value,
    ) -> Result<MemberMetadata> {
        let record = item.as_record()?;

        let member_id = record.get_string(MEMBER_ID_KEY).in_field(MEMBER_ID_KEY)?;
        let group_instance_id = if version >= GROUP_VALUE_INSTANCE_ID_VERSION {
            record
                .get_nullable_string(GROUP_INSTANCE_ID_KEY)
                .in_field(GROUP_INSTANCE_ID_KEY)?
        } else {
            None
        };
        let client_id = record.get_string(CLIENT_ID_KEY).in_field(CLIENT_ID_KEY)?;
        let client_host = record.get_string(CLIENT_HOST_KEY).in_field(CLIENT_HOST_KEY)?;
        let session_timeout = record
            .get_int(SESSION_TIMEOUT_KEY)
            .in_field(SESSION_TIMEOUT_KEY)?;
        let rebalance_timeout = if record.has_field(REBALANCE_TIMEOUT_KEY) {
            record
                .get_int(REBALANCE_TIMEOUT_KEY)
                .in_field(REBALANCE_TIMEOUT_KEY)?
        } else {
            session_timeout
        };

        let protocol = self.catalog.consumer_protocol();

        let subscription = protocol
            .deserialize_subscription(&mut blob(record, SUBSCRIPTION_KEY)?)
            .in_field(SUBSCRIPTION_KEY)?;
        let mut supported_protocols = BTreeMap::new();
        supported_protocols.insert(group.protocol.clone(), subscription.into_topics());

        let topic_partitions = protocol
            .deserialize_assignment(&mut blob(record, ASSIGNMENT_KEY)?)
            .in_field(ASSIGNMENT_KEY)?
            .into_partitions();

        trace!(
            member_id = %member_id,
            client_id = %client_id,
            partitions = topic_partitions.len(),
            "Decoded member"
        );

        Ok(MemberMetadata {
            member_id,
            group_id: group.group_id.clone(),
            group_instance_id,
            client_id,
            client_host,
            protocol_type: group.protocol_type.clone(),
            rebalance_timeout,
            session_timeout,
            supported_protocols,
            topic_partitions,
        })
    }

    fn array<'a>(&self, record: &'a Record, name: &'a str) -> Result<Option<Cow<'a, [Value]>>> {
        if self.catalog.config().promote_scalar_arrays {
            record.get_array(name)
        } else {
            record.get_array_strict(name)
        }
    }
}

/// Assemble an offset commit value from a record of `fields.schema`.
fn offset_value(fields: &OffsetValueSchema, record: &Record) -> Result<OffsetAndMetadata> {
    let get_int64 = |field: &BoundField| record.get_int64(field).in_field(field.name());

    let mut offset = OffsetAndMetadata::new(
        get_int64(&fields.offset)?,
        record
            .get_string(&fields.metadata)
            .in_field(fields.metadata.name())?,
        get_int64(&fields.commit_timestamp)?,
    );

    if let Some(field) = &fields.leader_epoch {
        let leader_epoch = record.get_int(field).in_field(field.name())?;
        if leader_epoch >= 0 {
            offset = offset.with_leader_epoch(leader_epoch);
        }
    }

    if let Some(field) = &fields.expire_timestamp {
        let expire_timestamp = get_int64(field)?;
        if expire_timestamp != NO_EXPIRE_TIMESTAMP {
            offset = offset.with_expire_timestamp(expire_timestamp);
        }
    }

    Ok(offset)
}

fn read_version(window: &mut ByteWindow) -> Result<i16> {
    window.read_i16().in_field(VERSION_KEY)
}

/// A required byte blob field as its own cursor.
fn blob(record: &Record, name: &str) -> Result<ByteWindow> {
    record
        .get_byte_window(name)?
        .ok_or_else(|| Error::MissingRequiredField(name.to_string()))
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{BufMut, BytesMut};

    fn put_string(buf: &mut BytesMut, s: &str) {
        buf.put_i16(s.len() as i16);
        buf.put_slice(s.as_bytes());
    }

    #[test]
    fn test_offset_key_v1() {
        let mut buf = BytesMut::new();
        buf.put_i16(1);
        put_string(&mut buf, "g");
        put_string(&mut buf, "t");
        buf.put_i32(7);

        let decoder = GroupMetadataDecoder::new().unwrap();
        let key = decoder
            .read_message_key(&mut ByteWindow::wrap(buf.freeze()))
            .unwrap();
        assert_eq!(
            key,
            BaseKey::Offset(OffsetKey {
                version: 1,
                key: GroupTopicPartition::new("g", TopicPartition::new("t", 7)),
            })
        );
    }

    #[test]
    fn test_missing_version_tag() {
        let decoder = GroupMetadataDecoder::new().unwrap();
        let err = decoder
            .read_offset_value(&mut ByteWindow::wrap(vec![0u8]))
            .unwrap_err();
        assert_eq!(err.field_path(), vec![VERSION_KEY]);
        assert!(matches!(err.root(), Error::Underflow { needed: 2, .. }));
    }

    #[test]
    fn test_offset_value_accessor_errors_name_the_field() {
        let catalog = SchemaCatalog::new().unwrap();
        let v0 = catalog.offset_value_schema(0).unwrap();
        let v3 = catalog.offset_value_schema(3).unwrap();
        let record = v0
            .schema
            .record(vec![Value::Int64(5), Value::from("m"), Value::Int64(9)])
            .unwrap();

        let err = offset_value(v3, &record).unwrap_err();
        assert_eq!(err.field_path(), vec![OFFSET_KEY]);
        assert_eq!(err.root(), &Error::SchemaMismatch(OFFSET_KEY.to_string()));

        let offset = offset_value(v0, &record).unwrap();
        assert_eq!(offset.offset, 5);
        assert_eq!(offset.commit_timestamp, 9);
    }

    #[test]
    fn test_group_value_absent_members_is_empty() {
        let mut buf = BytesMut::new();
        buf.put_i16(0);
        put_string(&mut buf, "consumer");
        buf.put_i32(1);
        buf.put_i16(-1);
        buf.put_i16(-1);
        buf.put_i32(-1);

        let decoder = GroupMetadataDecoder::new().unwrap();
        let group = decoder
            .read_group_value("g", &mut ByteWindow::wrap(buf.freeze()))
            .unwrap();
        assert_eq!(group.initial_state, GroupState::Empty);
        assert_eq!(group.protocol, "");
        assert_eq!(group.leader_id, "");
        assert!(group.is_empty());
        assert!(group.load_time > 0);
    }

    #[test]
    fn test_shared_catalog() {
        let catalog = Arc::new(SchemaCatalog::new().unwrap());
        let a = GroupMetadataDecoder::from_catalog(Arc::clone(&catalog));
        let b = a.clone();
        assert!(Arc::ptr_eq(a.catalog(), b.catalog()));
        assert_eq!(Arc::strong_count(&catalog), 3);
    }
}
