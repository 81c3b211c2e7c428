//! Embedded consumer protocol: subscription and assignment blobs.
//!
//! Group members store their subscription and assignment as opaque byte
//! blobs inside the group metadata value. Each blob starts with its own
//! INT16 version, independent of the enclosing record's version.
//!
//! ```text
//! Subscription v0 => version topics:[STRING] user_data:NULLABLE_BYTES
//! Subscription v1 => v0 + owned_partitions:[topic:STRING partitions:[INT32]]
//! Assignment v0/1 => version topic_partitions:[topic:STRING partitions:[INT32]] user_data:NULLABLE_BYTES
//! ```
//!
//! Versions above the newest known layout decode with the newest layout.

use std::borrow::Cow;
use std::sync::Arc;

use tracing::trace;

use crate::buffer::ByteWindow;
use crate::config::DecoderConfig;
use crate::constants::{
    CONSUMER_PROTOCOL_V0, CONSUMER_PROTOCOL_V1, OWNED_PARTITIONS_KEY, PARTITIONS_KEY, TOPIC_KEY,
    TOPIC_PARTITIONS_KEY, USER_DATA_KEY, VERSION_KEY,
};
use crate::error::{Error, Result, ResultExt};
use crate::schema::{Field, Record, Schema, Value, WireType};
use crate::types::TopicPartition;

/// A decoded member subscription.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Subscription {
    version: i16,
    topics: Vec<String>,
    user_data: Option<ByteWindow>,
    owned_partitions: Vec<TopicPartition>,
}

impl Subscription {
    pub fn new(
        topics: Vec<String>,
        user_data: Option<ByteWindow>,
        owned_partitions: Vec<TopicPartition>,
    ) -> Self {
        Self {
            version: CONSUMER_PROTOCOL_V0,
            topics,
            user_data,
            owned_partitions,
        }
    }

    /// The blob's own protocol version.
    pub fn version(&self) -> i16 {
        self.version
    }

    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    /// Opaque assignor data. Aliases the decoded buffer.
    pub fn user_data(&self) -> Option<&ByteWindow> {
        self.user_data.as_ref()
    }

    /// Partitions the member owned before the rebalance (v1 and later).
    pub fn owned_partitions(&self) -> &[TopicPartition] {
        &self.owned_partitions
    }

    pub fn into_topics(self) -> Vec<String> {
        self.topics
    }
}

/// A decoded member assignment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Assignment {
    version: i16,
    partitions: Vec<TopicPartition>,
    user_data: Option<ByteWindow>,
}

impl Assignment {
    pub fn new(partitions: Vec<TopicPartition>, user_data: Option<ByteWindow>) -> Self {
        Self {
            version: CONSUMER_PROTOCOL_V0,
            partitions,
            user_data,
        }
    }

    pub fn version(&self) -> i16 {
        self.version
    }

    /// Assigned partitions, flattened in wire order.
    pub fn partitions(&self) -> &[TopicPartition] {
        &self.partitions
    }

    pub fn user_data(&self) -> Option<&ByteWindow> {
        self.user_data.as_ref()
    }

    pub fn into_partitions(self) -> Vec<TopicPartition> {
        self.partitions
    }
}

/// Decoder for subscription and assignment blobs.
///
/// Holds its compiled schemas; stateless across calls.
#[derive(Debug, Clone)]
pub struct ConsumerProtocol {
    header: Arc<Schema>,
    topic_assignment: Arc<Schema>,
    assignment_v0: Arc<Schema>,
    subscription_v0: Arc<Schema>,
    subscription_v1: Arc<Schema>,
    promote_scalar_arrays: bool,
}

impl ConsumerProtocol {
    pub fn new() -> Result<Self> {
        Self::with_config(&DecoderConfig::default())
    }

    pub fn with_config(config: &DecoderConfig) -> Result<Self> {
        let max = config.max_array_len;
        let array = |element: WireType| WireType::array_of(element).with_max_len(max);

        let header = Schema::new([Field::new(VERSION_KEY, WireType::Int16)])?;

        let topic_assignment = Schema::new([
            Field::new(TOPIC_KEY, WireType::String),
            Field::new(PARTITIONS_KEY, array(WireType::Int32)),
        ])?;

        let assignment_v0 = Schema::new([
            Field::new(
                TOPIC_PARTITIONS_KEY,
                array(WireType::Struct(Arc::clone(&topic_assignment))),
            ),
            Field::new(USER_DATA_KEY, WireType::NullableBytes),
        ])?;

        let subscription_v0 = Schema::new([
            Field::new(TOPIC_KEY, array(WireType::String)),
            Field::new(USER_DATA_KEY, WireType::NullableBytes),
        ])?;

        let subscription_v1 = Schema::new([
            Field::new(TOPIC_KEY, array(WireType::String)),
            Field::new(USER_DATA_KEY, WireType::NullableBytes),
            Field::new(
                OWNED_PARTITIONS_KEY,
                array(WireType::Struct(Arc::clone(&topic_assignment))),
            ),
        ])?;

        Ok(Self {
            header,
            topic_assignment,
            assignment_v0,
            subscription_v0,
            subscription_v1,
            promote_scalar_arrays: config.promote_scalar_arrays,
        })
    }

    /// Schema of one `{topic, partitions}` entry.
    pub fn topic_assignment_schema(&self) -> &Arc<Schema> {
        &self.topic_assignment
    }

    pub fn deserialize_subscription(&self, window: &mut ByteWindow) -> Result<Subscription> {
        let version = self.read_version(window, "subscription")?;
        let schema = if version >= CONSUMER_PROTOCOL_V1 {
            &self.subscription_v1
        } else {
            &self.subscription_v0
        };
        let record = schema.read(window)?;

        let topics = self
            .array(&record, TOPIC_KEY)?
            .iter()
            .map(Value::as_string)
            .collect::<Result<Vec<_>>>()
            .in_field(TOPIC_KEY)?;
        let user_data = record.get_byte_window(USER_DATA_KEY)?;
        let owned_partitions = if record.has_field(OWNED_PARTITIONS_KEY) {
            self.topic_partitions(&record, OWNED_PARTITIONS_KEY)?
        } else {
            Vec::new()
        };

        trace!(
            version,
            topics = topics.len(),
            owned = owned_partitions.len(),
            "Decoded subscription"
        );

        Ok(Subscription {
            version,
            topics,
            user_data,
            owned_partitions,
        })
    }

    /// Decode an assignment. Every non-negative version shares one layout.
    pub fn deserialize_assignment(&self, window: &mut ByteWindow) -> Result<Assignment> {
        let version = self.read_version(window, "assignment")?;
        let record = self.assignment_v0.read(window)?;

        let partitions = self.topic_partitions(&record, TOPIC_PARTITIONS_KEY)?;
        let user_data = record.get_byte_window(USER_DATA_KEY)?;

        trace!(version, partitions = partitions.len(), "Decoded assignment");

        Ok(Assignment {
            version,
            partitions,
            user_data,
        })
    }

    fn read_version(&self, window: &mut ByteWindow, what: &'static str) -> Result<i16> {
        let version = self.header.read(window)?.get_int16(VERSION_KEY)?;
        if version < CONSUMER_PROTOCOL_V0 {
            return Err(Error::UnsupportedVersion { what, version });
        }
        Ok(version)
    }

    /// Flatten `[{topic, partitions: [p0, p1, ..]}]` into one entry per partition.
    fn topic_partitions(&self, record: &Record, name: &str) -> Result<Vec<TopicPartition>> {
        let mut flattened = Vec::new();
        for entry in self.array(record, name)?.iter() {
            let entry = entry.as_record().in_field(name)?;
            let topic = entry.get_string(TOPIC_KEY).in_field(name)?;
            for partition in self.array(entry, PARTITIONS_KEY).in_field(name)?.iter() {
                let partition = partition.as_int32().in_field(name)?;
                flattened.push(TopicPartition::new(topic.clone(), partition));
            }
        }
        Ok(flattened)
    }

    fn array<'a>(&self, record: &'a Record, name: &'a str) -> Result<Cow<'a, [Value]>> {
        let items = if self.promote_scalar_arrays {
            record.get_array(name)?
        } else {
            record.get_array_strict(name)?
        };
        Ok(items.unwrap_or_default())
    }
}
