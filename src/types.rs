//! Domain objects recovered from the consumer offsets topic.
//!
//! All of these are plain values: the decoder builds them once and hands
//! ownership to the caller. None of them borrow from the decoded buffer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A partition of a topic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TopicPartition {
    pub topic: String,
    pub partition: i32,
}

impl TopicPartition {
    pub fn new(topic: impl Into<String>, partition: i32) -> Self {
        Self {
            topic: topic.into(),
            partition,
        }
    }
}

impl fmt::Display for TopicPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.topic, self.partition)
    }
}

/// A topic partition as seen by one consumer group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupTopicPartition {
    pub group: String,
    pub topic_partition: TopicPartition,
}

impl GroupTopicPartition {
    pub fn new(group: impl Into<String>, topic_partition: TopicPartition) -> Self {
        Self {
            group: group.into(),
            topic_partition,
        }
    }
}

impl fmt::Display for GroupTopicPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{},{},{}]",
            self.group, self.topic_partition.topic, self.topic_partition.partition
        )
    }
}

/// A committed offset.
///
/// `leader_epoch` is only carried by value version 3 and `expire_timestamp`
/// only by version 1; both are `None` when unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetAndMetadata {
    pub offset: i64,
    pub leader_epoch: Option<i32>,
    pub metadata: String,
    pub commit_timestamp: i64,
    pub expire_timestamp: Option<i64>,
}

impl OffsetAndMetadata {
    pub fn new(offset: i64, metadata: impl Into<String>, commit_timestamp: i64) -> Self {
        Self {
            offset,
            leader_epoch: None,
            metadata: metadata.into(),
            commit_timestamp,
            expire_timestamp: None,
        }
    }

    pub fn with_expire_timestamp(mut self, expire_timestamp: i64) -> Self {
        self.expire_timestamp = Some(expire_timestamp);
        self
    }

    pub fn with_leader_epoch(mut self, leader_epoch: i32) -> Self {
        self.leader_epoch = Some(leader_epoch);
        self
    }
}

/// Key of an offset commit record (key versions 0 and 1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetKey {
    pub version: i16,
    pub key: GroupTopicPartition,
}

/// Key of a group metadata record (key version 2).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMetadataKey {
    pub version: i16,
    pub key: String,
}

/// A decoded message key. The key version decides which kind it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaseKey {
    Offset(OffsetKey),
    GroupMetadata(GroupMetadataKey),
}

impl BaseKey {
    pub fn version(&self) -> i16 {
        match self {
            BaseKey::Offset(k) => k.version,
            BaseKey::GroupMetadata(k) => k.version,
        }
    }

    /// The consumer group the record belongs to.
    pub fn group(&self) -> &str {
        match self {
            BaseKey::Offset(k) => &k.key.group,
            BaseKey::GroupMetadata(k) => &k.key,
        }
    }
}

impl From<OffsetKey> for BaseKey {
    fn from(key: OffsetKey) -> Self {
        BaseKey::Offset(key)
    }
}

impl From<GroupMetadataKey> for BaseKey {
    fn from(key: GroupMetadataKey) -> Self {
        BaseKey::GroupMetadata(key)
    }
}

/// State of a consumer group.
///
/// Used as a snapshot label only; no transitions happen here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GroupState {
    #[default]
    Empty,
    PreparingRebalance,
    CompletingRebalance,
    Stable,
    Dead,
}

impl fmt::Display for GroupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GroupState::Empty => "Empty",
            GroupState::PreparingRebalance => "PreparingRebalance",
            GroupState::CompletingRebalance => "CompletingRebalance",
            GroupState::Stable => "Stable",
            GroupState::Dead => "Dead",
        };
        f.write_str(name)
    }
}

/// One member of a consumer group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberMetadata {
    pub member_id: String,
    pub group_id: String,
    pub group_instance_id: Option<String>,
    pub client_id: String,
    pub client_host: String,
    pub protocol_type: String,
    pub rebalance_timeout: i32,
    pub session_timeout: i32,
    /// Protocol name to subscribed topics, in subscription order.
    pub supported_protocols: BTreeMap<String, Vec<String>>,
    /// Assigned partitions, in assignment order.
    pub topic_partitions: Vec<TopicPartition>,
}

/// A point-in-time snapshot of a consumer group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMetadata {
    pub group_id: String,
    pub initial_state: GroupState,
    pub generation_id: i32,
    pub protocol_type: String,
    pub protocol: String,
    pub leader_id: String,
    pub current_state_timestamp: i64,
    pub members: BTreeMap<String, MemberMetadata>,
    /// Wall-clock milliseconds when the snapshot was decoded.
    pub load_time: i64,
}

impl GroupMetadata {
    pub fn new(group_id: impl Into<String>, initial_state: GroupState, load_time: i64) -> Self {
        Self {
            group_id: group_id.into(),
            initial_state,
            generation_id: 0,
            protocol_type: String::new(),
            protocol: String::new(),
            leader_id: String::new(),
            current_state_timestamp: 0,
            members: BTreeMap::new(),
            load_time,
        }
    }

    /// Add a member. The first member fills in `protocol_type` and `leader_id`
    /// when they are unset.
    pub fn add_member(&mut self, member: MemberMetadata) {
        if self.members.is_empty() && self.protocol_type.is_empty() {
            self.protocol_type = member.protocol_type.clone();
        }
        if self.leader_id.is_empty() {
            self.leader_id = member.member_id.clone();
        }
        self.members.insert(member.member_id.clone(), member);
    }

    pub fn member(&self, member_id: &str) -> Option<&MemberMetadata> {
        self.members.get(member_id)
    }

    /// Members ordered by member id.
    pub fn all_member_metadata(&self) -> Vec<&MemberMetadata> {
        self.members.values().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
