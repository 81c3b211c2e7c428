//! Group metadata decoder tests against hand-built `__consumer_offsets` records.
//!
//! # Record Layouts
//!
//! ```text
//! key v0/v1     => version group:STRING topic:STRING partition:INT32
//! key v2        => version group:STRING
//! offset v0     => version offset:INT64 metadata:STRING timestamp:INT64
//! offset v1     => version offset metadata commit_timestamp:INT64 expire_timestamp:INT64
//! offset v2     => version offset metadata commit_timestamp
//! offset v3     => version offset leader_epoch:INT32 metadata commit_timestamp
//! group v0/v1   => version protocol_type generation protocol leader members
//! group v2/v3   => version protocol_type generation protocol leader current_state_timestamp members
//! ```

use bytes::{BufMut, BytesMut};
use kafkaesque_offsets::buffer::ByteWindow;
use kafkaesque_offsets::catalog::SchemaCatalog;
use kafkaesque_offsets::config::DecoderConfig;
use kafkaesque_offsets::decoder::GroupMetadataDecoder;
use kafkaesque_offsets::error::Error;
use kafkaesque_offsets::types::{
    BaseKey, GroupMetadataKey, GroupState, GroupTopicPartition, OffsetAndMetadata, OffsetKey,
    TopicPartition,
};
use std::sync::Arc;

// ============================================================================
// Test Helpers
// ============================================================================

fn decoder() -> GroupMetadataDecoder {
    GroupMetadataDecoder::new().unwrap()
}

fn window(buf: BytesMut) -> ByteWindow {
    ByteWindow::wrap(buf.freeze())
}

fn put_string(buf: &mut BytesMut, s: &str) {
    buf.put_i16(s.len() as i16);
    buf.put_slice(s.as_bytes());
}

fn put_nullable_string(buf: &mut BytesMut, s: Option<&str>) {
    match s {
        Some(s) => put_string(buf, s),
        None => buf.put_i16(-1),
    }
}

fn put_bytes(buf: &mut BytesMut, data: &[u8]) {
    buf.put_i32(data.len() as i32);
    buf.put_slice(data);
}

fn subscription_blob(version: i16, topics: &[&str]) -> Vec<u8> {
    let mut buf = BytesMut::new();
    buf.put_i16(version);
    buf.put_i32(topics.len() as i32);
    for topic in topics {
        put_string(&mut buf, topic);
    }
    buf.put_i32(-1);
    if version >= 1 {
        buf.put_i32(0);
    }
    buf.to_vec()
}

fn assignment_blob(entries: &[(&str, &[i32])]) -> Vec<u8> {
    let mut buf = BytesMut::new();
    buf.put_i16(0);
    buf.put_i32(entries.len() as i32);
    for (topic, partitions) in entries {
        put_string(&mut buf, topic);
        buf.put_i32(partitions.len() as i32);
        for p in *partitions {
            buf.put_i32(*p);
        }
    }
    buf.put_i32(-1);
    buf.to_vec()
}

struct TestMember<'a> {
    member_id: &'a str,
    group_instance_id: Option<&'a str>,
    client_id: &'a str,
    client_host: &'a str,
    rebalance_timeout: i32,
    session_timeout: i32,
    subscription: Vec<u8>,
    assignment: Vec<u8>,
}

impl<'a> TestMember<'a> {
    fn new(member_id: &'a str, topics: &[&str], assigned: &[(&str, &[i32])]) -> Self {
        Self {
            member_id,
            group_instance_id: None,
            client_id: "consumer-1",
            client_host: "/10.0.0.1",
            rebalance_timeout: 300_000,
            session_timeout: 10_000,
            subscription: subscription_blob(0, topics),
            assignment: assignment_blob(assigned),
        }
    }

    fn put(&self, buf: &mut BytesMut, version: i16) {
        put_string(buf, self.member_id);
        if version >= 3 {
            put_nullable_string(buf, self.group_instance_id);
        }
        put_string(buf, self.client_id);
        put_string(buf, self.client_host);
        if version == 1 || version == 2 {
            buf.put_i32(self.rebalance_timeout);
        }
        buf.put_i32(self.session_timeout);
        put_bytes(buf, &self.subscription);
        put_bytes(buf, &self.assignment);
    }
}

fn group_value(
    version: i16,
    protocol: Option<&str>,
    leader: Option<&str>,
    members: &[TestMember<'_>],
) -> BytesMut {
    let mut buf = BytesMut::new();
    buf.put_i16(version);
    put_string(&mut buf, "consumer");
    buf.put_i32(5);
    put_nullable_string(&mut buf, protocol);
    put_nullable_string(&mut buf, leader);
    if version >= 2 {
        buf.put_i64(1_700_000_000_000);
    }
    buf.put_i32(members.len() as i32);
    for member in members {
        member.put(&mut buf, version);
    }
    buf
}

// ============================================================================
// Message Keys
// ============================================================================

#[test]
fn test_offset_key_v0() {
    let mut buf = BytesMut::new();
    buf.put_i16(0);
    put_string(&mut buf, "group-a");
    put_string(&mut buf, "orders");
    buf.put_i32(12);

    let key = decoder().read_message_key(&mut window(buf)).unwrap();
    assert_eq!(key.version(), 0);
    assert_eq!(key.group(), "group-a");
    assert_eq!(
        key,
        BaseKey::Offset(OffsetKey {
            version: 0,
            key: GroupTopicPartition::new("group-a", TopicPartition::new("orders", 12)),
        })
    );
}

#[test]
fn test_group_key_v2() {
    let mut buf = BytesMut::new();
    buf.put_i16(2);
    put_string(&mut buf, "group-b");

    let key = decoder().read_message_key(&mut window(buf)).unwrap();
    assert_eq!(
        key,
        BaseKey::GroupMetadata(GroupMetadataKey {
            version: 2,
            key: "group-b".to_string(),
        })
    );
}

#[test]
fn test_unknown_key_version_rejected() {
    let mut buf = BytesMut::new();
    buf.put_i16(3);
    put_string(&mut buf, "group");
    let mut window = window(buf);

    let err = decoder().read_message_key(&mut window).unwrap_err();
    assert_eq!(
        err,
        Error::UnknownVersion {
            what: "message key",
            version: 3
        }
    );
    assert_eq!(window.position(), 2);
}

#[test]
fn test_negative_key_version_rejected() {
    let mut buf = BytesMut::new();
    buf.put_i16(-1);
    assert!(matches!(
        decoder().read_message_key(&mut window(buf)),
        Err(Error::UnknownVersion { version: -1, .. })
    ));
}

// ============================================================================
// Offset Values
// ============================================================================

#[test]
fn test_offset_value_v0() {
    let mut buf = BytesMut::new();
    buf.put_i16(0);
    buf.put_i64(100);
    put_string(&mut buf, "meta");
    buf.put_i64(1_000);

    let offset = decoder().read_offset_value(&mut window(buf)).unwrap();
    assert_eq!(offset, OffsetAndMetadata::new(100, "meta", 1_000));
}

#[test]
fn test_offset_value_v1_with_expiry() {
    let mut buf = BytesMut::new();
    buf.put_i16(1);
    buf.put_i64(100);
    put_string(&mut buf, "");
    buf.put_i64(1_000);
    buf.put_i64(2_000);

    let offset = decoder().read_offset_value(&mut window(buf)).unwrap();
    assert_eq!(
        offset,
        OffsetAndMetadata::new(100, "", 1_000).with_expire_timestamp(2_000)
    );
}

#[test]
fn test_offset_value_v1_no_expiry_sentinel() {
    let mut buf = BytesMut::new();
    buf.put_i16(1);
    buf.put_i64(100);
    put_string(&mut buf, "m");
    buf.put_i64(1_000);
    buf.put_i64(-1);

    let offset = decoder().read_offset_value(&mut window(buf)).unwrap();
    assert_eq!(offset.expire_timestamp, None);
    assert_eq!(offset.commit_timestamp, 1_000);
}

#[test]
fn test_offset_value_v2() {
    let mut buf = BytesMut::new();
    buf.put_i16(2);
    buf.put_i64(7);
    put_string(&mut buf, "m");
    buf.put_i64(3_000);

    let offset = decoder().read_offset_value(&mut window(buf)).unwrap();
    assert_eq!(offset, OffsetAndMetadata::new(7, "m", 3_000));
}

#[test]
fn test_offset_value_v3_leader_epoch() {
    let mut buf = BytesMut::new();
    buf.put_i16(3);
    buf.put_i64(42);
    buf.put_i32(9);
    put_string(&mut buf, "m");
    buf.put_i64(5_000);

    let offset = decoder().read_offset_value(&mut window(buf)).unwrap();
    assert_eq!(
        offset,
        OffsetAndMetadata::new(42, "m", 5_000).with_leader_epoch(9)
    );
}

#[test]
fn test_offset_value_v3_negative_epoch_is_none() {
    let mut buf = BytesMut::new();
    buf.put_i16(3);
    buf.put_i64(42);
    buf.put_i32(-1);
    put_string(&mut buf, "m");
    buf.put_i64(5_000);

    let offset = decoder().read_offset_value(&mut window(buf)).unwrap();
    assert_eq!(offset.leader_epoch, None);
}

#[test]
fn test_offset_value_unknown_version() {
    let mut buf = BytesMut::new();
    buf.put_i16(4);
    buf.put_i64(1);
    assert_eq!(
        decoder().read_offset_value(&mut window(buf)).unwrap_err(),
        Error::UnknownVersion {
            what: "offset value",
            version: 4
        }
    );
}

#[test]
fn test_offset_value_truncated() {
    let mut buf = BytesMut::new();
    buf.put_i16(2);
    buf.put_i64(7);
    put_string(&mut buf, "m");
    buf.put_i32(0);

    let err = decoder().read_offset_value(&mut window(buf)).unwrap_err();
    assert_eq!(err.field_path(), vec!["commit_timestamp"]);
}

// ============================================================================
// Group Values
// ============================================================================

#[test]
fn test_group_value_all_versions() {
    for version in 0..=3 {
        let members = [TestMember::new("m-1", &["orders"], &[("orders", &[0, 1, 2])])];
        let buf = group_value(version, Some("range"), Some("m-1"), &members);

        let group = decoder()
            .read_group_value("group-a", &mut window(buf))
            .unwrap_or_else(|e| panic!("version {version}: {e}"));

        assert_eq!(group.group_id, "group-a");
        assert_eq!(group.initial_state, GroupState::Stable);
        assert_eq!(group.generation_id, 5);
        assert_eq!(group.protocol_type, "consumer");
        assert_eq!(group.protocol, "range");
        assert_eq!(group.leader_id, "m-1");

        let member = group.member("m-1").unwrap();
        assert_eq!(member.group_id, "group-a");
        assert_eq!(member.client_id, "consumer-1");
        assert_eq!(member.client_host, "/10.0.0.1");
        assert_eq!(member.protocol_type, "consumer");
        assert_eq!(member.session_timeout, 10_000);
        assert_eq!(
            member.supported_protocols.get("range").unwrap(),
            &vec!["orders".to_string()]
        );
        assert_eq!(
            member.topic_partitions,
            vec![
                TopicPartition::new("orders", 0),
                TopicPartition::new("orders", 1),
                TopicPartition::new("orders", 2),
            ]
        );
    }
}

#[test]
fn test_current_state_timestamp_only_for_v2() {
    let decoder = decoder();
    for (version, expected) in [(1, 0), (2, 1_700_000_000_000), (3, 0)] {
        let buf = group_value(version, Some("range"), None, &[]);
        let group = decoder.read_group_value("g", &mut window(buf)).unwrap();
        assert_eq!(group.current_state_timestamp, expected, "version {version}");
    }
}

#[test]
fn test_rebalance_timeout_by_generation() {
    let decoder = decoder();
    for (version, expected) in [(0, 10_000), (1, 300_000), (2, 300_000), (3, 10_000)] {
        let members = [TestMember::new("m", &["t"], &[])];
        let buf = group_value(version, Some("range"), Some("m"), &members);
        let group = decoder.read_group_value("g", &mut window(buf)).unwrap();
        assert_eq!(
            group.member("m").unwrap().rebalance_timeout,
            expected,
            "version {version}"
        );
    }
}

#[test]
fn test_group_instance_id_v3() {
    let mut member = TestMember::new("m-1", &["t"], &[("t", &[0])]);
    member.group_instance_id = Some("instance-1");
    let buf = group_value(3, Some("range"), Some("m-1"), &[member]);

    let group = decoder().read_group_value("g", &mut window(buf)).unwrap();
    assert_eq!(
        group.member("m-1").unwrap().group_instance_id.as_deref(),
        Some("instance-1")
    );
}

#[test]
fn test_static_member_absent_instance_id() {
    let members = [TestMember::new("m-1", &["t"], &[])];
    let buf = group_value(3, Some("range"), Some("m-1"), &members);
    let group = decoder().read_group_value("g", &mut window(buf)).unwrap();
    assert_eq!(group.member("m-1").unwrap().group_instance_id, None);
}

#[test]
fn test_null_protocol_and_leader_collapse_to_empty() {
    let buf = group_value(1, None, None, &[]);
    let group = decoder().read_group_value("g", &mut window(buf)).unwrap();
    assert_eq!(group.protocol, "");
    assert_eq!(group.leader_id, "");
    assert_eq!(group.initial_state, GroupState::Stable);
    assert!(group.is_empty());
}

#[test]
fn test_leader_inferred_from_first_member() {
    let members = [
        TestMember::new("m-2", &["t"], &[]),
        TestMember::new("m-1", &["t"], &[]),
    ];
    let buf = group_value(2, Some("range"), None, &members);
    let group = decoder().read_group_value("g", &mut window(buf)).unwrap();
    assert_eq!(group.leader_id, "m-2");
    let ids: Vec<_> = group
        .all_member_metadata()
        .into_iter()
        .map(|m| m.member_id.as_str())
        .collect();
    assert_eq!(ids, vec!["m-1", "m-2"]);
}

#[test]
fn test_subscription_v1_inside_member() {
    let mut member = TestMember::new("m-1", &[], &[]);
    member.subscription = subscription_blob(1, &["a", "b"]);
    let buf = group_value(1, Some("sticky"), Some("m-1"), &[member]);
    let group = decoder().read_group_value("g", &mut window(buf)).unwrap();
    assert_eq!(
        group.member("m-1").unwrap().supported_protocols["sticky"],
        vec!["a".to_string(), "b".to_string()]
    );
}

#[test]
fn test_bad_assignment_blob_names_member_field() {
    let mut member = TestMember::new("m-1", &["t"], &[]);
    member.assignment = vec![0xFF, 0xFF];
    let buf = group_value(0, Some("range"), Some("m-1"), &[member]);

    let err = decoder().read_group_value("g", &mut window(buf)).unwrap_err();
    assert_eq!(err.field_path(), vec!["members", "assignment"]);
    assert_eq!(
        err.root(),
        &Error::UnsupportedVersion {
            what: "assignment",
            version: -1
        }
    );
}

#[test]
fn test_group_value_unknown_version() {
    let buf = group_value(4, Some("range"), None, &[]);
    assert!(matches!(
        decoder().read_group_value("g", &mut window(buf)),
        Err(Error::UnknownVersion {
            what: "group value",
            version: 4
        })
    ));
}

#[test]
fn test_members_count_beyond_buffer_rejected() {
    let mut buf = group_value(0, Some("range"), None, &[]);
    let len = buf.len();
    buf.truncate(len - 4);
    buf.put_i32(1_000);
    let err = decoder().read_group_value("g", &mut window(buf)).unwrap_err();
    assert_eq!(err.field_path(), vec!["members"]);
    assert!(matches!(err.root(), Error::Underflow { needed: 1_000, .. }));
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_shared_catalog_across_decoders() {
    let catalog = Arc::new(SchemaCatalog::with_config(DecoderConfig::default()).unwrap());
    let a = GroupMetadataDecoder::from_catalog(Arc::clone(&catalog));
    let b = GroupMetadataDecoder::from_catalog(catalog);

    let members = [TestMember::new("m", &["t"], &[("t", &[1])])];
    let bytes = group_value(3, Some("range"), Some("m"), &members).freeze();
    let left = a.read_group_value("g", &mut ByteWindow::wrap(bytes.clone())).unwrap();
    let right = b.read_group_value("g", &mut ByteWindow::wrap(bytes)).unwrap();
    assert_eq!(left.members, right.members);
}

#[test]
fn test_member_array_limit_from_config() {
    let decoder =
        GroupMetadataDecoder::with_config(DecoderConfig::default().with_max_array_len(1)).unwrap();
    let members = [
        TestMember::new("m-1", &["t"], &[]),
        TestMember::new("m-2", &["t"], &[]),
    ];
    let buf = group_value(0, Some("range"), None, &members);
    let err = decoder.read_group_value("g", &mut window(buf)).unwrap_err();
    assert!(matches!(err.root(), Error::OutOfBounds { bound: 1, .. }));
}

// ============================================================================
// Serialization
// ============================================================================

#[test]
fn test_group_metadata_serializes() {
    let members = [TestMember::new("m-1", &["orders"], &[("orders", &[0])])];
    let buf = group_value(2, Some("range"), Some("m-1"), &members);
    let group = decoder().read_group_value("g", &mut window(buf)).unwrap();

    let json = serde_json::to_value(&group).unwrap();
    assert_eq!(json["initial_state"], "Stable");
    assert_eq!(json["members"]["m-1"]["topic_partitions"][0]["topic"], "orders");

    let back: kafkaesque_offsets::types::GroupMetadata = serde_json::from_value(json).unwrap();
    assert_eq!(back, group);
}
