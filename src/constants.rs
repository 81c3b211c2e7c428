//! Centralized wire constants.
//!
//! Schema versions and field names for the records persisted in the
//! consumer offsets topic, plus the embedded consumer protocol.
//!
//! # Categories
//!
//! - **Limits**: guards applied while decoding
//! - **Message Key Versions**: the key version decides the record kind
//! - **Consumer Protocol**: subscription/assignment blob versions
//! - **Field Names**: names used when the catalog builds its schemas

// =============================================================================
// Limits
// =============================================================================

/// Maximum element count accepted for any array prefix.
///
/// Arrays are also rejected when the count exceeds the remaining bytes, which
/// bounds work to the input size; this caps it further for large inputs.
pub const MAX_PROTOCOL_ARRAY_SIZE: usize = 1_000_000;

// =============================================================================
// Message Key Versions
// =============================================================================

/// Highest key version that denotes an offset commit key (versions 0 and 1).
pub const CURRENT_OFFSET_KEY_SCHEMA_VERSION: i16 = 1;

/// Key version that denotes a group metadata key.
pub const CURRENT_GROUP_KEY_SCHEMA_VERSION: i16 = 2;

/// Highest offset commit value version with a registered schema.
pub const CURRENT_OFFSET_VALUE_SCHEMA_VERSION: i16 = 3;

/// Highest group metadata value version with a registered schema.
pub const CURRENT_GROUP_VALUE_SCHEMA_VERSION: i16 = 3;

/// Group value version that carries `current_state_timestamp`.
pub const GROUP_VALUE_STATE_TIMESTAMP_VERSION: i16 = 2;

/// First group value version whose members carry `group_instance_id`.
pub const GROUP_VALUE_INSTANCE_ID_VERSION: i16 = 3;

/// Expire timestamp sentinel meaning "no expiry" in offset value v1.
pub const NO_EXPIRE_TIMESTAMP: i64 = -1;

// =============================================================================
// Consumer Protocol
// =============================================================================

pub const CONSUMER_PROTOCOL_V0: i16 = 0;
pub const CONSUMER_PROTOCOL_V1: i16 = 1;

// =============================================================================
// Field Names
// =============================================================================

// Offset commit key / group metadata key
pub const GROUP_KEY: &str = "group";
pub const TOPIC_KEY: &str = "topic";
pub const PARTITION_KEY: &str = "partition";

// Offset commit value
pub const OFFSET_KEY: &str = "offset";
pub const LEADER_EPOCH_KEY: &str = "leader_epoch";
pub const METADATA_KEY: &str = "metadata";
pub const TIMESTAMP_KEY: &str = "timestamp";
pub const COMMIT_TIMESTAMP_KEY: &str = "commit_timestamp";
pub const EXPIRE_TIMESTAMP_KEY: &str = "expire_timestamp";

// Group metadata value
pub const PROTOCOL_TYPE_KEY: &str = "protocol_type";
pub const GENERATION_KEY: &str = "generation";
pub const PROTOCOL_KEY: &str = "protocol";
pub const LEADER_KEY: &str = "leader";
pub const CURRENT_STATE_TIMESTAMP_KEY: &str = "current_state_timestamp";
pub const MEMBERS_KEY: &str = "members";

// Member metadata
pub const MEMBER_ID_KEY: &str = "member_id";
pub const GROUP_INSTANCE_ID_KEY: &str = "group_instance_id";
pub const CLIENT_ID_KEY: &str = "client_id";
pub const CLIENT_HOST_KEY: &str = "client_host";
pub const REBALANCE_TIMEOUT_KEY: &str = "rebalance_timeout";
pub const SESSION_TIMEOUT_KEY: &str = "session_timeout";
pub const SUBSCRIPTION_KEY: &str = "subscription";
pub const ASSIGNMENT_KEY: &str = "assignment";

// Consumer protocol
pub const VERSION_KEY: &str = "version";
pub const PARTITIONS_KEY: &str = "partitions";
pub const OWNED_PARTITIONS_KEY: &str = "owned_partitions";
pub const TOPIC_PARTITIONS_KEY: &str = "topic_partitions";
pub const USER_DATA_KEY: &str = "user_data";
