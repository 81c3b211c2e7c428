//! # Kafkaesque Offsets
//! Decoder for the records Kafka persists in its `__consumer_offsets` topic.
//!
//! The topic holds two kinds of records, told apart by the version of their
//! key: committed offsets (key versions 0 and 1) and consumer group metadata
//! (key version 2). Each value format has gone through several versions, and
//! all of them stay decodable.
//!
//! The crate has two layers:
//! - a schema-driven decoding engine: [`ByteWindow`](buffer::ByteWindow),
//!   [`WireType`](schema::WireType), [`Schema`](schema::Schema) and
//!   [`Record`](schema::Record)
//! - the versioned catalogs and decoders built on it:
//!   [`SchemaCatalog`](catalog::SchemaCatalog),
//!   [`GroupMetadataDecoder`](decoder::GroupMetadataDecoder) and
//!   [`ConsumerProtocol`](consumer_protocol::ConsumerProtocol)
//!
//! Decoding is synchronous and read-only. Nothing here encodes records.
//!
//! ## Getting started
//! ```
//! use kafkaesque_offsets::prelude::*;
//!
//! let decoder = GroupMetadataDecoder::new()?;
//!
//! // offset value v3: offset 42, leader epoch -1, metadata "", commit time 1000
//! let mut value = ByteWindow::wrap(vec![
//!     0, 3,
//!     0, 0, 0, 0, 0, 0, 0, 42,
//!     0xFF, 0xFF, 0xFF, 0xFF,
//!     0, 0,
//!     0, 0, 0, 0, 0, 0, 0x03, 0xE8,
//! ]);
//! let offset = decoder.read_offset_value(&mut value)?;
//! assert_eq!(offset.offset, 42);
//! assert_eq!(offset.leader_epoch, None);
//! assert_eq!(offset.commit_timestamp, 1000);
//! # Ok::<(), kafkaesque_offsets::error::Error>(())
//! ```
//!
//! ## Resources
//! - [Kafka Protocol Spec](https://kafka.apache.org/protocol.html)

#![forbid(unsafe_code)]

pub mod buffer;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod consumer_protocol;
pub mod decoder;
pub mod error;
pub mod schema;
pub mod telemetry;
pub mod types;

pub mod prelude {
    //! Main exports.
    pub use crate::buffer::ByteWindow;
    pub use crate::catalog::SchemaCatalog;
    pub use crate::config::DecoderConfig;
    pub use crate::consumer_protocol::{Assignment, ConsumerProtocol, Subscription};
    pub use crate::decoder::GroupMetadataDecoder;
    pub use crate::error::{Error, Result};
    pub use crate::schema::{BoundField, Field, Record, Schema, Value, WireType};
    pub use crate::types::{
        BaseKey, GroupMetadata, GroupMetadataKey, GroupState, GroupTopicPartition, MemberMetadata,
        OffsetAndMetadata, OffsetKey, TopicPartition,
    };

    pub use bytes;
}
