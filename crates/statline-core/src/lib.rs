//! Core domain logic for the statline player timeline.
//!
//! This crate contains the pure pieces of the system:
//! - the attribute/entry data model and the one-line-per-entry codec
//! - conversion of upstream stat snapshots into attribute rows
//! - session-start detection over a backward entry scan
//! - segment construction: edge states, diffs, and counter deltas

pub mod attrs;
pub mod codec;
pub mod diff;
pub mod entry;
pub mod segment;
pub mod session;
pub mod snapshot;
pub mod types;

pub use codec::{DecodeError, decode_entry, encode_entry};
pub use diff::{StatDiff, ValueChange};
pub use entry::{AttributeKey, AttributeValue, Scope, TimelineEntry};
pub use segment::{CounterDelta, Segment, SegmentBuilder, SegmentChange};
pub use session::{MAX_SESSION_BREAK_SECS, SessionScan};
pub use snapshot::PlayerSnapshot;
pub use types::{PlayerId, ValidationError};
