//! Shards: the physical day files
//!
//! A shard holds every row one device received for one calendar date, one
//! encoded row per line, in insertion order. Shards are created lazily on
//! first append and rewritten only by repair.

pub mod reader;
pub mod writer;

pub use reader::{ForwardLines, ReverseLines};
pub use writer::ShardWriter;
