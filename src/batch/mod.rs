//! Columnar record batches
//!
//! Streams carry chunks of columnar, schema-described data. A producer
//! declares a [`Schema`] once; every [`RecordBatch`] it emits must match
//! that schema. Batches are encoded with a compact binary codec for the
//! wire; the schema itself travels as JSON in the stream preamble.
//!
//! Cell data lives in plain `Vec`s per column; the encoded form is a
//! single `Bytes` buffer, so fan-out to the socket is reference-counted,
//! not copied.

pub mod codec;
pub mod record;
pub mod schema;

pub use codec::{decode_batch, encode_batch};
pub use record::{Column, RecordBatch};
pub use schema::{DataType, Field, Schema};
