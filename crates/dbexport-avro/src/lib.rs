//! Avro rendering of exported objects: type mapping, schema synthesis, row
//! encoding and shard file output.

mod name;

pub mod schema;
pub use schema::{Column, OutputSchema};

pub mod ty;
pub use ty::AvroType;

mod value;
pub use value::encode_record;

pub mod writer;
pub use writer::{Codec, ShardFile, ShardFileOptions, Written};

/// User metadata key holding the object name.
pub const METADATA_OBJECT: &str = "dbexport.object";

/// User metadata key holding the run's snapshot token.
pub const METADATA_SNAPSHOT: &str = "dbexport.snapshot";

/// User metadata key holding the exact synthesized schema document.
pub const METADATA_SCHEMA: &str = "dbexport.schema";

/// Annotation key carrying a field's source type string.
pub const SQL_TYPE: &str = "sqlType";
