//! Row values as they travel from a driver to the output writer.

mod key;
pub use key::Key;

mod key_range;
pub use key_range::KeyRange;

mod value;
pub use value::Value;

mod value_cmp;

mod value_record;
pub use value_record::ValueRecord;

mod value_stream;
pub use value_stream::ValueStream;
