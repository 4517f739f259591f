//! The intermediate schema tree: a dialect-neutral description of every
//! exportable object, as read from the source catalog at the run's snapshot.

mod catalog;
pub use catalog::Catalog;

mod dialect;
pub use dialect::Dialect;

mod field;
pub use field::{Field, Generated, NestedStruct};

mod object;
pub use object::{Object, ObjectKind};

mod sql_type;
pub use sql_type::{SqlType, StructField};
