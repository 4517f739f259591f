/// Builds a [`Key`](crate::stmt::Key) from a list of values.
///
/// ```
/// # use dbexport_core::key;
/// let k = key![1_i64, "a"];
/// assert_eq!(k.len(), 2);
/// ```
#[macro_export]
macro_rules! key {
    ( $( $value:expr ),* $(,)? ) => {
        $crate::stmt::Key::from_vec(vec![ $( $crate::stmt::Value::from($value), )* ])
    };
}

/// Builds a [`ValueRecord`](crate::stmt::ValueRecord) from a list of values.
#[macro_export]
macro_rules! record {
    ( $( $value:expr ),* $(,)? ) => {
        $crate::stmt::ValueRecord::from_vec(vec![ $( $crate::stmt::Value::from($value), )* ])
    };
}
