use super::{Error, ErrorKind};

/// A source type that has no output representation.
///
/// Fatal for the object that declares the field: its schema cannot be
/// synthesized without every field.
#[derive(Debug)]
pub(super) struct UnsupportedTypeError {
    pub(super) object: Box<str>,
    pub(super) field: Box<str>,
    pub(super) sql_type: Box<str>,
}

impl std::error::Error for UnsupportedTypeError {}

impl core::fmt::Display for UnsupportedTypeError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "unsupported type: object={} field={} sql_type={}",
            self.object, self.field, self.sql_type
        )
    }
}

impl Error {
    /// Creates an unsupported type error for `object.field`.
    pub fn unsupported_type(
        object: impl Into<String>,
        field: impl Into<String>,
        sql_type: impl Into<String>,
    ) -> Error {
        Error::from(ErrorKind::UnsupportedType(UnsupportedTypeError {
            object: object.into().into(),
            field: field.into().into(),
            sql_type: sql_type.into().into(),
        }))
    }

    /// Returns `true` if this error is an unsupported type error.
    pub fn is_unsupported_type(&self) -> bool {
        self.chain()
            .any(|err| matches!(err.kind(), ErrorKind::UnsupportedType(_)))
    }
}
