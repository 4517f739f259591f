use dbexport_core::{err, Result};

/// Opens a transaction that sees one consistent state and cannot write.
pub(crate) const BEGIN_READ: &str = "BEGIN ISOLATION LEVEL REPEATABLE READ READ ONLY";

pub(crate) const COMMIT: &str = "COMMIT";

pub(crate) const ROLLBACK: &str = "ROLLBACK";

/// Returns the statements that open a read-only transaction importing the
/// exported snapshot `token`.
pub(crate) fn begin_at(token: &str) -> Result<String> {
    // The id is interpolated into SQL: only accept what
    // `pg_export_snapshot()` produces.
    let valid = !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_hexdigit() || c == '-');

    if !valid {
        return Err(err!("invalid snapshot id `{token}`"));
    }

    Ok(format!("{BEGIN_READ}; SET TRANSACTION SNAPSHOT '{token}'"))
}
