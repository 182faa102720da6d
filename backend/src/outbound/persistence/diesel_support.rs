//! Shared Diesel error mapping for the repository adapters.

use tracing::debug;

use super::models::RowConversionError;
use super::pool::PoolError;

/// Map pool errors into a repository-specific connection error
/// constructor.
pub(crate) fn map_basic_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Map common Diesel error variants into query/connection constructors.
///
/// Captures the repeated mapping used by repositories where `NotFound`
/// and query-builder failures should map to query errors. Unique
/// violations are the caller's business; check for them before
/// delegating here.
pub(crate) fn map_basic_diesel_error<E, Q, C>(
    error: diesel::result::Error,
    query: Q,
    connection: C,
) -> E
where
    Q: Fn(&'static str) -> E,
    C: Fn(&'static str) -> E,
{
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => query("record not found"),
        DieselError::QueryBuilderError(_) => query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection error")
        }
        DieselError::DatabaseError(_, _) => query("database error"),
        _ => query("database error"),
    }
}

/// Whether the error is a unique-constraint violation.
pub(crate) fn is_unique_violation(error: &diesel::result::Error) -> bool {
    matches!(
        error,
        diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _
        )
    )
}

/// Smuggle a row-conversion failure out of a transaction closure, whose
/// error type is fixed to `diesel::result::Error`.
pub(crate) fn deserialization_error(error: RowConversionError) -> diesel::result::Error {
    diesel::result::Error::DeserializationError(Box::new(error))
}

/// Escape LIKE/ILIKE metacharacters in a user-supplied fragment.
pub(crate) fn escape_like(fragment: &str) -> String {
    fragment
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Wrap a fragment for a contains-style ILIKE match.
pub(crate) fn contains_pattern(fragment: &str) -> String {
    format!("%{}%", escape_like(fragment))
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("plain", "%plain%")]
    #[case("50%", "%50\\%%")]
    #[case("a_b", "%a\\_b%")]
    #[case("back\\slash", "%back\\\\slash%")]
    fn ilike_patterns_are_escaped(#[case] fragment: &str, #[case] expected: &str) {
        assert_eq!(contains_pattern(fragment), expected);
    }

    #[rstest]
    fn not_found_maps_to_query() {
        let mapped: String = map_basic_diesel_error(
            diesel::result::Error::NotFound,
            |m| format!("query:{m}"),
            |m| format!("connection:{m}"),
        );
        assert_eq!(mapped, "query:record not found");
    }

    #[rstest]
    fn pool_errors_map_to_connection() {
        let mapped: String =
            map_basic_pool_error(PoolError::checkout("refused"), |m| format!("connection:{m}"));
        assert_eq!(mapped, "connection:refused");
    }
}
