//! Shared `sqlx` error mapping for the MySQL repositories.

use sqlx::mysql::MySqlDatabaseError;
use tracing::debug;

/// MySQL vendor code for `ER_BAD_DB_ERROR` (unknown database).
pub(crate) const ER_BAD_DB_ERROR: u16 = 1049;

/// Vendor error code reported by the server, if any.
pub(crate) fn vendor_code(error: &sqlx::Error) -> Option<u16> {
    match error {
        sqlx::Error::Database(db) => db
            .try_downcast_ref::<MySqlDatabaseError>()
            .map(MySqlDatabaseError::number),
        _ => None,
    }
}

/// SQLSTATE reported by the server, if any.
pub(crate) fn sql_state(error: &sqlx::Error) -> Option<String> {
    match error {
        sqlx::Error::Database(db) => db.code().map(|code| code.into_owned()),
        _ => None,
    }
}

/// Render an error with its vendor code and SQLSTATE when available.
pub(crate) fn describe(error: &sqlx::Error) -> String {
    match (vendor_code(error), sql_state(error)) {
        (Some(code), Some(state)) => format!("[{code}/{state}] {error}"),
        (Some(code), None) => format!("[{code}] {error}"),
        _ => error.to_string(),
    }
}

/// Whether the failure concerns the connection rather than the statement.
pub(crate) fn is_connection_error(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
    )
}

/// Map a driver error into query/connection constructors.
///
/// Connection-class failures go to `connection`; everything else, including
/// constraint violations and decode errors, goes to `query`.
pub(crate) fn map_sqlx_error<E, Q, C>(error: sqlx::Error, query: Q, connection: C) -> E
where
    Q: FnOnce(String) -> E,
    C: FnOnce(String) -> E,
{
    let message = describe(&error);
    debug!(
        vendor_code = vendor_code(&error),
        sql_state = sql_state(&error).as_deref(),
        %message,
        "mysql operation failed"
    );

    if is_connection_error(&error) {
        connection(message)
    } else {
        query(message)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    enum Mapped {
        Query(String),
        Connection(String),
    }

    fn map(error: sqlx::Error) -> Mapped {
        map_sqlx_error(error, Mapped::Query, Mapped::Connection)
    }

    #[rstest]
    #[case(sqlx::Error::PoolTimedOut)]
    #[case(sqlx::Error::PoolClosed)]
    #[case(sqlx::Error::WorkerCrashed)]
    #[case(sqlx::Error::Protocol("unexpected packet".to_owned()))]
    #[case(sqlx::Error::Io(std::io::Error::from(std::io::ErrorKind::ConnectionReset)))]
    fn connection_failures_map_to_connection(#[case] error: sqlx::Error) {
        assert!(matches!(map(error), Mapped::Connection(_)));
    }

    #[rstest]
    #[case(sqlx::Error::RowNotFound)]
    #[case(sqlx::Error::ColumnNotFound("order_id".to_owned()))]
    fn statement_failures_map_to_query(#[case] error: sqlx::Error) {
        assert!(matches!(map(error), Mapped::Query(_)));
    }

    #[rstest]
    fn non_database_errors_have_no_codes() {
        let error = sqlx::Error::RowNotFound;

        assert_eq!(vendor_code(&error), None);
        assert_eq!(sql_state(&error), None);
        assert_eq!(describe(&error), error.to_string());
    }
}
