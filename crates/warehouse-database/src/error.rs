//! Translation of sqlx failures into the application error taxonomy.

use warehouse_core::{AppError, ErrorKind};

/// Unique constraint guarding item SKUs.
pub const ITEM_SKU_CONSTRAINT: &str = "items_sku_key";

/// SQLSTATE codes worth another attempt: serialization failure, deadlock,
/// and the connection-exception class.
const TRANSIENT_SQLSTATES: &[&str] = &["40001", "40P01", "08000", "08003", "08006", "57P01"];

enum Class {
    Missing,
    DuplicateSku,
    Duplicate,
    Other,
}

/// Map a storage error to an [`AppError`], keeping the cause for logs.
///
/// Absence becomes `NotFound`, a SKU collision becomes `DuplicateSku`,
/// any other unique violation becomes `AlreadyExists`. Everything else is
/// `Internal` with the operation name attached.
pub fn translate(operation: &str, err: sqlx::Error) -> AppError {
    let class = match &err {
        sqlx::Error::RowNotFound => Class::Missing,
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            if db.constraint() == Some(ITEM_SKU_CONSTRAINT) {
                Class::DuplicateSku
            } else {
                Class::Duplicate
            }
        }
        _ => Class::Other,
    };

    match class {
        Class::Missing => AppError::not_found(format!("{operation}: no matching row")),
        Class::DuplicateSku => AppError::with_source(
            ErrorKind::DuplicateSku,
            "Item with this SKU already exists",
            err,
        ),
        Class::Duplicate => {
            AppError::with_source(ErrorKind::AlreadyExists, format!("{operation}: already exists"), err)
        }
        Class::Other => {
            AppError::with_source(ErrorKind::Internal, format!("{operation} failed: {err}"), err)
        }
    }
}

/// Whether retrying the whole operation might succeed.
pub fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Database(db) => db
            .code()
            .is_some_and(|code| TRANSIENT_SQLSTATES.contains(&&*code)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err = translate("ItemStore.get", sqlx::Error::RowNotFound);
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[test]
    fn test_other_errors_are_internal_with_context() {
        let err = translate("ItemStore.list", sqlx::Error::PoolClosed);
        assert_eq!(err.kind, ErrorKind::Internal);
        assert!(err.message.starts_with("ItemStore.list"));
        assert!(err.source.is_some());
    }

    #[test]
    fn test_transient_classification() {
        assert!(is_transient(&sqlx::Error::PoolTimedOut));
        assert!(is_transient(&sqlx::Error::Io(std::io::Error::other("reset"))));
        assert!(!is_transient(&sqlx::Error::RowNotFound));
        assert!(!is_transient(&sqlx::Error::PoolClosed));
    }
}
