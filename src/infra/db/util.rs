use crate::application::repos::RepoError;

/// Translate driver errors into the repository error taxonomy.
pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match &err {
        sqlx::Error::RowNotFound => RepoError::NotFound,
        sqlx::Error::PoolTimedOut => RepoError::Timeout,
        sqlx::Error::Database(db_err) => {
            if db_err.is_unique_violation() {
                RepoError::Duplicate {
                    constraint: db_err
                        .constraint()
                        .unwrap_or("unknown")
                        .to_string(),
                }
            } else if db_err.is_foreign_key_violation() {
                RepoError::Integrity {
                    message: db_err.to_string(),
                }
            } else {
                RepoError::from_persistence(&err)
            }
        }
        _ => RepoError::from_persistence(&err),
    }
}
