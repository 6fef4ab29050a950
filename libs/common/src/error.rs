//! Error types shared by the Rollbook services
//!
//! The storage plumbing lives in this crate, so its error taxonomy does
//! too. These cover bringing the database up; once a pool exists, query
//! failures belong to the service that issued them.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Failures raised while setting up the database layer
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Settings were present but unusable
    #[error("invalid database configuration: {0}")]
    Configuration(String),

    /// The connection pool could not be established
    #[error("failed to connect to the database: {0}")]
    Connection(#[source] SqlxError),

    /// The bootstrap DDL could not be applied
    #[error("failed to apply database schema: {0}")]
    Schema(String),
}

/// Shorthand for results carrying a [`DatabaseError`]
pub type DatabaseResult<T> = Result<T, DatabaseError>;
