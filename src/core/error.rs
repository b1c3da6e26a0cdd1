//! Error handling for the GMPM registry core
//!
//! The registry raises strongly-typed errors so that callers (the solver, the
//! installer, the CLI) can react precisely: a missing identifier is routine
//! during resolution, while a file-ownership collision must abort an install
//! with the full conflict list intact.
//!
//! # Error Categories
//!
//! - **Catalog lookups**: [`RegistryError::NotFound`], [`RegistryError::VersionNotFound`]
//! - **Ownership invariants**: [`RegistryError::Inconsistent`] carries one
//!   human-readable message per conflicting file
//! - **Path discipline**: [`RegistryError::PathError`]; the registry keys
//!   everything by game-root-relative paths, so absolute input is a caller bug
//! - **Transactions**: [`RegistryError::NestedTransaction`]
//! - **Schema upgrades**: [`RegistryError::Internal`]
//!
//! Validation always runs before mutation: an operation that returns an error
//! has not changed the registry. Within a transaction, surfacing an error does
//! *not* roll back on its own; aborting is the caller's decision via
//! [`crate::transaction::Transaction::rollback`].

use thiserror::Error;

/// Convenience alias used by every fallible registry operation.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// The error type for registry operations.
///
/// Each variant represents one failure mode of the public surface and carries
/// the context a caller needs to render a useful message or recover.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// No available module with this identifier exists in the catalog.
    #[error("module '{identifier}' not found in the available catalog")]
    NotFound {
        /// The identifier that was looked up
        identifier: String,
    },

    /// The identifier exists, but the requested version does not.
    #[error("module '{identifier}' has no version '{version}'")]
    VersionNotFound {
        /// The identifier that was looked up
        identifier: String,
        /// The version that was requested
        version: String,
    },

    /// A mutation would violate the file-ownership invariant, or files that
    /// should be gone are still present on disk.
    ///
    /// The full conflict list is built before anything is mutated, so the
    /// registry is unchanged when this surfaces.
    #[error("inconsistent registry state:\n{}", conflicts.join("\n"))]
    Inconsistent {
        /// One message per offending file, naming both parties
        conflicts: Vec<String>,
    },

    /// An absolute path was supplied where a game-root-relative path is
    /// required, or a path could not be expressed relative to the game root.
    #[error("expected a path relative to the game root, got '{path}'")]
    PathError {
        /// The offending path as supplied by the caller
        path: String,
    },

    /// A mutating operation ran while the registry was still enlisted in a
    /// different live transaction.
    #[error("registry is already enlisted in another transaction; nested transactions are not supported")]
    NestedTransaction,

    /// The registry could not uphold an internal contract, e.g. a schema
    /// upgrade that needs a game root was attempted without one.
    #[error("internal registry error: {message}")]
    Internal {
        /// Description of the violated contract
        message: String,
    },
}

impl RegistryError {
    /// Shorthand for [`RegistryError::NotFound`].
    #[must_use]
    pub fn not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            identifier: identifier.into(),
        }
    }

    /// Shorthand for [`RegistryError::Internal`].
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
