//! GMPM - Game Mod Package Manager, registry core
//!
//! The registry is the authoritative in-memory database behind a package
//! manager for a heavily-modded game. It tracks, at the same time:
//!
//! - every version of every mod *available* from remote repositories,
//! - every mod *installed* on the local game together with the files it
//!   owns, and
//! - the *auto-detected* artifacts on disk: loose plugin binaries and
//!   first-party DLC.
//!
//! On top of that it answers the questions a dependency solver asks:
//! "latest version of X compatible with game 1.12?", "who provides the
//! virtual package Z?", "which mod owns this file?", "what breaks if I
//! remove M?". Mutations run under an ambient transaction that can roll
//! every in-memory change back.
//!
//! # Architecture Overview
//!
//! The crate follows a leaves-first layering:
//!
//! - [`version`] - Mod and game version primitives, relationship constraints
//! - [`models`] - Module metadata, download hashes, repository descriptors
//! - [`registry`] - The aggregate: available/installed catalogs, file
//!   ownership, providers index, compatibility partition, persistence
//! - [`resolver`] - Dependency sanity checking and lazy reverse-dependency
//!   closures
//! - [`transaction`] - Ambient transaction scopes with snapshot/rollback
//! - [`core`] - The error taxonomy every fallible operation shares
//! - [`utils`] - Path canonicalization at the game-root boundary, URL digest
//!
//! External collaborators (repository fetching, on-disk install/removal,
//! the solver itself, and any CLI) live outside this crate and drive it
//! through [`registry::Registry`].
//!
//! # Example
//!
//! ```
//! use gmpm::models::ModuleMetadata;
//! use gmpm::registry::Registry;
//! use gmpm::version::game::{GameVersion, GameVersionCriteria};
//! use gmpm::version::ModuleVersion;
//!
//! # fn main() -> gmpm::core::Result<()> {
//! let mut registry = Registry::empty();
//! let mut module = ModuleMetadata::new("better-antennas", ModuleVersion::parse("2.1"));
//! module.min_game_version = Some("1.10".parse().unwrap());
//! registry.add_available(module)?;
//!
//! let criteria = GameVersionCriteria::from("1.12".parse::<GameVersion>().unwrap());
//! let latest = registry.latest_available("better-antennas", Some(&criteria), None)?;
//! assert_eq!(latest.unwrap().version, ModuleVersion::parse("2.1"));
//! # Ok(())
//! # }
//! ```
//!
//! # Concurrency model
//!
//! Single-threaded cooperative: one logical writer, no internal locks, no
//! suspension points. Transactions are thread-local scope guards; see
//! [`transaction`] for the settlement contract.

pub mod core;
pub mod models;
pub mod registry;
pub mod resolver;
pub mod transaction;
pub mod utils;
pub mod version;
