//! Cross-cutting helpers: path canonicalization and digest derivation.
//!
//! Everything inside the registry is keyed by game-root-relative,
//! forward-slash paths; conversion to and from the host representation
//! happens only at the boundary, in [`paths`]. [`hash`] carries the URL
//! digest shared with the download cache.

pub mod hash;
pub mod paths;
