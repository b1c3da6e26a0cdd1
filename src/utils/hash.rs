//! URL digest shared with the download cache.

use sha2::{Digest, Sha256};

/// Short hash identifying a download URL in the cache.
///
/// First 8 lowercase hex characters of the SHA-256 digest of the trimmed
/// URL string. The cache subsystem owns this definition; the registry only
/// reproduces it so hash indexes line up with cache entries.
///
/// # Examples
///
/// ```
/// use gmpm::utils::hash::url_hash;
///
/// let h = url_hash("https://example.com/mod.zip");
/// assert_eq!(h.len(), 8);
/// assert_eq!(h, url_hash("https://example.com/mod.zip  "));
/// ```
#[must_use]
pub fn url_hash(url: &str) -> String {
    let digest = Sha256::digest(url.trim().as_bytes());
    let hex = digest.iter().map(|b| format!("{b:02x}")).collect::<String>();
    hex[..8].to_string()
}
