//! Client-side hashing, identifier, and URL helpers.
//!
//! Password hashing here is a transport convenience only; the backend stores its own
//! salted hashes.

// crates.io
use constant_time_eq::constant_time_eq;
use rand::Rng;
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const BLOCKED_MARKERS: [&str; 4] = ["javascript:", "data:", "file:", "vbscript:"];

/// Lower-case hex SHA-256 digest of `password`.
pub fn hash_password(password: &str) -> String {
	let digest = Sha256::digest(password.as_bytes());

	digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

/// Checks `password` against a digest produced by [`hash_password`].
///
/// Digests are compared in constant time; hex case in `hash` is ignored.
pub fn verify_password(password: &str, hash: &str) -> bool {
	let expected = hash.to_ascii_lowercase();

	constant_time_eq(hash_password(password).as_bytes(), expected.as_bytes())
}

/// Generates `<prefix>_<time>_<random9>_<random7>` (prefix segment omitted when empty).
///
/// The time segment is the current Unix time in milliseconds, base-36 encoded.
pub fn generate_secure_id(prefix: &str) -> String {
	let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
	let timestamp = to_base36(u128::try_from(millis).unwrap_or_default());
	let mut rng = rand::rng();
	let random_part = random_base36(&mut rng, 9);
	let extra_random = random_base36(&mut rng, 7);

	if prefix.is_empty() {
		format!("{timestamp}_{random_part}_{extra_random}")
	} else {
		format!("{prefix}_{timestamp}_{random_part}_{extra_random}")
	}
}

/// Accepts only non-empty `http`/`https` URLs free of script or data markers.
pub fn validate_image_url(url: &str) -> bool {
	let trimmed = url.trim();

	if trimmed.is_empty() {
		return false;
	}

	let Ok(parsed) = Url::parse(trimmed) else { return false };

	if !matches!(parsed.scheme(), "http" | "https") {
		return false;
	}

	let lowered = trimmed.to_ascii_lowercase();

	!BLOCKED_MARKERS.iter().any(|marker| lowered.contains(marker))
}

fn to_base36(mut value: u128) -> String {
	if value == 0 {
		return "0".into();
	}

	let mut digits = Vec::new();

	while value > 0 {
		digits.push(BASE36[(value % 36) as usize]);
		value /= 36;
	}

	digits.reverse();

	String::from_utf8_lossy(&digits).into_owned()
}

fn random_base36(rng: &mut impl Rng, len: usize) -> String {
	(0..len).map(|_| BASE36[rng.random_range(0..BASE36.len())] as char).collect()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn password_hash_is_stable_hex() {
		let hash = hash_password("hunter22");

		assert_eq!(hash.len(), 64);
		assert_eq!(
			hash_password(""),
			"e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
		);
		assert!(verify_password("hunter22", &hash));
		assert!(verify_password("hunter22", &hash.to_ascii_uppercase()));
		assert!(!verify_password("hunter23", &hash));
		assert!(!verify_password("hunter22", &hash[..63]));
		assert!(!verify_password("hunter22", ""));
	}

	#[test]
	fn secure_ids_have_expected_shape() {
		let id = generate_secure_id("evt");
		let segments: Vec<_> = id.split('_').collect();

		assert_eq!(segments.len(), 4);
		assert_eq!(segments[0], "evt");
		assert_eq!(segments[2].len(), 9);
		assert_eq!(segments[3].len(), 7);
		assert!(id.chars().all(|c| c == '_' || c.is_ascii_digit() || c.is_ascii_lowercase()));

		let bare = generate_secure_id("");

		assert_eq!(bare.split('_').count(), 3);
		assert_ne!(generate_secure_id("evt"), id);
	}

	#[test]
	fn base36_encoding() {
		assert_eq!(to_base36(0), "0");
		assert_eq!(to_base36(35), "z");
		assert_eq!(to_base36(36), "10");
	}

	#[test]
	fn image_urls_are_screened() {
		assert!(validate_image_url("https://cdn.example.com/covers/1.png"));
		assert!(validate_image_url("http://10.0.0.2:5000/uploads/a.jpg"));
		assert!(!validate_image_url(""));
		assert!(!validate_image_url("ftp://example.com/a.png"));
		assert!(!validate_image_url("javascript:alert(1)"));
		assert!(!validate_image_url("https://example.com/?next=javascript:alert(1)"));
		assert!(!validate_image_url("not a url"));
	}
}
