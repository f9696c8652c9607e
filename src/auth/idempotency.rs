//! Caller-supplied `Idempotency-Key` values for mutating calls.

// std
use std::ops::Deref;
// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::_prelude::*;

const IDEMPOTENCY_KEY_MAX_LEN: usize = 255;
const GENERATED_KEY_BYTES: usize = 16;

/// Error returned when idempotency key validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdempotencyKeyError {
	/// The key was empty.
	#[error("Idempotency key cannot be empty.")]
	Empty,
	/// The key contains characters outside visible ASCII.
	#[error("Idempotency key must contain only visible ASCII characters.")]
	NotVisibleAscii,
	/// The key exceeded the allowed character count.
	#[error("Idempotency key exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Client-generated key sent as the `Idempotency-Key` header.
///
/// The gateway forwards keys verbatim and never generates them on its own; callers create one
/// per logical operation (for example a rating submission) and reuse it across user retries.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdempotencyKey(String);
impl IdempotencyKey {
	/// Header name carrying the key.
	pub const HEADER: &'static str = "Idempotency-Key";

	/// Creates a key after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, IdempotencyKeyError> {
		let view = value.as_ref();

		validate_view(view)?;

		Ok(Self(view.to_owned()))
	}

	/// Generates a random URL-safe key.
	pub fn generate() -> Self {
		let bytes: [u8; GENERATED_KEY_BYTES] = rand::random();

		Self(URL_SAFE_NO_PAD.encode(bytes))
	}
}
impl Deref for IdempotencyKey {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for IdempotencyKey {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<IdempotencyKey> for String {
	fn from(value: IdempotencyKey) -> Self {
		value.0
	}
}
impl TryFrom<String> for IdempotencyKey {
	type Error = IdempotencyKeyError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_view(&value)?;

		Ok(Self(value))
	}
}
impl FromStr for IdempotencyKey {
	type Err = IdempotencyKeyError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl Debug for IdempotencyKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "IdempotencyKey({})", self.0)
	}
}
impl Display for IdempotencyKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

fn validate_view(view: &str) -> Result<(), IdempotencyKeyError> {
	if view.is_empty() {
		return Err(IdempotencyKeyError::Empty);
	}
	if !view.bytes().all(|b| b.is_ascii_graphic()) {
		return Err(IdempotencyKeyError::NotVisibleAscii);
	}
	if view.len() > IDEMPOTENCY_KEY_MAX_LEN {
		return Err(IdempotencyKeyError::TooLong { max: IDEMPOTENCY_KEY_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn keys_validate_header_safety() {
		assert_eq!(IdempotencyKey::new(""), Err(IdempotencyKeyError::Empty));
		assert_eq!(IdempotencyKey::new("rating 42"), Err(IdempotencyKeyError::NotVisibleAscii));
		assert_eq!(IdempotencyKey::new("caf\u{e9}"), Err(IdempotencyKeyError::NotVisibleAscii));
		assert!(matches!(
			IdempotencyKey::new("a".repeat(IDEMPOTENCY_KEY_MAX_LEN + 1)),
			Err(IdempotencyKeyError::TooLong { .. })
		));

		let key = IdempotencyKey::new("rating-42-3f9a").expect("Key fixture should be valid.");

		assert_eq!(key.as_ref(), "rating-42-3f9a");
	}

	#[test]
	fn generated_keys_are_unique_and_valid() {
		let first = IdempotencyKey::generate();
		let second = IdempotencyKey::generate();

		assert_ne!(first, second);
		assert_eq!(first.len(), 22);
		IdempotencyKey::new(first.as_ref()).expect("Generated keys should pass validation.");
	}

	#[test]
	fn serde_enforces_validation() {
		assert!(serde_json::from_str::<IdempotencyKey>("\"with space\"").is_err());

		let key: IdempotencyKey =
			serde_json::from_str("\"order-7\"").expect("Key should deserialize successfully.");

		assert_eq!(&*key, "order-7");
	}
}
