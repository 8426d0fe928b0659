//! Request signing and response verification.
//!
//! Paynow authenticates both directions with the same construction: the
//! upper-case hex SHA-512 digest of every field value (signature field
//! excluded) followed by the integration key. Only the value order differs.
//!
//! - [`sign`] hashes a [`FieldSet`] in ascending name order, the order the
//!   form body is sent in.
//! - [`verify`] hashes a raw response in the order its fields appear on the
//!   wire, the order the gateway hashed them in.
//!
//! Do not unify the two orderings; the gateway recomputes each side
//! independently and will disagree.

use std::fmt;

use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;

use crate::error::{DecodeError, VerifyError};
use crate::fields::{FieldSet, WirePairs, decode_component, is_hash_field};

/// An upper-case hex SHA-512 digest: 128 characters from `0-9A-F`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Signature(String);

impl Signature {
    /// Length of a signature in characters.
    pub const LEN: usize = 128;

    fn from_hasher(hasher: Sha512) -> Self {
        Self(hex::encode_upper(hasher.finalize()))
    }

    /// Returns the signature text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compares against a received signature in constant time.
    ///
    /// Inputs of different length compare unequal, so a missing signature
    /// (the empty string) never matches.
    #[must_use]
    pub fn matches(&self, received: impl AsRef<[u8]>) -> bool {
        self.0.as_bytes().ct_eq(received.as_ref()).into()
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Signature").field(&self.0).finish()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Signature {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Signature> for String {
    fn from(signature: Signature) -> Self {
        signature.0
    }
}

impl PartialEq<str> for Signature {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Signature {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Signs an outbound field set.
///
/// Values are concatenated unescaped, in ascending byte-wise name order, with
/// the signature field skipped and `integration_key` appended. An empty key is
/// accepted and simply contributes nothing.
///
/// # Example
///
/// ```rust
/// use paynow::fields::FieldSet;
/// use paynow::signature::sign;
///
/// let fields: FieldSet = [("b", "2"), ("a", "1")].into_iter().collect();
/// let signature = sign(&fields, "key");
/// assert_eq!(signature.as_str().len(), 128);
/// ```
#[must_use]
pub fn sign(fields: &FieldSet, integration_key: &str) -> Signature {
    let mut hasher = Sha512::new();
    for value in fields.signing_values() {
        hasher.update(value.as_bytes());
    }
    hasher.update(integration_key.as_bytes());
    Signature::from_hasher(hasher)
}

/// Verifies the signature embedded in a raw response body.
///
/// `raw` must be the body exactly as received, byte for byte. Re-serialising
/// a parsed map, or re-decoding the body as text, can reorder or alter fields
/// and break verification.
///
/// # Errors
///
/// - [`VerifyError::Decode`] if a non-signature value has a malformed escape.
/// - [`VerifyError::Mismatch`] if the embedded signature is absent or wrong.
pub fn verify(raw: impl AsRef<[u8]>, integration_key: &str) -> Result<(), VerifyError> {
    verify_pairs(&WirePairs::parse(raw.as_ref()), integration_key)
}

/// Verifies an already tokenised payload. See [`verify`].
///
/// The signature field's value is taken verbatim; if it occurs more than once
/// the last occurrence is used (see [`WirePairs::signature`]).
///
/// # Errors
///
/// Same as [`verify`].
pub fn verify_pairs(pairs: &WirePairs<'_>, integration_key: &str) -> Result<(), VerifyError> {
    let mut hasher = Sha512::new();
    for (name, value) in pairs.iter().filter(|(name, _)| !is_hash_field(name)) {
        let decoded = decode_component(value)
            .map_err(|source| DecodeError::new(String::from_utf8_lossy(name), source))?;
        hasher.update(&decoded);
    }
    hasher.update(integration_key.as_bytes());

    let received = pairs.signature().unwrap_or_default();
    let expected = Signature::from_hasher(hasher);
    if expected.matches(received) {
        Ok(())
    } else {
        Err(VerifyError::Mismatch {
            received: String::from_utf8_lossy(received).into_owned(),
            expected: expected.into(),
        })
    }
}
