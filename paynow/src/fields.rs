//! Field containers for outbound forms and inbound payloads.
//!
//! Paynow signs requests and responses by concatenating field values, but the
//! two directions disagree on ordering:
//!
//! - [`FieldSet`] holds an outbound request. It is keyed by name and always
//!   iterates in ascending byte-wise name order, which is both the order the
//!   form body is serialised in and the order the values are hashed in.
//! - [`WirePairs`] holds an inbound payload exactly as it appeared on the wire.
//!   Values stay percent-encoded and keep their textual order, because the
//!   gateway hashed them in that order. Tokens are byte slices, because the
//!   body is hashed as received whether or not it is valid UTF-8.

use std::collections::BTreeMap;
use std::collections::btree_map;

use url::form_urlencoded;

use crate::error::{DecodeError, InvalidEscape};
use crate::signature::{Signature, sign};

/// Name of the field carrying the signature on both requests and responses.
pub const HASH_FIELD: &str = "hash";

/// Returns `true` if `name` is the reserved signature field.
///
/// The gateway is inconsistent about casing, so the match ignores ASCII case.
#[must_use]
pub fn is_hash_field(name: impl AsRef<[u8]>) -> bool {
    name.as_ref().eq_ignore_ascii_case(HASH_FIELD.as_bytes())
}

/// An outbound set of named string fields.
///
/// Names are unique and case-sensitive. Iteration order is ascending by name.
///
/// # Example
///
/// ```rust
/// use paynow::fields::FieldSet;
///
/// let fields: FieldSet = [("reference", "INV-1"), ("amount", "10.00")]
///     .into_iter()
///     .collect();
/// assert_eq!(fields.to_form_body(), "amount=10.00&reference=INV-1");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet(BTreeMap<String, String>);

impl FieldSet {
    /// Creates an empty field set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Sets a field, returning the previous value if the name was present.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(name.into(), value.into())
    }

    /// Returns the value of a field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Removes a field, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(name)
    }

    /// Number of fields, the signature field included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the set holds no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(name, value)` pairs in ascending name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Values that feed the signature, in signing order.
    ///
    /// Every field except the signature field, sorted by name.
    pub fn signing_values(&self) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(|(name, _)| !is_hash_field(name))
            .map(|(_, value)| value)
    }

    /// Computes the signature of this set under `integration_key`.
    #[must_use]
    pub fn signature(&self, integration_key: &str) -> Signature {
        sign(self, integration_key)
    }

    /// Returns this set with a freshly computed `hash` field attached.
    ///
    /// Any existing signature field, whatever its casing, is replaced.
    #[must_use]
    pub fn signed(mut self, integration_key: &str) -> Self {
        self.0.retain(|name, _| !is_hash_field(name));
        let signature = sign(&self, integration_key);
        self.insert(HASH_FIELD, signature);
        self
    }

    /// Serialises the set as an `application/x-www-form-urlencoded` body.
    ///
    /// Pairs are emitted in ascending name order, the same order
    /// [`signing_values`](Self::signing_values) hashes them in.
    #[must_use]
    pub fn to_form_body(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for FieldSet {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.0
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

impl IntoIterator for FieldSet {
    type Item = (String, String);
    type IntoIter = btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// An inbound payload split into raw `(name, value)` tokens in wire order.
///
/// Borrowed from the response body; nothing is decoded until asked for.
/// Tokens without an `=` (including the empty token left by a trailing `&`)
/// are dropped. Only the first `=` separates name from value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WirePairs<'a> {
    pairs: Vec<(&'a [u8], &'a [u8])>,
}

impl<'a> WirePairs<'a> {
    /// Tokenises a raw `name=value&name=value` payload.
    #[must_use]
    pub fn parse<R: AsRef<[u8]> + ?Sized>(raw: &'a R) -> Self {
        let pairs = raw
            .as_ref()
            .split(|&b| b == b'&')
            .filter_map(|token| {
                let eq = token.iter().position(|&b| b == b'=')?;
                Some((&token[..eq], &token[eq + 1..]))
            })
            .collect();
        Self { pairs }
    }

    /// Iterates over raw `(name, value)` tokens in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a [u8], &'a [u8])> + '_ {
        self.pairs.iter().copied()
    }

    /// Number of well-formed pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns `true` if the payload held no well-formed pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Returns the raw, still-encoded value of the first field named `name`.
    #[must_use]
    pub fn raw(&self, name: &str) -> Option<&'a [u8]> {
        self.iter()
            .find(|(n, _)| *n == name.as_bytes())
            .map(|(_, v)| v)
    }

    /// Returns the received signature: the raw value of the last field whose
    /// name matches `hash` in any case.
    ///
    /// This is the value [`verify_pairs`](crate::signature::verify_pairs)
    /// compares against.
    #[must_use]
    pub fn signature(&self) -> Option<&'a [u8]> {
        self.iter()
            .filter(|(name, _)| is_hash_field(name))
            .last()
            .map(|(_, v)| v)
    }

    /// Returns the decoded value of the first field named `name`.
    ///
    /// Invalid UTF-8 after decoding is replaced, not rejected.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the value holds a malformed `%` escape.
    pub fn get(&self, name: &str) -> Result<Option<String>, DecodeError> {
        self.raw(name)
            .map(|value| {
                decode_component(value)
                    .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                    .map_err(|source| DecodeError::new(name, source))
            })
            .transpose()
    }
}

/// Decodes one form-encoded component to raw bytes.
///
/// `+` becomes a space and `%XX` becomes the byte `0xXX`. Unlike
/// [`form_urlencoded::parse`], a `%` that is not followed by two hex digits is
/// an error rather than passed through, so a corrupted payload cannot hash to
/// the same bytes as a clean one.
///
/// # Errors
///
/// Returns [`InvalidEscape`] carrying the offending escape sequence.
pub fn decode_component(value: impl AsRef<[u8]>) -> Result<Vec<u8>, InvalidEscape> {
    let bytes = value.as_ref();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hi = bytes.get(i + 1).copied().and_then(hex_value);
                let lo = bytes.get(i + 2).copied().and_then(hex_value);
                match (hi, lo) {
                    (Some(hi), Some(lo)) => out.push((hi << 4) | lo),
                    _ => {
                        let end = bytes.len().min(i + 3);
                        return Err(InvalidEscape(
                            String::from_utf8_lossy(&bytes[i..end]).into_owned(),
                        ));
                    }
                }
                i += 3;
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    Ok(out)
}

const fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_set_iterates_in_byte_order() {
        let fields: FieldSet = [("b", "2"), ("a", "1"), ("B", "3")].into_iter().collect();
        let names: Vec<&str> = fields.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["B", "a", "b"]);
    }

    #[test]
    fn signing_values_skip_hash_in_any_case() {
        let fields: FieldSet = [("id", "1"), ("HASH", "x"), ("hash", "y"), ("amount", "5.00")]
            .into_iter()
            .collect();
        let values: Vec<&str> = fields.signing_values().collect();
        assert_eq!(values, ["5.00", "1"]);
    }

    #[test]
    fn signed_replaces_existing_hash() {
        let fields: FieldSet = [("id", "1"), ("Hash", "stale")].into_iter().collect();
        let signed = fields.signed("key");
        assert_eq!(signed.len(), 2);
        assert!(signed.get("Hash").is_none());
        assert_eq!(signed.get("hash").map(str::len), Some(128));
    }

    #[test]
    fn remove_and_extend_edit_the_set() {
        let mut fields: FieldSet = [("id", "1"), ("status", "Message")].into_iter().collect();
        assert_eq!(fields.remove("status").as_deref(), Some("Message"));
        assert_eq!(fields.remove("status"), None);

        fields.extend([("amount", "5.00"), ("id", "2")]);
        let pairs: Vec<_> = fields.iter().collect();
        assert_eq!(pairs, [("amount", "5.00"), ("id", "2")]);
    }

    #[test]
    fn form_body_escapes_values() {
        let fields: FieldSet = [
            ("returnurl", "https://example.com/return?a=1&b=2"),
            ("authemail", "user@example.com"),
            ("reference", "INV 1"),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            fields.to_form_body(),
            "authemail=user%40example.com&reference=INV+1\
             &returnurl=https%3A%2F%2Fexample.com%2Freturn%3Fa%3D1%26b%3D2"
        );
    }

    #[test]
    fn wire_pairs_keep_order_and_skip_malformed_tokens() {
        let pairs = WirePairs::parse("z=1&junk&a=2&&b=x=y&");
        assert_eq!(pairs.len(), 3);
        let collected: Vec<_> = pairs.iter().collect();
        let expected: [(&[u8], &[u8]); 3] = [(b"z", b"1"), (b"a", b"2"), (b"b", b"x=y")];
        assert_eq!(collected, expected);
    }

    #[test]
    fn wire_pairs_empty_input() {
        assert!(WirePairs::parse("").is_empty());
    }

    #[test]
    fn wire_pairs_get_decodes_first_match() {
        let pairs = WirePairs::parse("msg=Payment+successful%21&msg=second");
        assert_eq!(
            pairs.get("msg").unwrap().as_deref(),
            Some("Payment successful!")
        );
        assert_eq!(pairs.raw("msg"), Some(&b"Payment+successful%21"[..]));
        assert_eq!(pairs.get("missing").unwrap(), None);
    }

    #[test]
    fn wire_pairs_keep_non_utf8_bytes() {
        let pairs = WirePairs::parse(b"reference=caf\xe9&status=Ok");
        assert_eq!(pairs.raw("reference"), Some(&b"caf\xe9"[..]));
        assert_eq!(pairs.get("reference").unwrap().as_deref(), Some("caf\u{fffd}"));
    }

    #[test]
    fn signature_is_last_hash_field_in_any_case() {
        let pairs = WirePairs::parse("hash=FIRST&status=Ok&Hash=LAST");
        assert_eq!(pairs.signature(), Some(&b"LAST"[..]));
        assert_eq!(pairs.raw("hash"), Some(&b"FIRST"[..]));
        assert_eq!(WirePairs::parse("status=Error").signature(), None);
    }

    #[test]
    fn wire_pairs_get_reports_field_on_bad_escape() {
        let pairs = WirePairs::parse("pollurl=https%3A%2F%2Fx%2");
        let err = pairs.get("pollurl").unwrap_err();
        assert_eq!(err.field, "pollurl");
        assert_eq!(err.source.0, "%2");
    }

    #[test]
    fn decode_component_handles_plus_and_escapes() {
        assert_eq!(decode_component("a+b%20c%2Bd").unwrap(), b"a b c+d");
        assert_eq!(decode_component("%e2%82%AC").unwrap(), "\u{20ac}".as_bytes());
        assert_eq!(decode_component("").unwrap(), b"");
    }

    #[test]
    fn decode_component_rejects_malformed_escapes() {
        assert_eq!(decode_component("%zz").unwrap_err().0, "%zz");
        assert_eq!(decode_component("100%").unwrap_err().0, "%");
        assert_eq!(decode_component("%4").unwrap_err().0, "%4");
    }

    #[test]
    fn decode_component_passes_non_ascii_bytes() {
        assert_eq!(decode_component("caf\u{e9}").unwrap(), "caf\u{e9}".as_bytes());
    }
}
