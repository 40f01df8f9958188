//! Participant addresses and proposal identifiers.

use crate::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A participant address (wallet public key or account string).
///
/// The engine treats addresses as opaque identifiers: it only requires that they are
/// non-empty, contain no whitespace and fit in [`Address::MAX_LEN`] bytes.
///
/// Decoding goes through [`Address::parse`], so malformed input is rejected there too.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct Address(String);

impl Address {
    /// Longest address accepted by [`Address::parse`].
    pub const MAX_LEN: usize = 128;

    /// Create an address from a raw string.
    ///
    /// # Panics
    /// Panics if the string is not a well-formed address. Use [`Address::parse`]
    /// for untrusted input.
    pub fn new(raw: impl Into<String>) -> Self {
        let s = raw.into();
        assert!(Self::well_formed(&s), "malformed address: {s:?}");
        Self(s)
    }

    /// Validate and wrap an untrusted address string.
    pub fn parse(raw: impl Into<String>) -> Result<Self, TypesError> {
        let s = raw.into();
        if Self::well_formed(&s) {
            Ok(Self(s))
        } else {
            Err(TypesError::InvalidAddress(s))
        }
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn well_formed(s: &str) -> bool {
        !s.is_empty() && s.len() <= Self::MAX_LEN && !s.chars().any(char::is_whitespace)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Address {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl std::str::FromStr for Address {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Identifier of a governance proposal.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProposalId(String);

impl ProposalId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProposalId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_plain_addresses() {
        let addr = Address::parse("7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU").unwrap();
        assert_eq!(addr.as_str().len(), 44);
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(Address::parse("").is_err());
        assert!(Address::parse("has space").is_err());
        assert!(Address::parse("x".repeat(Address::MAX_LEN + 1)).is_err());
    }

    #[test]
    #[should_panic(expected = "malformed address")]
    fn new_panics_on_empty() {
        let _ = Address::new("");
    }

    #[test]
    fn decoding_validates() {
        let good = bincode::serialize(&"alice".to_string()).unwrap();
        assert_eq!(bincode::deserialize::<Address>(&good).unwrap(), Address::new("alice"));
        let bad = bincode::serialize(&"has space".to_string()).unwrap();
        assert!(bincode::deserialize::<Address>(&bad).is_err());
        let empty = bincode::serialize(&String::new()).unwrap();
        assert!(bincode::deserialize::<Address>(&empty).is_err());
    }

    #[test]
    fn addresses_order_lexicographically() {
        assert!(Address::new("alice") < Address::new("bob"));
    }
}
