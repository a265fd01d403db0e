//! # Core Domain Entities
//!
//! The identities and ledger records every Ledger-Accord crate agrees on.
//!
//! ## Clusters
//!
//! - **Identity**: `PartyName`, `NetworkAddress`, `Party`
//! - **Ledger**: `LinearId`, `TypeTag`, `SharedStateRecord`, `RecordDigest`

use crate::errors::CodecError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Unique, human-readable name of a party (e.g. `"PartyA"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartyName(String);

impl PartyName {
    /// Create a party name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PartyName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Endpoint at which a party accepts protocol messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkAddress(String);

impl NetworkAddress {
    /// Create an address from its textual form.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// In-process address used by the in-memory network.
    pub fn in_memory(name: &PartyName) -> Self {
        Self(format!("mem://{}", name))
    }

    /// Borrow the address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NetworkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A participant identity. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Party {
    name: PartyName,
    address: NetworkAddress,
}

impl Party {
    /// Create a party.
    pub fn new(name: PartyName, address: NetworkAddress) -> Self {
        Self { name, address }
    }

    /// Create a party reachable on the in-memory network.
    pub fn in_memory(name: impl Into<String>) -> Self {
        let name = PartyName::new(name);
        let address = NetworkAddress::in_memory(&name);
        Self { name, address }
    }

    /// The party's unique name.
    pub fn name(&self) -> &PartyName {
        &self.name
    }

    /// The party's network address.
    pub fn address(&self) -> &NetworkAddress {
        &self.address
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.address)
    }
}

// =============================================================================
// CLUSTER B: LEDGER
// =============================================================================

/// Stable unique identifier of one logical shared record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinearId(Uuid);

impl LinearId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Whether this is the all-zero UUID, which is never issued.
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for LinearId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LinearId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for LinearId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Explicit type tag used to query stores by record type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeTag(String);

impl TypeTag {
    /// Tag given to records when no other type is requested.
    pub const SHARED_STATE_RECORD: &'static str = "SharedStateRecord";

    /// Create a tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The default `SharedStateRecord` tag.
    pub fn shared_state_record() -> Self {
        Self::new(Self::SHARED_STATE_RECORD)
    }

    /// Borrow the tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TypeTag {
    fn default() -> Self {
        Self::shared_state_record()
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// SHA-256 over the canonical bincode encoding of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordDigest(pub [u8; 32]);

impl fmt::Display for RecordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// The agreed ledger entry.
///
/// Once committed, every participant's store holds a bit-identical copy under
/// the same `linear_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedStateRecord {
    /// Stable identifier, generated by the initiator.
    pub linear_id: LinearId,
    /// Type tag for `query_by_type`.
    pub state_type: TypeTag,
    /// Opaque payload.
    pub payload: String,
    /// Ordered set of parties that must hold a copy. The initiator comes first.
    pub participants: Vec<PartyName>,
}

impl SharedStateRecord {
    /// Build a draft record with a freshly generated `linear_id`.
    pub fn draft(
        state_type: TypeTag,
        payload: impl Into<String>,
        participants: Vec<PartyName>,
    ) -> Self {
        Self {
            linear_id: LinearId::new(),
            state_type,
            payload: payload.into(),
            participants,
        }
    }

    /// Whether `party` must hold a copy of this record.
    pub fn has_participant(&self, party: &PartyName) -> bool {
        self.participants.iter().any(|p| p == party)
    }

    /// Participants other than `party`.
    pub fn counterparties<'a>(
        &'a self,
        party: &'a PartyName,
    ) -> impl Iterator<Item = &'a PartyName> + 'a {
        self.participants.iter().filter(move |p| *p != party)
    }

    /// Whether the participant list contains no duplicates.
    pub fn participants_unique(&self) -> bool {
        let mut seen = std::collections::HashSet::with_capacity(self.participants.len());
        self.participants.iter().all(|p| seen.insert(p))
    }

    /// Canonical bytes of this record.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, CodecError> {
        bincode::serialize(self).map_err(|e| CodecError::Encode(e.to_string()))
    }

    /// Content digest of this record.
    pub fn digest(&self) -> Result<RecordDigest, CodecError> {
        let bytes = self.canonical_bytes()?;
        Ok(RecordDigest(Sha256::digest(&bytes).into()))
    }
}
