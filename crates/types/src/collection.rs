//! Collections, inventory items, and money.

use crate::{ChainModel, CollectionId, ItemId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An amount of chain-native currency in base units (sats / lamports).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Amount(pub u64);

impl Amount {
    /// Zero amount.
    pub const ZERO: Self = Amount(0);

    /// Raw base units.
    pub fn base_units(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to pre-generated content for one inventory item.
///
/// The image/metadata pipeline is an external collaborator; by the time an
/// item is mintable its content already exists at this reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRef {
    /// Where the content bytes live.
    pub uri: String,
    /// Mime type forwarded to the content encoder.
    pub mime_type: String,
}

impl ContentRef {
    /// Create a content reference.
    pub fn new(uri: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            mime_type: mime_type.into(),
        }
    }
}

/// Identifier assigned by the content encoder once a reveal is constructed
/// (inscription id on the commit/reveal chain).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(pub String);

impl ContentId {
    /// Create a content id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A limited-supply drop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// Identifier.
    pub id: CollectionId,
    /// Display name.
    pub name: String,
    /// Which transaction model mints against this collection.
    pub model: ChainModel,
    /// Creation time.
    pub created_at: Timestamp,
}

/// One unique mintable unit within a collection.
///
/// `minted` transitions false to true exactly once, at mint completion, and
/// never reverses. Failure rollback releases the reservation instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Identifier; carries the collection and sequence number.
    pub id: ItemId,
    /// Pre-generated content for this item.
    pub content: ContentRef,
    /// Whether this item has been fulfilled by a finalized mint.
    pub minted: bool,
}

impl InventoryItem {
    /// Create an unminted item.
    pub fn new(id: ItemId, content: ContentRef) -> Self {
        Self {
            id,
            content,
            minted: false,
        }
    }

    /// Sequence number within the collection.
    pub fn sequence(&self) -> u32 {
        self.id.sequence
    }
}
