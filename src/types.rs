// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Bookstore Management Simulation - Type Definitions

use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Globally unique, stable entity identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifier convention for the inventory item holding `book`.
pub fn inventory_id_for(book: &EntityId) -> EntityId {
    EntityId(format!("inv_{}", book.0))
}

/// Identifier convention for the n-th committed order.
pub fn order_id(seq: u64) -> EntityId {
    EntityId(format!("order_{}", seq))
}

// ─── Entity Kinds ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Store,
    Book,
    InventoryItem,
    Customer,
    Employee,
    Order,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        Self::Store,
        Self::Book,
        Self::InventoryItem,
        Self::Customer,
        Self::Employee,
        Self::Order,
    ];
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Store => "Store",
            Self::Book => "Book",
            Self::InventoryItem => "InventoryItem",
            Self::Customer => "Customer",
            Self::Employee => "Employee",
            Self::Order => "Order",
        };
        f.write_str(name)
    }
}

// ─── Cardinality ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    /// At most one value per subject.
    Functional,
    /// Any number of values per subject, deduplicated by identity.
    Multi,
}

// ─── Relations ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    /// InventoryItem -> Book. Also inverse-functional: one holder per book.
    Holds,
    PurchasedBook,
    PlacedBy,
    HandledBy,
    WorksAt,
    Restocks,
    /// Customer -> Book, derived from orders by the provenance rule.
    Purchases,
}

impl RelationKind {
    pub fn cardinality(&self) -> Cardinality {
        match self {
            Self::Holds | Self::PurchasedBook | Self::PlacedBy => Cardinality::Functional,
            Self::HandledBy | Self::WorksAt | Self::Restocks | Self::Purchases => {
                Cardinality::Multi
            }
        }
    }

    pub fn domain(&self) -> EntityKind {
        match self {
            Self::Holds => EntityKind::InventoryItem,
            Self::PurchasedBook | Self::PlacedBy | Self::HandledBy => EntityKind::Order,
            Self::WorksAt | Self::Restocks => EntityKind::Employee,
            Self::Purchases => EntityKind::Customer,
        }
    }

    pub fn range(&self) -> EntityKind {
        match self {
            Self::Holds | Self::PurchasedBook | Self::Purchases => EntityKind::Book,
            Self::PlacedBy => EntityKind::Customer,
            Self::HandledBy => EntityKind::Employee,
            Self::WorksAt => EntityKind::Store,
            Self::Restocks => EntityKind::InventoryItem,
        }
    }

    /// Only the rule engine writes derived relations.
    pub fn is_derived(&self) -> bool {
        matches!(self, Self::Purchases)
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Holds => "holds",
            Self::PurchasedBook => "purchasedBook",
            Self::PlacedBy => "placedBy",
            Self::HandledBy => "handledBy",
            Self::WorksAt => "worksAt",
            Self::Restocks => "restocks",
            Self::Purchases => "purchases",
        };
        f.write_str(name)
    }
}

// ─── Attributes ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AttributeKind {
    Author,
    Genre,
    Price,
    AvailableQuantity,
    RestockThreshold,
    OrderTotal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    Text,
    Float,
    Integer,
}

impl AttributeKind {
    pub fn cardinality(&self) -> Cardinality {
        match self {
            Self::Genre => Cardinality::Multi,
            _ => Cardinality::Functional,
        }
    }

    pub fn domain(&self) -> EntityKind {
        match self {
            Self::Author | Self::Genre | Self::Price => EntityKind::Book,
            Self::AvailableQuantity | Self::RestockThreshold => EntityKind::InventoryItem,
            Self::OrderTotal => EntityKind::Order,
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Author | Self::Genre => ValueType::Text,
            Self::Price | Self::OrderTotal => ValueType::Float,
            Self::AvailableQuantity | Self::RestockThreshold => ValueType::Integer,
        }
    }

    /// Functional attributes that may be overwritten after creation.
    pub fn is_mutable(&self) -> bool {
        matches!(self, Self::AvailableQuantity)
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Author => "hasAuthor",
            Self::Genre => "hasGenre",
            Self::Price => "hasPrice",
            Self::AvailableQuantity => "availableQuantity",
            Self::RestockThreshold => "restockThreshold",
            Self::OrderTotal => "orderTotal",
        };
        f.write_str(name)
    }
}

/// Scalar attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Text(_) => ValueType::Text,
            Self::Float(_) => ValueType::Float,
            Self::Integer(_) => ValueType::Integer,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }
}

// ─── Entity Views ────────────────────────────────────────────────────────────

/// Read-side view of a Book assembled from the attribute tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookView {
    pub id: EntityId,
    pub author: String,
    pub genres: Vec<String>,
    pub price: f64,
}

/// Read-side view of a committed Order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderView {
    pub id: EntityId,
    pub purchased_book: EntityId,
    pub placed_by: EntityId,
    pub handled_by: Vec<EntityId>,
    pub total: f64,
}
