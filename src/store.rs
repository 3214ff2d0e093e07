// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Bookstore Management Simulation - Fact Store
//
// Typed entity/relation/attribute tables with cardinality enforced at write
// time. All writes are synchronous and visible to the next read.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::types::*;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// What a failed lookup was looking for.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Entity { kind: Option<EntityKind>, id: EntityId },
    Relation { relation: RelationKind, subject: EntityId },
    Attribute { attribute: AttributeKind, subject: EntityId },
    HolderOf { book: EntityId },
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity { kind: Some(kind), id } => write!(f, "{} `{}`", kind, id),
            Self::Entity { kind: None, id } => write!(f, "entity `{}`", id),
            Self::Relation { relation, subject } => write!(f, "`{}` of `{}`", relation, subject),
            Self::Attribute { attribute, subject } => {
                write!(f, "`{}` of `{}`", attribute, subject)
            }
            Self::HolderOf { book } => write!(f, "inventory item holding `{}`", book),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(Lookup),

    #[error("cardinality violation: `{property}` of `{subject}` already holds a value")]
    CardinalityViolation { property: String, subject: EntityId },

    #[error("entity `{0}` already exists")]
    DuplicateEntity(EntityId),

    #[error("`{id}` is a {actual}, expected {expected}")]
    KindMismatch { id: EntityId, expected: EntityKind, actual: EntityKind },

    #[error("`{attribute}` expects a {expected:?} value")]
    TypeMismatch { attribute: AttributeKind, expected: ValueType },

    #[error("invalid value for `{attribute}`: {reason}")]
    InvalidValue { attribute: AttributeKind, reason: String },

    #[error("`{attribute}` of `{subject}` is immutable once set")]
    ImmutableAttribute { attribute: AttributeKind, subject: EntityId },

    #[error("`{0}` is derived and can only be asserted by rules")]
    DerivedRelation(RelationKind),

    #[error("`{0}` is not a derived relation")]
    NotDerived(RelationKind),

    #[error("refused to take {requested} from `{item}` holding {available}")]
    NegativeQuantity { item: EntityId, available: i64, requested: i64 },

    #[error("fact store unavailable: {0}")]
    StoreUnavailable(String),
}

fn not_found_entity(kind: Option<EntityKind>, id: &EntityId) -> StoreError {
    StoreError::NotFound(Lookup::Entity { kind, id: id.clone() })
}

// ---------------------------------------------------------------------------
// Snapshot records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: EntityId,
    pub kind: EntityKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationFact {
    pub relation: RelationKind,
    pub subject: EntityId,
    pub object: EntityId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeFact {
    pub attribute: AttributeKind,
    pub subject: EntityId,
    pub value: Value,
}

/// Lossless logical image of the whole fact store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub entities: Vec<EntityRecord>,
    pub relations: Vec<RelationFact>,
    pub attributes: Vec<AttributeFact>,
    pub low_stock: Vec<EntityId>,
}

// ---------------------------------------------------------------------------
// FactStore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct FactStore {
    entities: BTreeMap<EntityKind, BTreeSet<EntityId>>,
    index: BTreeMap<EntityId, EntityKind>,
    relations: BTreeMap<RelationKind, BTreeMap<EntityId, Vec<EntityId>>>,
    attributes: BTreeMap<AttributeKind, BTreeMap<EntityId, Vec<Value>>>,
    /// Inverse of `holds`: book -> inventory item.
    holders: BTreeMap<EntityId, EntityId>,
    low_stock: BTreeSet<EntityId>,
}

impl FactStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Entities ────────────────────────────────────────────────────────

    fn insert_entity(&mut self, kind: EntityKind, id: &EntityId) -> Result<(), StoreError> {
        if self.index.contains_key(id) {
            return Err(StoreError::DuplicateEntity(id.clone()));
        }
        self.index.insert(id.clone(), kind);
        self.entities.entry(kind).or_default().insert(id.clone());
        Ok(())
    }

    pub fn create_store(&mut self, id: &EntityId) -> Result<(), StoreError> {
        self.insert_entity(EntityKind::Store, id)
    }

    pub fn create_book(
        &mut self,
        id: &EntityId,
        author: &str,
        genres: &[String],
        price: f64,
    ) -> Result<(), StoreError> {
        if !price.is_finite() || price < 0.0 {
            return Err(StoreError::InvalidValue {
                attribute: AttributeKind::Price,
                reason: format!("{} is not a non-negative price", price),
            });
        }
        self.insert_entity(EntityKind::Book, id)?;
        self.insert_attr(AttributeKind::Author, id, Value::Text(author.to_string()))?;
        for genre in genres {
            self.insert_attr(AttributeKind::Genre, id, Value::Text(genre.clone()))?;
        }
        self.insert_attr(AttributeKind::Price, id, Value::Float(price))?;
        Ok(())
    }

    pub fn create_inventory(
        &mut self,
        id: &EntityId,
        book: &EntityId,
        quantity: i64,
        threshold: i64,
    ) -> Result<(), StoreError> {
        self.expect_kind(book, EntityKind::Book)?;
        if let Some(holder) = self.holders.get(book) {
            return Err(StoreError::CardinalityViolation {
                property: format!("{} (inverse, held by `{}`)", RelationKind::Holds, holder),
                subject: book.clone(),
            });
        }
        if quantity < 0 {
            return Err(StoreError::InvalidValue {
                attribute: AttributeKind::AvailableQuantity,
                reason: format!("{} is negative", quantity),
            });
        }
        if threshold < 0 {
            return Err(StoreError::InvalidValue {
                attribute: AttributeKind::RestockThreshold,
                reason: format!("{} is negative", threshold),
            });
        }
        self.insert_entity(EntityKind::InventoryItem, id)?;
        self.insert_relation(RelationKind::Holds, id, book)?;
        self.insert_attr(AttributeKind::AvailableQuantity, id, Value::Integer(quantity))?;
        self.insert_attr(AttributeKind::RestockThreshold, id, Value::Integer(threshold))?;
        Ok(())
    }

    pub fn create_customer(&mut self, id: &EntityId) -> Result<(), StoreError> {
        self.insert_entity(EntityKind::Customer, id)
    }

    pub fn create_employee(
        &mut self,
        id: &EntityId,
        store: Option<&EntityId>,
    ) -> Result<(), StoreError> {
        if let Some(store) = store {
            self.expect_kind(store, EntityKind::Store)?;
        }
        self.insert_entity(EntityKind::Employee, id)?;
        if let Some(store) = store {
            self.insert_relation(RelationKind::WorksAt, id, store)?;
        }
        Ok(())
    }

    /// Orders are immutable: every functional fact is written here and only here.
    pub fn create_order(
        &mut self,
        id: &EntityId,
        book: &EntityId,
        customer: &EntityId,
        employee: &EntityId,
        total: f64,
    ) -> Result<(), StoreError> {
        self.expect_kind(book, EntityKind::Book)?;
        self.expect_kind(customer, EntityKind::Customer)?;
        self.expect_kind(employee, EntityKind::Employee)?;
        if !total.is_finite() || total < 0.0 {
            return Err(StoreError::InvalidValue {
                attribute: AttributeKind::OrderTotal,
                reason: format!("{} is not a non-negative total", total),
            });
        }
        self.insert_entity(EntityKind::Order, id)?;
        self.insert_relation(RelationKind::PurchasedBook, id, book)?;
        self.insert_relation(RelationKind::PlacedBy, id, customer)?;
        self.insert_relation(RelationKind::HandledBy, id, employee)?;
        self.insert_attr(AttributeKind::OrderTotal, id, Value::Float(total))?;
        Ok(())
    }

    /// Returns `true` when the customer had to be created.
    pub fn ensure_customer(&mut self, id: &EntityId) -> Result<bool, StoreError> {
        if self.contains(id) {
            self.expect_kind(id, EntityKind::Customer)?;
            return Ok(false);
        }
        self.create_customer(id)?;
        Ok(true)
    }

    /// Returns `true` when the employee had to be created.
    pub fn ensure_employee(
        &mut self,
        id: &EntityId,
        store: Option<&EntityId>,
    ) -> Result<bool, StoreError> {
        if self.contains(id) {
            self.expect_kind(id, EntityKind::Employee)?;
            return Ok(false);
        }
        self.create_employee(id, store)?;
        Ok(true)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.index.contains_key(id)
    }

    /// Get-by-identifier lookup of an entity of a specific kind.
    pub fn get(&self, kind: EntityKind, id: &EntityId) -> Result<&EntityId, StoreError> {
        self.entities
            .get(&kind)
            .and_then(|ids| ids.get(id))
            .ok_or_else(|| match self.index.get(id) {
                Some(&actual) => StoreError::KindMismatch {
                    id: id.clone(),
                    expected: kind,
                    actual,
                },
                None => not_found_entity(Some(kind), id),
            })
    }

    fn expect_kind(&self, id: &EntityId, kind: EntityKind) -> Result<(), StoreError> {
        self.get(kind, id).map(|_| ())
    }

    /// Identifiers of every entity of `kind`, in identifier order.
    pub fn ids(&self, kind: EntityKind) -> impl Iterator<Item = &EntityId> + '_ {
        self.entities.get(&kind).into_iter().flat_map(|ids| ids.iter())
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.entities.get(&kind).map_or(0, |ids| ids.len())
    }

    // ─── Relations ───────────────────────────────────────────────────────

    fn insert_relation(
        &mut self,
        relation: RelationKind,
        subject: &EntityId,
        object: &EntityId,
    ) -> Result<bool, StoreError> {
        self.expect_kind(subject, relation.domain())?;
        self.expect_kind(object, relation.range())?;

        if relation == RelationKind::Holds {
            if let Some(holder) = self.holders.get(object) {
                if holder != subject {
                    return Err(StoreError::CardinalityViolation {
                        property: format!("{} (inverse, held by `{}`)", relation, holder),
                        subject: object.clone(),
                    });
                }
            }
        }

        let values = self
            .relations
            .entry(relation)
            .or_default()
            .entry(subject.clone())
            .or_default();
        if values.contains(object) {
            return Ok(false);
        }
        if relation.cardinality() == Cardinality::Functional && !values.is_empty() {
            return Err(StoreError::CardinalityViolation {
                property: relation.to_string(),
                subject: subject.clone(),
            });
        }
        values.push(object.clone());
        if relation == RelationKind::Holds {
            self.holders.insert(object.clone(), subject.clone());
        }
        Ok(true)
    }

    /// Assert a stored (non-derived) relation. Returns `true` if the fact is new.
    pub fn relate(
        &mut self,
        relation: RelationKind,
        subject: &EntityId,
        object: &EntityId,
    ) -> Result<bool, StoreError> {
        if relation.is_derived() {
            return Err(StoreError::DerivedRelation(relation));
        }
        self.insert_relation(relation, subject, object)
    }

    /// Assert a derived relation. Reserved for rule implementations.
    pub fn derive_relation(
        &mut self,
        relation: RelationKind,
        subject: &EntityId,
        object: &EntityId,
    ) -> Result<bool, StoreError> {
        if !relation.is_derived() {
            return Err(StoreError::NotDerived(relation));
        }
        self.insert_relation(relation, subject, object)
    }

    /// Remove every fact of a derived relation. Returns how many were removed.
    pub fn retract_derived(&mut self, relation: RelationKind) -> Result<usize, StoreError> {
        if !relation.is_derived() {
            return Err(StoreError::NotDerived(relation));
        }
        let removed = self
            .relations
            .remove(&relation)
            .map_or(0, |table| table.values().map(Vec::len).sum());
        Ok(removed)
    }

    pub fn related(&self, relation: RelationKind, subject: &EntityId) -> &[EntityId] {
        self.relations
            .get(&relation)
            .and_then(|table| table.get(subject))
            .map(|values| values.as_slice())
            .unwrap_or(&[])
    }

    /// The single value of a functional relation.
    pub fn related_one(
        &self,
        relation: RelationKind,
        subject: &EntityId,
    ) -> Result<&EntityId, StoreError> {
        self.related(relation, subject).first().ok_or_else(|| {
            StoreError::NotFound(Lookup::Relation {
                relation,
                subject: subject.clone(),
            })
        })
    }

    /// Every `(subject, object)` pair of a relation, in subject order.
    pub fn pairs(&self, relation: RelationKind) -> BTreeSet<(EntityId, EntityId)> {
        self.relations
            .get(&relation)
            .into_iter()
            .flat_map(|table| {
                table
                    .iter()
                    .flat_map(|(s, objects)| objects.iter().map(move |o| (s.clone(), o.clone())))
            })
            .collect()
    }

    pub fn inventory_for_book(&self, book: &EntityId) -> Result<&EntityId, StoreError> {
        self.holders
            .get(book)
            .ok_or_else(|| StoreError::NotFound(Lookup::HolderOf { book: book.clone() }))
    }

    // ─── Attributes ──────────────────────────────────────────────────────

    fn insert_attr(
        &mut self,
        attribute: AttributeKind,
        subject: &EntityId,
        value: Value,
    ) -> Result<bool, StoreError> {
        self.expect_kind(subject, attribute.domain())?;
        if value.value_type() != attribute.value_type() {
            return Err(StoreError::TypeMismatch {
                attribute,
                expected: attribute.value_type(),
            });
        }
        let values = self
            .attributes
            .entry(attribute)
            .or_default()
            .entry(subject.clone())
            .or_default();
        if values.contains(&value) {
            return Ok(false);
        }
        if attribute.cardinality() == Cardinality::Functional && !values.is_empty() {
            return Err(StoreError::CardinalityViolation {
                property: attribute.to_string(),
                subject: subject.clone(),
            });
        }
        values.push(value);
        Ok(true)
    }

    /// Assign an attribute value. Functional attributes accept one value only.
    pub fn set_attr(
        &mut self,
        attribute: AttributeKind,
        subject: &EntityId,
        value: Value,
    ) -> Result<bool, StoreError> {
        self.insert_attr(attribute, subject, value)
    }

    /// Overwrite a mutable functional attribute.
    pub fn update_attr(
        &mut self,
        attribute: AttributeKind,
        subject: &EntityId,
        value: Value,
    ) -> Result<(), StoreError> {
        if !attribute.is_mutable() {
            return Err(StoreError::ImmutableAttribute {
                attribute,
                subject: subject.clone(),
            });
        }
        self.expect_kind(subject, attribute.domain())?;
        if value.value_type() != attribute.value_type() {
            return Err(StoreError::TypeMismatch {
                attribute,
                expected: attribute.value_type(),
            });
        }
        self.attributes
            .entry(attribute)
            .or_default()
            .insert(subject.clone(), vec![value]);
        Ok(())
    }

    pub fn attr_values(&self, attribute: AttributeKind, subject: &EntityId) -> &[Value] {
        self.attributes
            .get(&attribute)
            .and_then(|table| table.get(subject))
            .map(|values| values.as_slice())
            .unwrap_or(&[])
    }

    pub fn attr(&self, attribute: AttributeKind, subject: &EntityId) -> Result<&Value, StoreError> {
        self.attr_values(attribute, subject).first().ok_or_else(|| {
            StoreError::NotFound(Lookup::Attribute {
                attribute,
                subject: subject.clone(),
            })
        })
    }

    fn int_attr(&self, attribute: AttributeKind, subject: &EntityId) -> Result<i64, StoreError> {
        self.attr(attribute, subject)?
            .as_int()
            .ok_or(StoreError::TypeMismatch {
                attribute,
                expected: ValueType::Integer,
            })
    }

    fn float_attr(&self, attribute: AttributeKind, subject: &EntityId) -> Result<f64, StoreError> {
        self.attr(attribute, subject)?
            .as_float()
            .ok_or(StoreError::TypeMismatch {
                attribute,
                expected: ValueType::Float,
            })
    }

    // ─── Stock ───────────────────────────────────────────────────────────

    pub fn available_quantity(&self, item: &EntityId) -> Result<i64, StoreError> {
        self.int_attr(AttributeKind::AvailableQuantity, item)
    }

    pub fn restock_threshold(&self, item: &EntityId) -> Result<i64, StoreError> {
        self.int_attr(AttributeKind::RestockThreshold, item)
    }

    pub fn price(&self, book: &EntityId) -> Result<f64, StoreError> {
        self.float_attr(AttributeKind::Price, book)
    }

    /// Decrement stock. Refused, never clamped, when it would go negative.
    pub fn withdraw(&mut self, item: &EntityId, quantity: i64) -> Result<i64, StoreError> {
        let available = self.available_quantity(item)?;
        if quantity < 0 || available < quantity {
            return Err(StoreError::NegativeQuantity {
                item: item.clone(),
                available,
                requested: quantity,
            });
        }
        let remaining = available - quantity;
        self.update_attr(AttributeKind::AvailableQuantity, item, Value::Integer(remaining))?;
        Ok(remaining)
    }

    pub fn deposit(&mut self, item: &EntityId, quantity: i64) -> Result<i64, StoreError> {
        if quantity < 0 {
            return Err(StoreError::InvalidValue {
                attribute: AttributeKind::AvailableQuantity,
                reason: format!("cannot deposit {}", quantity),
            });
        }
        let updated = self.available_quantity(item)? + quantity;
        self.update_attr(AttributeKind::AvailableQuantity, item, Value::Integer(updated))?;
        Ok(updated)
    }

    // ─── LowStock labels ─────────────────────────────────────────────────

    pub fn is_low_stock(&self, item: &EntityId) -> bool {
        self.low_stock.contains(item)
    }

    pub fn low_stock_items(&self) -> Vec<EntityId> {
        self.low_stock.iter().cloned().collect()
    }

    /// Returns `true` if the label is new.
    pub fn label_low_stock(&mut self, item: &EntityId) -> Result<bool, StoreError> {
        self.expect_kind(item, EntityKind::InventoryItem)?;
        Ok(self.low_stock.insert(item.clone()))
    }

    /// Clears every LowStock label. Returns how many were removed.
    pub fn clear_low_stock(&mut self) -> usize {
        let removed = self.low_stock.len();
        self.low_stock.clear();
        removed
    }

    // ─── Views ───────────────────────────────────────────────────────────

    pub fn book(&self, id: &EntityId) -> Result<BookView, StoreError> {
        self.expect_kind(id, EntityKind::Book)?;
        let author = self
            .attr(AttributeKind::Author, id)?
            .as_text()
            .unwrap_or_default()
            .to_string();
        let genres = self
            .attr_values(AttributeKind::Genre, id)
            .iter()
            .filter_map(|v| v.as_text().map(str::to_string))
            .collect();
        Ok(BookView {
            id: id.clone(),
            author,
            genres,
            price: self.price(id)?,
        })
    }

    pub fn order(&self, id: &EntityId) -> Result<OrderView, StoreError> {
        self.expect_kind(id, EntityKind::Order)?;
        Ok(OrderView {
            id: id.clone(),
            purchased_book: self.related_one(RelationKind::PurchasedBook, id)?.clone(),
            placed_by: self.related_one(RelationKind::PlacedBy, id)?.clone(),
            handled_by: self.related(RelationKind::HandledBy, id).to_vec(),
            total: self.float_attr(AttributeKind::OrderTotal, id)?,
        })
    }

    // ─── Integrity ───────────────────────────────────────────────────────

    /// Verify that every mandatory functional fact is present and sane.
    /// A failure means the store cannot be reasoned over.
    pub fn check_integrity(&self) -> Result<(), StoreError> {
        let unavailable = |e: StoreError| StoreError::StoreUnavailable(e.to_string());

        for item in self.ids(EntityKind::InventoryItem) {
            self.related_one(RelationKind::Holds, item).map_err(unavailable)?;
            let quantity = self.available_quantity(item).map_err(unavailable)?;
            self.restock_threshold(item).map_err(unavailable)?;
            if quantity < 0 {
                return Err(StoreError::StoreUnavailable(format!(
                    "`{}` holds negative quantity {}",
                    item, quantity
                )));
            }
        }
        for book in self.ids(EntityKind::Book) {
            self.price(book).map_err(unavailable)?;
        }
        for order in self.ids(EntityKind::Order) {
            self.related_one(RelationKind::PurchasedBook, order).map_err(unavailable)?;
            self.related_one(RelationKind::PlacedBy, order).map_err(unavailable)?;
        }
        Ok(())
    }

    // ─── Snapshot ────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> WorldSnapshot {
        let entities = EntityKind::ALL
            .iter()
            .flat_map(|&kind| {
                self.ids(kind).map(move |id| EntityRecord {
                    id: id.clone(),
                    kind,
                })
            })
            .collect();
        let relations = self
            .relations
            .iter()
            .flat_map(|(&relation, table)| {
                table.iter().flat_map(move |(subject, objects)| {
                    objects.iter().map(move |object| RelationFact {
                        relation,
                        subject: subject.clone(),
                        object: object.clone(),
                    })
                })
            })
            .collect();
        let attributes = self
            .attributes
            .iter()
            .flat_map(|(&attribute, table)| {
                table.iter().flat_map(move |(subject, values)| {
                    values.iter().map(move |value| AttributeFact {
                        attribute,
                        subject: subject.clone(),
                        value: value.clone(),
                    })
                })
            })
            .collect();
        WorldSnapshot {
            entities,
            relations,
            attributes,
            low_stock: self.low_stock_items(),
        }
    }

    /// Serialize the whole store as pretty JSON to `writer`.
    pub fn write_snapshot<W: Write>(&self, writer: W) -> Result<(), serde_json::Error> {
        serde_json::to_writer_pretty(writer, &self.snapshot())
    }

    /// Rebuild a store from a snapshot, re-validating every fact.
    pub fn from_snapshot(snapshot: &WorldSnapshot) -> Result<Self, StoreError> {
        let mut store = Self::new();
        for record in &snapshot.entities {
            store.insert_entity(record.kind, &record.id)?;
        }
        for fact in &snapshot.relations {
            store.insert_relation(fact.relation, &fact.subject, &fact.object)?;
        }
        for fact in &snapshot.attributes {
            store.insert_attr(fact.attribute, &fact.subject, fact.value.clone())?;
        }
        for item in &snapshot.low_stock {
            store.label_low_stock(item)?;
        }
        Ok(store)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> EntityId {
        EntityId::from(s)
    }

    fn seeded() -> FactStore {
        let mut store = FactStore::new();
        store.create_store(&id("main_store")).unwrap();
        store
            .create_book(&id("dune"), "Herbert", &["scifi".to_string()], 12.5)
            .unwrap();
        store.create_inventory(&id("inv_dune"), &id("dune"), 3, 5).unwrap();
        store.create_customer(&id("cust_1")).unwrap();
        store.create_employee(&id("emp_1"), Some(&id("main_store"))).unwrap();
        store
    }

    #[test]
    fn test_lookup_missing_entity_is_not_found() {
        let store = seeded();
        let err = store.get(EntityKind::Book, &id("missing")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(Lookup::Entity { .. })));
    }

    #[test]
    fn test_lookup_wrong_kind() {
        let store = seeded();
        let err = store.get(EntityKind::Book, &id("cust_1")).unwrap_err();
        assert!(matches!(err, StoreError::KindMismatch { .. }));
    }

    #[test]
    fn test_duplicate_identifier_rejected_across_kinds() {
        let mut store = seeded();
        let err = store.create_customer(&id("dune")).unwrap_err();
        assert_eq!(err, StoreError::DuplicateEntity(id("dune")));
    }

    #[test]
    fn test_functional_attribute_second_value_violates_cardinality() {
        let mut store = seeded();
        let err = store
            .set_attr(AttributeKind::Price, &id("dune"), Value::Float(99.0))
            .unwrap_err();
        assert!(matches!(err, StoreError::CardinalityViolation { .. }));
        // Same value again is not a second value.
        assert!(!store
            .set_attr(AttributeKind::Price, &id("dune"), Value::Float(12.5))
            .unwrap());
    }

    #[test]
    fn test_multi_valued_attribute_appends_and_dedups() {
        let mut store = seeded();
        assert!(store
            .set_attr(AttributeKind::Genre, &id("dune"), Value::Text("classic".into()))
            .unwrap());
        assert!(!store
            .set_attr(AttributeKind::Genre, &id("dune"), Value::Text("scifi".into()))
            .unwrap());
        assert_eq!(store.book(&id("dune")).unwrap().genres, vec!["scifi", "classic"]);
    }

    #[test]
    fn test_attribute_type_checked() {
        let mut store = seeded();
        let err = store
            .set_attr(AttributeKind::Author, &id("dune"), Value::Integer(1))
            .unwrap_err();
        assert!(matches!(err, StoreError::TypeMismatch { .. }));
    }

    #[test]
    fn test_immutable_attribute_cannot_be_updated() {
        let mut store = seeded();
        let err = store
            .update_attr(AttributeKind::RestockThreshold, &id("inv_dune"), Value::Integer(1))
            .unwrap_err();
        assert!(matches!(err, StoreError::ImmutableAttribute { .. }));
    }

    #[test]
    fn test_two_items_cannot_hold_same_book() {
        let mut store = seeded();
        let err = store
            .create_inventory(&id("inv_dune_2"), &id("dune"), 1, 1)
            .unwrap_err();
        assert!(matches!(err, StoreError::CardinalityViolation { .. }));
        assert!(!store.contains(&id("inv_dune_2")));
    }

    #[test]
    fn test_withdraw_refuses_instead_of_clamping() {
        let mut store = seeded();
        assert_eq!(store.withdraw(&id("inv_dune"), 3).unwrap(), 0);
        let err = store.withdraw(&id("inv_dune"), 1).unwrap_err();
        assert!(matches!(err, StoreError::NegativeQuantity { available: 0, .. }));
        assert_eq!(store.available_quantity(&id("inv_dune")).unwrap(), 0);
        assert_eq!(store.deposit(&id("inv_dune"), 10).unwrap(), 10);
    }

    #[test]
    fn test_order_functional_relations_fixed_at_creation() {
        let mut store = seeded();
        store
            .create_order(&id("order_1"), &id("dune"), &id("cust_1"), &id("emp_1"), 12.5)
            .unwrap();
        store.create_customer(&id("cust_2")).unwrap();
        let err = store
            .relate(RelationKind::PlacedBy, &id("order_1"), &id("cust_2"))
            .unwrap_err();
        assert!(matches!(err, StoreError::CardinalityViolation { .. }));

        let order = store.order(&id("order_1")).unwrap();
        assert_eq!(order.placed_by, id("cust_1"));
        assert_eq!(order.handled_by, vec![id("emp_1")]);
        assert_eq!(order.total, 12.5);
    }

    #[test]
    fn test_derived_relation_gated() {
        let mut store = seeded();
        let err = store
            .relate(RelationKind::Purchases, &id("cust_1"), &id("dune"))
            .unwrap_err();
        assert_eq!(err, StoreError::DerivedRelation(RelationKind::Purchases));
        assert!(store
            .derive_relation(RelationKind::Purchases, &id("cust_1"), &id("dune"))
            .unwrap());
        assert_eq!(store.retract_derived(RelationKind::Purchases).unwrap(), 1);
        assert!(store.pairs(RelationKind::Purchases).is_empty());
    }

    #[test]
    fn test_relation_domain_enforced() {
        let mut store = seeded();
        let err = store
            .relate(RelationKind::WorksAt, &id("cust_1"), &id("main_store"))
            .unwrap_err();
        assert!(matches!(err, StoreError::KindMismatch { .. }));
    }

    #[test]
    fn test_ensure_is_lazy() {
        let mut store = seeded();
        assert!(!store.ensure_customer(&id("cust_1")).unwrap());
        assert!(store.ensure_customer(&id("cust_9")).unwrap());
        assert!(store.ensure_employee(&id("emp_9"), Some(&id("main_store"))).unwrap());
        assert_eq!(store.related(RelationKind::WorksAt, &id("emp_9")), &[id("main_store")]);
        assert!(store.ensure_employee(&id("cust_1"), None).is_err());
    }

    #[test]
    fn test_snapshot_round_trip_is_lossless() {
        let mut store = seeded();
        store
            .create_order(&id("order_1"), &id("dune"), &id("cust_1"), &id("emp_1"), 12.5)
            .unwrap();
        store
            .derive_relation(RelationKind::Purchases, &id("cust_1"), &id("dune"))
            .unwrap();
        store.label_low_stock(&id("inv_dune")).unwrap();

        let snapshot = store.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: WorldSnapshot = serde_json::from_str(&json).unwrap();
        let rebuilt = FactStore::from_snapshot(&parsed).unwrap();

        assert_eq!(rebuilt.snapshot(), snapshot);
        assert!(rebuilt.is_low_stock(&id("inv_dune")));
        assert_eq!(rebuilt.inventory_for_book(&id("dune")).unwrap(), &id("inv_dune"));
    }

    #[test]
    fn test_integrity_flags_missing_quantity() {
        let mut snapshot = seeded().snapshot();
        snapshot
            .attributes
            .retain(|f| f.attribute != AttributeKind::AvailableQuantity);
        let store = FactStore::from_snapshot(&snapshot).unwrap();
        assert!(matches!(
            store.check_integrity(),
            Err(StoreError::StoreUnavailable(_))
        ));
        assert!(seeded().check_integrity().is_ok());
    }
}
