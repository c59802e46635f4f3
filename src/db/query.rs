// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Row filters and patches understood by every store backend.
//!
//! A [`Filter`] is a conjunction of clauses; a [`Patch`] is an ordered list
//! of field operations. Backends evaluate both against whole rows, so an
//! `update` whose filter carries a guard (e.g. `quantity_left > 0`) acts as
//! a conditional write.
//!
//! Ids are compared by their string form wherever they appear: the `id`
//! column and the members of array fields (which hold ids of other rows).
//! A row stored by an older client with `"id": 1` is therefore reachable as
//! `"1"`, the same string every response renders.

use serde_json::{Map, Value};

use crate::models::coerce::{display_string, normalize_counter, numeric};

/// Column holding a row's identity.
pub const ID_FIELD: &str = "id";

/// A single stored row.
pub type Row = Map<String, Value>;

/// One condition on a row field.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Field equals value.
    Eq(String, Value),
    /// Field is numeric and strictly greater than the bound.
    Gt(String, f64),
    /// Field equals one of the values.
    In(String, Vec<Value>),
    /// Array field holds the value.
    Contains(String, Value),
    /// Array field does not hold the value (a missing field counts as empty).
    NotContains(String, Value),
}

impl Clause {
    fn matches(&self, row: &Row) -> bool {
        match self {
            Clause::Eq(field, value) if field == ID_FIELD => {
                row.get(field).is_some_and(|v| same_id(v, value))
            }
            Clause::Eq(field, value) => row.get(field) == Some(value),
            Clause::Gt(field, bound) => row
                .get(field)
                .and_then(numeric)
                .is_some_and(|n| n > *bound),
            Clause::In(field, values) if field == ID_FIELD => row
                .get(field)
                .is_some_and(|v| values.iter().any(|candidate| same_id(v, candidate))),
            Clause::In(field, values) => row.get(field).is_some_and(|v| values.contains(v)),
            Clause::Contains(field, value) => match row.get(field) {
                Some(Value::Array(items)) => holds(items, value),
                _ => false,
            },
            Clause::NotContains(field, value) => match row.get(field) {
                Some(Value::Array(items)) => !holds(items, value),
                _ => true,
            },
        }
    }
}

/// Conjunction of clauses. The empty filter matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    /// Filter matching every row.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self::all().and_eq(field, value)
    }

    pub fn is_in(field: &str, values: Vec<Value>) -> Self {
        Self {
            clauses: vec![Clause::In(field.to_string(), values)],
        }
    }

    pub fn and_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.clauses.push(Clause::Eq(field.to_string(), value.into()));
        self
    }

    pub fn and_gt(mut self, field: &str, bound: f64) -> Self {
        self.clauses.push(Clause::Gt(field.to_string(), bound));
        self
    }

    pub fn and_contains(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.clauses
            .push(Clause::Contains(field.to_string(), value.into()));
        self
    }

    pub fn and_not_contains(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.clauses
            .push(Clause::NotContains(field.to_string(), value.into()));
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.clauses.iter().all(|c| c.matches(row))
    }
}

/// One operation on a row field.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchOp {
    Set(Value),
    /// Add `delta` to the normalised current value (never below 0).
    Increment(i64),
    /// Append to an array field unless already present.
    AddToSet(Value),
    /// Remove every occurrence from an array field.
    RemoveFromSet(Value),
}

/// Ordered field operations applied to each matching row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    ops: Vec<(String, PatchOp)>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Patch setting every field of `fields`.
    pub fn set_all(fields: Row) -> Self {
        Self {
            ops: fields
                .into_iter()
                .map(|(field, value)| (field, PatchOp::Set(value)))
                .collect(),
        }
    }

    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.ops.push((field.to_string(), PatchOp::Set(value.into())));
        self
    }

    pub fn increment(mut self, field: &str, delta: i64) -> Self {
        self.ops.push((field.to_string(), PatchOp::Increment(delta)));
        self
    }

    pub fn add_to_set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.ops
            .push((field.to_string(), PatchOp::AddToSet(value.into())));
        self
    }

    pub fn remove_from_set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.ops
            .push((field.to_string(), PatchOp::RemoveFromSet(value.into())));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Apply every operation to `row` in order.
    pub fn apply(&self, row: &mut Row) {
        for (field, op) in &self.ops {
            match op {
                PatchOp::Set(value) => {
                    row.insert(field.clone(), value.clone());
                }
                PatchOp::Increment(delta) => {
                    let current = row.get(field).map(normalize_counter).unwrap_or(0);
                    let current = i64::try_from(current).unwrap_or(i64::MAX);
                    let next = current.saturating_add(*delta).max(0);
                    row.insert(field.clone(), Value::from(next));
                }
                PatchOp::AddToSet(value) => {
                    let mut items = take_array(row, field);
                    if !holds(&items, value) {
                        items.push(value.clone());
                    }
                    row.insert(field.clone(), Value::Array(items));
                }
                PatchOp::RemoveFromSet(value) => {
                    let mut items = take_array(row, field);
                    items.retain(|item| !same_id(item, value));
                    row.insert(field.clone(), Value::Array(items));
                }
            }
        }
    }
}

/// Two stored scalars name the same row.
pub fn same_id(a: &Value, b: &Value) -> bool {
    a == b || (!a.is_array() && !a.is_object() && display_string(a) == display_string(b))
}

fn holds(items: &[Value], value: &Value) -> bool {
    items.iter().any(|item| same_id(item, value))
}

/// Take an array field out of the row; a missing or non-array value is `[]`.
fn take_array(row: &mut Row, field: &str) -> Vec<Value> {
    match row.remove(field) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}
