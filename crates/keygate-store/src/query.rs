//! Unscoped query descriptions.

use std::cmp::Ordering;

use keygate_model::{AttributeValue, Entity};

/// Sort order for a query, parsed from `order_by`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Attribute to sort on.
    pub field: String,
    /// Sort from largest to smallest.
    pub descending: bool,
}

impl OrderBy {
    /// Parse `name` (ascending) or `-name` (descending).
    ///
    /// Returns `None` for an empty field name.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (field, descending) = match raw.strip_prefix('-') {
            Some(field) => (field, true),
            None => (raw, false),
        };
        if field.is_empty() {
            return None;
        }
        Some(Self {
            field: field.to_owned(),
            descending,
        })
    }

    /// Compare two entities on this order. Unset attributes sort first.
    #[must_use]
    pub fn compare(&self, a: &Entity, b: &Entity) -> Ordering {
        let null = AttributeValue::Null;
        let left = a.get(&self.field).unwrap_or(&null);
        let right = b.get(&self.field).unwrap_or(&null);
        let ordering = left.order_cmp(right);
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

/// A query over one entity kind, before it is bound to a customer.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    kind: String,
    filters: Vec<(String, AttributeValue)>,
    order: Option<OrderBy>,
    limit: Option<usize>,
}

impl Query {
    /// Select every entity of a kind.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Add an equality filter.
    #[must_use]
    pub fn filter(mut self, field: impl Into<String>, value: AttributeValue) -> Self {
        self.filters.push((field.into(), value));
        self
    }

    /// Set the sort order.
    #[must_use]
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order = Some(order);
        self
    }

    /// Cap the number of results.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Entity kind.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Sort order, if any.
    #[must_use]
    pub fn order(&self) -> Option<&OrderBy> {
        self.order.as_ref()
    }

    /// Result cap, if any.
    #[must_use]
    pub fn result_limit(&self) -> Option<usize> {
        self.limit
    }

    /// Whether `entity` has this query's kind and passes every filter.
    #[must_use]
    pub fn matches(&self, entity: &Entity) -> bool {
        entity.kind() == self.kind
            && self
                .filters
                .iter()
                .all(|(field, expected)| entity.get(field) == Some(expected))
    }
}
