//! Order identifiers, item lists, and mutation outcomes.

use std::fmt;

use chrono::NaiveDateTime;

/// Rendering used for `order_date` in logs and console output.
pub const ORDER_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Validation errors for order primitives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderValidationError {
    #[error("order id must be positive, got {0}")]
    NonPositiveId(i64),
    #[error("order id {0} exceeds the INT column range")]
    IdOutOfRange(u64),
    #[error("at least one item description is required")]
    NoItems,
}

/// Auto-generated primary key of an `order` row.
///
/// ## Invariants
/// - Always strictly positive; MySQL `AUTO_INCREMENT` starts at one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrderId(i32);

impl OrderId {
    /// Validate a raw identifier.
    ///
    /// # Examples
    /// ```
    /// use storefront::domain::OrderId;
    ///
    /// assert_eq!(OrderId::new(6).map(OrderId::get), Ok(6));
    /// assert!(OrderId::new(0).is_err());
    /// ```
    pub fn new(raw: i32) -> Result<Self, OrderValidationError> {
        if raw <= 0 {
            return Err(OrderValidationError::NonPositiveId(i64::from(raw)));
        }
        Ok(Self(raw))
    }

    /// Convert a generated key reported by the driver.
    pub fn from_generated_key(raw: u64) -> Result<Self, OrderValidationError> {
        let value = i32::try_from(raw).map_err(|_| OrderValidationError::IdOutOfRange(raw))?;
        Self::new(value)
    }

    /// Underlying integer value.
    pub fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i32> for OrderId {
    type Error = OrderValidationError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Non-empty, ordered list of item descriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItems(Vec<String>);

impl OrderItems {
    /// Build an item list, rejecting an empty one.
    ///
    /// # Examples
    /// ```
    /// use storefront::domain::OrderItems;
    ///
    /// let items = OrderItems::new(["shoes", "shirt", "socks"]).expect("items");
    /// assert_eq!(items.len(), 3);
    /// assert!(OrderItems::new(Vec::<String>::new()).is_err());
    /// ```
    pub fn new<I, S>(items: I) -> Result<Self, OrderValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items: Vec<String> = items.into_iter().map(Into::into).collect();
        if items.is_empty() {
            return Err(OrderValidationError::NoItems);
        }
        Ok(Self(items))
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate descriptions in submission order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Borrow the descriptions.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// Result of one description lookup within a batch removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// The owning order was deleted together with its details.
    Removed { item: String, order_id: OrderId },
    /// No order owns a detail with this description.
    NotFound { item: String },
}

impl RemovalOutcome {
    /// Description this outcome refers to.
    pub fn item(&self) -> &str {
        match self {
            Self::Removed { item, .. } | Self::NotFound { item } => item,
        }
    }
}

/// Per-item outcomes of a committed batch removal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalReport {
    outcomes: Vec<RemovalOutcome>,
}

impl RemovalReport {
    pub(crate) fn push(&mut self, outcome: RemovalOutcome) {
        self.outcomes.push(outcome);
    }

    /// Outcomes in the order the items were submitted.
    pub fn outcomes(&self) -> &[RemovalOutcome] {
        &self.outcomes
    }

    /// Orders deleted by the batch.
    pub fn removed_order_ids(&self) -> Vec<OrderId> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                RemovalOutcome::Removed { order_id, .. } => Some(*order_id),
                RemovalOutcome::NotFound { .. } => None,
            })
            .collect()
    }

    /// Number of orders deleted by the batch.
    pub fn removed_count(&self) -> usize {
        self.removed_order_ids().len()
    }
}

/// Summary of a committed delete-by-id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletionSummary {
    pub order_id: OrderId,
    pub details_removed: u64,
}

/// Newly created order as reported back to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedOrder {
    pub order_id: OrderId,
    pub order_date: NaiveDateTime,
    pub item_count: usize,
}
