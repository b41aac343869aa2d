//! In-memory port implementations and fixtures.
//!
//! Compiled for unit tests and behind the `test-support` feature so the
//! integration tests under `storefront/tests/` can drive the domain services
//! without a MySQL server. The stores mimic the relevant InnoDB behaviour:
//! transactions see their own writes, commit publishes them, rollback and
//! drop discard them, and deleting an order cascades to its details unless
//! the foreign key is switched off.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use mockable::Clock;

use crate::domain::OrderId;
use crate::domain::ports::{
    OrderRepository, OrderRepositoryError, OrderTransaction, SchemaRepository,
    SchemaRepositoryError,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clock frozen at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    utc_now: DateTime<Utc>,
}

impl FixedClock {
    /// Freeze the clock at `utc_now`.
    pub fn new(utc_now: DateTime<Utc>) -> Self {
        Self { utc_now }
    }

    /// Freeze the clock at a fixed instant with a sub-second component.
    pub fn fixture() -> Self {
        let base = Utc
            .with_ymd_and_hms(2024, 3, 9, 14, 5, 27)
            .single()
            .unwrap_or_default();
        Self::new(base + chrono::Duration::milliseconds(640))
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

/// Statement at which an [`InMemoryOrderRepository`] should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Begin,
    InsertOrder,
    /// Fail the n-th detail insert (zero based) of a transaction.
    InsertDetail(usize),
    FindOrder,
    DeleteDetails,
    DeleteOrder,
    Commit,
}

/// One `order_details` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRow {
    pub order_detail_id: i32,
    pub order_id: i32,
    pub item_description: String,
}

/// Contents of both tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tables {
    pub orders: BTreeMap<i32, NaiveDateTime>,
    pub details: Vec<DetailRow>,
}

impl Tables {
    /// Descriptions attached to an order, in insertion order.
    pub fn details_for(&self, order_id: OrderId) -> Vec<String> {
        self.details
            .iter()
            .filter(|row| row.order_id == order_id.get())
            .map(|row| row.item_description.clone())
            .collect()
    }
}

#[derive(Debug, Default)]
struct OrderStore {
    committed: Tables,
    next_order_id: i32,
    next_detail_id: i32,
    fault: Option<Fault>,
    silent_detail_limit: Option<usize>,
    without_cascade: bool,
    begun: usize,
    committed_count: usize,
    rolled_back: usize,
}

/// In-memory `OrderRepository` with fault injection.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderRepository {
    store: Arc<Mutex<OrderStore>>,
}

impl InMemoryOrderRepository {
    /// Empty store with the cascading foreign key in place.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail with a query error at the given statement.
    pub fn with_fault(self, fault: Fault) -> Self {
        lock(&self.store).fault = Some(fault);
        self
    }

    /// Report zero affected rows for every detail insert after the first
    /// `limit` in a transaction.
    pub fn with_silent_detail_limit(self, limit: usize) -> Self {
        lock(&self.store).silent_detail_limit = Some(limit);
        self
    }

    /// Behave as if the `ON DELETE CASCADE` constraint were missing.
    pub fn without_cascade(self) -> Self {
        lock(&self.store).without_cascade = true;
        self
    }

    /// Remove any configured fault.
    pub fn clear_fault(&self) {
        lock(&self.store).fault = None;
    }

    /// Insert a committed order directly, returning its id.
    pub fn seed_order(&self, order_date: NaiveDateTime, items: &[&str]) -> OrderId {
        let mut store = lock(&self.store);
        store.next_order_id += 1;
        let order_id = store.next_order_id;
        store.committed.orders.insert(order_id, order_date);
        for item in items {
            store.next_detail_id += 1;
            let order_detail_id = store.next_detail_id;
            store.committed.details.push(DetailRow {
                order_detail_id,
                order_id,
                item_description: (*item).to_owned(),
            });
        }
        OrderId::new(order_id).unwrap_or_else(|_| unreachable!("ids start at one"))
    }

    /// Committed table contents.
    pub fn snapshot(&self) -> Tables {
        lock(&self.store).committed.clone()
    }

    /// Number of transactions begun, committed, and rolled back.
    pub fn transaction_counts(&self) -> (usize, usize, usize) {
        let store = lock(&self.store);
        (store.begun, store.committed_count, store.rolled_back)
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn begin(&self) -> Result<Box<dyn OrderTransaction>, OrderRepositoryError> {
        let mut store = lock(&self.store);
        if store.fault == Some(Fault::Begin) {
            return Err(OrderRepositoryError::connection("injected begin failure"));
        }
        store.begun += 1;
        Ok(Box::new(InMemoryOrderTransaction {
            store: Arc::clone(&self.store),
            working: Some(store.committed.clone()),
            next_order_id: store.next_order_id,
            next_detail_id: store.next_detail_id,
            detail_inserts: 0,
        }))
    }
}

/// Transaction over a private copy of the committed tables.
#[derive(Debug)]
pub struct InMemoryOrderTransaction {
    store: Arc<Mutex<OrderStore>>,
    working: Option<Tables>,
    next_order_id: i32,
    next_detail_id: i32,
    detail_inserts: usize,
}

impl InMemoryOrderTransaction {
    fn check(&self, at: Fault) -> Result<(), OrderRepositoryError> {
        if lock(&self.store).fault == Some(at) {
            return Err(OrderRepositoryError::query(format!(
                "injected failure at {at:?}"
            )));
        }
        Ok(())
    }

    fn tables(&mut self) -> Result<&mut Tables, OrderRepositoryError> {
        self.working
            .as_mut()
            .ok_or_else(OrderRepositoryError::transaction_closed)
    }
}

impl Drop for InMemoryOrderTransaction {
    fn drop(&mut self) {
        if self.working.take().is_some() {
            lock(&self.store).rolled_back += 1;
        }
    }
}

#[async_trait]
impl OrderTransaction for InMemoryOrderTransaction {
    async fn insert_order(
        &mut self,
        order_date: NaiveDateTime,
    ) -> Result<OrderId, OrderRepositoryError> {
        self.check(Fault::InsertOrder)?;
        self.next_order_id += 1;
        let order_id = self.next_order_id;
        self.tables()?.orders.insert(order_id, order_date);
        OrderId::new(order_id).map_err(|err| OrderRepositoryError::query(err.to_string()))
    }

    async fn insert_detail(
        &mut self,
        order_id: OrderId,
        item_description: &str,
    ) -> Result<u64, OrderRepositoryError> {
        let index = self.detail_inserts;
        self.detail_inserts += 1;
        self.check(Fault::InsertDetail(index))?;
        let silent_limit = lock(&self.store).silent_detail_limit;
        if silent_limit.is_some_and(|limit| index >= limit) {
            return Ok(0);
        }
        self.next_detail_id += 1;
        let order_detail_id = self.next_detail_id;
        self.tables()?.details.push(DetailRow {
            order_detail_id,
            order_id: order_id.get(),
            item_description: item_description.to_owned(),
        });
        Ok(1)
    }

    async fn find_order_ids_by_description(
        &mut self,
        item_description: &str,
    ) -> Result<Vec<OrderId>, OrderRepositoryError> {
        self.check(Fault::FindOrder)?;
        self.tables()?
            .details
            .iter()
            .filter(|row| row.item_description == item_description)
            .map(|row| {
                OrderId::new(row.order_id).map_err(|err| OrderRepositoryError::query(err.to_string()))
            })
            .collect()
    }

    async fn delete_details(&mut self, order_id: OrderId) -> Result<u64, OrderRepositoryError> {
        self.check(Fault::DeleteDetails)?;
        let tables = self.tables()?;
        let before = tables.details.len();
        tables.details.retain(|row| row.order_id != order_id.get());
        Ok((before - tables.details.len()) as u64)
    }

    async fn delete_order(&mut self, order_id: OrderId) -> Result<u64, OrderRepositoryError> {
        self.check(Fault::DeleteOrder)?;
        let cascade = !lock(&self.store).without_cascade;
        let tables = self.tables()?;
        if tables.orders.remove(&order_id.get()).is_none() {
            return Ok(0);
        }
        if cascade {
            tables.details.retain(|row| row.order_id != order_id.get());
        }
        Ok(1)
    }

    async fn commit(&mut self) -> Result<(), OrderRepositoryError> {
        let tables = self
            .working
            .take()
            .ok_or_else(OrderRepositoryError::transaction_closed)?;
        let mut store = lock(&self.store);
        if store.fault == Some(Fault::Commit) {
            store.rolled_back += 1;
            return Err(OrderRepositoryError::connection("injected commit failure"));
        }
        store.committed = tables;
        store.next_order_id = store.next_order_id.max(self.next_order_id);
        store.next_detail_id = store.next_detail_id.max(self.next_detail_id);
        store.committed_count += 1;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), OrderRepositoryError> {
        self.working
            .take()
            .ok_or_else(OrderRepositoryError::transaction_closed)?;
        lock(&self.store).rolled_back += 1;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct SchemaCatalog {
    schema_exists: bool,
    tables: Vec<&'static str>,
    create_schema_calls: usize,
    select_failure: Option<SchemaRepositoryError>,
    hide_created_schema: bool,
}

/// In-memory `SchemaRepository` tracking the DDL it receives.
#[derive(Debug, Clone, Default)]
pub struct InMemorySchemaRepository {
    schema: String,
    catalog: Arc<Mutex<SchemaCatalog>>,
}

impl InMemorySchemaRepository {
    /// Fresh server without the schema.
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            catalog: Arc::default(),
        }
    }

    /// Server where the schema and both tables already exist.
    pub fn provisioned(schema: impl Into<String>) -> Self {
        let repo = Self::new(schema);
        {
            let mut catalog = lock(&repo.catalog);
            catalog.schema_exists = true;
            catalog.tables = vec!["order", "order_details"];
        }
        repo
    }

    /// Make every schema selection fail with the given error.
    pub fn with_select_failure(self, error: SchemaRepositoryError) -> Self {
        lock(&self.catalog).select_failure = Some(error);
        self
    }

    /// Accept `CREATE SCHEMA` without making the schema visible.
    pub fn hiding_created_schema(self) -> Self {
        lock(&self.catalog).hide_created_schema = true;
        self
    }

    /// Tables created so far, in creation order.
    pub fn tables(&self) -> Vec<&'static str> {
        lock(&self.catalog).tables.clone()
    }

    /// How often `CREATE SCHEMA` ran.
    pub fn create_schema_calls(&self) -> usize {
        lock(&self.catalog).create_schema_calls
    }

    fn create_table(&self, table: &'static str) -> Result<(), SchemaRepositoryError> {
        let mut catalog = lock(&self.catalog);
        if catalog.tables.contains(&table) {
            return Err(SchemaRepositoryError::query(format!(
                "[1050/42S01] Table '{table}' already exists"
            )));
        }
        catalog.tables.push(table);
        Ok(())
    }
}

#[async_trait]
impl SchemaRepository for InMemorySchemaRepository {
    async fn select_schema(&self) -> Result<(), SchemaRepositoryError> {
        let catalog = lock(&self.catalog);
        if let Some(error) = &catalog.select_failure {
            return Err(error.clone());
        }
        if catalog.schema_exists {
            Ok(())
        } else {
            Err(SchemaRepositoryError::unknown_schema(self.schema.clone()))
        }
    }

    async fn create_schema(&self) -> Result<(), SchemaRepositoryError> {
        let mut catalog = lock(&self.catalog);
        catalog.create_schema_calls += 1;
        if catalog.schema_exists {
            return Err(SchemaRepositoryError::query(format!(
                "[1007/HY000] Can't create database '{}'; database exists",
                self.schema
            )));
        }
        catalog.schema_exists = !catalog.hide_created_schema;
        Ok(())
    }

    async fn create_order_table(&self) -> Result<(), SchemaRepositoryError> {
        self.create_table("order")
    }

    async fn create_order_details_table(&self) -> Result<(), SchemaRepositoryError> {
        self.create_table("order_details")
    }
}
