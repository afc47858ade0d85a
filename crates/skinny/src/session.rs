//! The mapper session.
//!
//! [`Orm`] owns a store connector and the state of one in-flight statement.
//! Every top-level verb (`select`, `insert`, `bulk_insert`, `update`,
//! `update_record`, `bulk_update`, `delete`) starts from a fresh state; the
//! typed [`Query`] handle it returns carries the fluent part of the API and
//! ends in a terminal call (`all`, `first`, `limit`, `using`, or `where_` on
//! a delete/update).
//!
//! ```ignore
//! use skinny::prelude::*;
//!
//! let mut orm = Orm::new(SqliteStore::open_in_memory()?);
//! orm.insert(&user)?;
//! let found = orm.select::<User>()?.where_(field("id").eq(9001))?.first()?;
//! orm.update::<User>()?
//!     .set(field("name").eq("Hello World"))?
//!     .where_(field("id").lt(5))?;
//! orm.delete::<User>()?.where_(field("id").eq(9001))?;
//! ```
//!
//! A session is a single mutable cursor over one statement: every method takes
//! `&mut self`, so it cannot be shared between threads. Use one session per
//! connection.

use crate::config::OrmConfig;
use crate::error::{OrmError, OrmResult};
use crate::expr::{Expression, Field};
use crate::marshal::Marshaler;
use crate::schema::{Entity, Schema};
use crate::statement;
use crate::store::{Cursor, Store, StoreResult};
use crate::value::Value;
use std::marker::PhantomData;
use tracing::{debug, info, warn};

/// What kind of statement the session is building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Select,
    Insert,
    Delete,
    Update,
    BulkUpdate,
}

impl Mode {
    fn is_update(self) -> bool {
        matches!(self, Mode::Update | Mode::BulkUpdate)
    }

    fn verb(self) -> &'static str {
        match self {
            Mode::Select => "select",
            Mode::Insert => "insert",
            Mode::Delete => "delete",
            Mode::Update => "update",
            Mode::BulkUpdate => "bulk_update",
        }
    }
}

/// Where the session is in its statement lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Building,
    Executed,
}

/// The in-flight statement accumulator.
#[derive(Debug, Default)]
struct QueryState {
    mode: Mode,
    phase: Phase,
    base: String,
    sql: String,
    params: Vec<Value>,
    batch: Vec<Vec<Value>>,
    where_clause: String,
    set_clause: String,
    limit: Option<i64>,
    pending: Vec<Vec<Value>>,
}

impl QueryState {
    fn bind(mode: Mode, base: String) -> Self {
        Self {
            mode,
            phase: Phase::Building,
            sql: base.clone(),
            base,
            ..Self::default()
        }
    }

    fn assemble(&mut self) {
        fn push_clause(sql: &mut String, clause: &str) {
            if clause.is_empty() {
                return;
            }
            if !sql.ends_with(' ') {
                sql.push(' ');
            }
            sql.push_str(clause);
        }

        let mut sql = self.base.clone();
        if self.mode.is_update() {
            push_clause(&mut sql, &self.set_clause);
        }
        push_clause(&mut sql, &self.where_clause);
        if let Some(limit) = self.limit {
            push_clause(&mut sql, &format!("limit {limit}"));
        }
        self.sql = sql;
    }
}

/// Run one store round-trip, creating the table and retrying once if the
/// relation is missing and auto-create is enabled.
///
/// The cursor is dropped at the end of each attempt, before any error leaves.
fn with_table_recovery<S: Store, T>(
    store: &mut S,
    config: &OrmConfig,
    schema: &Schema,
    mut attempt: impl FnMut(&mut dyn Cursor) -> StoreResult<T>,
) -> OrmResult<T> {
    let mut created = false;
    loop {
        let mut cursor = store.cursor()?;
        let err = match attempt(&mut cursor) {
            Ok(out) => return Ok(out),
            Err(err) => err,
        };

        if created {
            warn!(
                target: "skinny.sql",
                entity = schema.entity,
                error = %err,
                "statement still failing after table creation"
            );
            return Err(err.into());
        }
        if !(err.is_missing_relation() && config.create_tables_if_not_exists) {
            return Err(err.into());
        }

        let ddl = statement::create_table_sql(schema);
        info!(target: "skinny.sql", entity = schema.entity, sql = %ddl, "creating missing table");
        cursor.execute(&ddl, &[])?;
        created = true;
    }
}

/// Mapper session over a store connector.
pub struct Orm<S: Store> {
    store: S,
    config: OrmConfig,
    marshaler: Marshaler,
    state: QueryState,
}

impl<S: Store> Orm<S> {
    /// Session with default configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, OrmConfig::default())
    }

    pub fn with_config(store: S, config: OrmConfig) -> Self {
        Self {
            store,
            config,
            marshaler: Marshaler::new(config.parse_fields),
            state: QueryState::default(),
        }
    }

    pub fn config(&self) -> &OrmConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// SQL text of the current (or last executed) statement.
    pub fn current_sql(&self) -> &str {
        &self.state.sql
    }

    /// Single-row parameters of the current statement.
    pub fn current_params(&self) -> &[Value] {
        &self.state.params
    }

    /// Parameter rows of the last batched statement.
    pub fn current_batch(&self) -> &[Vec<Value>] {
        &self.state.batch
    }

    /// Accumulated set-clause text, e.g. `set name = ? , pct = ? `.
    pub fn current_set(&self) -> &str {
        &self.state.set_clause
    }

    /// Accumulated where-clause text, e.g. `where User.id = ? `.
    pub fn current_where(&self) -> &str {
        &self.state.where_clause
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    fn bind<E: Entity>(&mut self, mode: Mode, base: String) -> Query<'_, S, E> {
        self.state = QueryState::bind(mode, base);
        Query {
            orm: self,
            _entity: PhantomData,
        }
    }

    /// Start a select over every field of `E`.
    pub fn select<E: Entity>(&mut self) -> OrmResult<Query<'_, S, E>> {
        let schema = E::schema();
        schema.validate()?;
        Ok(self.bind(Mode::Select, statement::select_sql(schema)))
    }

    /// Start a delete on `E`; runs on `where_` or `all`.
    pub fn delete<E: Entity>(&mut self) -> OrmResult<Query<'_, S, E>> {
        let schema = E::schema();
        schema.validate()?;
        Ok(self.bind(Mode::Delete, statement::delete_sql(schema)))
    }

    /// Start an update on `E` driven by `set` + `where_`.
    pub fn update<E: Entity>(&mut self) -> OrmResult<Query<'_, S, E>> {
        let schema = E::schema();
        schema.validate()?;
        Ok(self.bind(Mode::Update, statement::update_sql(schema)))
    }

    /// Start an update that writes `record` back on `using`.
    pub fn update_record<E: Entity>(&mut self, record: &E) -> OrmResult<Query<'_, S, E>> {
        let schema = E::schema();
        schema.validate()?;
        let values = record.to_values();
        let query = self.bind(Mode::Update, statement::update_sql(schema));
        query.orm.state.pending.push(values);
        Ok(query)
    }

    /// Start an update that writes every record back on `using`, batched.
    pub fn bulk_update<E: Entity>(&mut self, records: &[E]) -> OrmResult<Query<'_, S, E>> {
        let schema = E::schema();
        schema.validate()?;
        if records.is_empty() {
            return Err(OrmError::NoPendingRecords);
        }
        let pending = records.iter().map(Entity::to_values).collect();
        let query = self.bind(Mode::BulkUpdate, statement::update_sql(schema));
        query.orm.state.pending = pending;
        Ok(query)
    }

    /// Insert one record and commit.
    pub fn insert<E: Entity>(&mut self, record: &E) -> OrmResult<()> {
        self.insert_with(record, true)
    }

    /// Insert one record, committing only when `commit` is set.
    pub fn insert_with<E: Entity>(&mut self, record: &E, commit: bool) -> OrmResult<()> {
        let schema = E::schema();
        schema.validate()?;
        let stmt = statement::insert(schema, record.to_values());
        self.state = QueryState::bind(Mode::Insert, stmt.sql);
        self.state.params = stmt.params;

        let state = &self.state;
        debug!(target: "skinny.sql", verb = "insert", sql = %state.sql, params = state.params.len());
        with_table_recovery(&mut self.store, &self.config, schema, |cursor| {
            cursor.execute(&state.sql, &state.params)
        })?;
        if commit {
            self.store.commit()?;
        }
        self.state.phase = Phase::Executed;
        Ok(())
    }

    /// Insert every record with one batched call and commit.
    pub fn bulk_insert<E: Entity>(&mut self, records: &[E]) -> OrmResult<()> {
        self.bulk_insert_with(records, true)
    }

    /// Insert every record with one batched call; no-op on empty input.
    pub fn bulk_insert_with<E: Entity>(&mut self, records: &[E], commit: bool) -> OrmResult<()> {
        self.state = QueryState::default();
        if records.is_empty() {
            return Ok(());
        }
        let schema = E::schema();
        schema.validate()?;
        let stmt = statement::bulk_insert(schema, records.iter().map(Entity::to_values).collect());
        self.state = QueryState::bind(Mode::Insert, stmt.sql);
        self.state.batch = stmt.rows;

        let state = &self.state;
        debug!(target: "skinny.sql", verb = "bulk_insert", sql = %state.sql, rows = state.batch.len());
        with_table_recovery(&mut self.store, &self.config, schema, |cursor| {
            cursor.execute_many(&state.sql, &state.batch)
        })?;
        if commit {
            self.store.commit()?;
        }
        self.state.phase = Phase::Executed;
        Ok(())
    }

    /// Not supported.
    pub fn upsert<E: Entity>(&mut self, _record: &E) -> OrmResult<()> {
        Err(OrmError::Unimplemented("upsert"))
    }

    /// Not supported.
    pub fn bulk_upsert<E: Entity>(&mut self, _records: &[E]) -> OrmResult<()> {
        Err(OrmError::Unimplemented("bulk_upsert"))
    }
}

/// Typed handle over the session's in-flight statement for entity `E`.
///
/// Borrowing the session mutably, it guarantees one statement at a time.
pub struct Query<'o, S: Store, E: Entity> {
    orm: &'o mut Orm<S>,
    _entity: PhantomData<fn() -> E>,
}

impl<'o, S: Store, E: Entity> Query<'o, S, E> {
    /// Handle for `name`, checked against `E`'s schema.
    pub fn field(&self, name: &str) -> OrmResult<Field> {
        E::schema().field(name)
    }

    /// Handles for every field of `E`, in declaration order.
    pub fn fields(&self) -> Vec<Field> {
        E::schema().handles()
    }

    /// SQL text built so far.
    pub fn sql(&self) -> &str {
        &self.orm.state.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.orm.state.params
    }

    fn ensure_open(&self) -> OrmResult<()> {
        match self.orm.state.phase {
            Phase::Executed => Err(OrmError::AlreadyExecuted),
            _ => Ok(()),
        }
    }

    /// Add a where-clause.
    ///
    /// On a select the handle is returned for `all`/`first`/`limit`. On a
    /// delete or update the statement is executed and committed first, and
    /// the returned handle is spent.
    pub fn where_(mut self, expr: Expression) -> OrmResult<Self> {
        self.ensure_open()?;
        let schema = E::schema();
        let state = &mut self.orm.state;

        if state.mode.is_update() && state.set_clause.is_empty() {
            return Err(OrmError::EmptySet(schema.entity.to_string()));
        }
        if state.mode != Mode::Select && expr.is_empty() {
            return Err(OrmError::EmptyWhere(
                state.mode.verb(),
                schema.entity.to_string(),
            ));
        }
        statement::render_where(schema, &expr, &mut state.where_clause, &mut state.params)?;
        state.assemble();

        match state.mode {
            Mode::Delete | Mode::Update | Mode::BulkUpdate => {
                self.finish()?;
                Ok(self)
            }
            _ => Ok(self),
        }
    }

    /// Add one or more `field = value` assignments to an update.
    pub fn set(self, expr: Expression) -> OrmResult<Self> {
        self.ensure_open()?;
        let state = &mut self.orm.state;
        if !state.mode.is_update() {
            return Err(OrmError::InvalidState("set is only valid on an update"));
        }
        statement::render_set(E::schema(), &expr, &mut state.set_clause, &mut state.params)?;
        state.assemble();
        Ok(self)
    }

    /// Cap the row count and fetch.
    pub fn limit<N: TryInto<i64>>(self, rows: N) -> OrmResult<Vec<E>>
    where
        N::Error: std::fmt::Display,
    {
        self.ensure_open()?;
        if self.orm.state.mode != Mode::Select {
            return Err(OrmError::InvalidState("limit is only valid on a select"));
        }
        let rows: i64 = rows
            .try_into()
            .map_err(|e| OrmError::InvalidLimit(e.to_string()))?;
        if rows < 0 {
            return Err(OrmError::InvalidLimit(format!("{rows} is negative")));
        }
        self.orm.state.limit = Some(rows);
        self.orm.state.assemble();
        self.all()
    }

    /// Execute and return every matching record without committing.
    pub fn all(self) -> OrmResult<Vec<E>> {
        self.all_with(false)
    }

    /// Execute and return every matching record.
    ///
    /// On a delete the statement runs and an empty list is returned.
    pub fn all_with(self, commit: bool) -> OrmResult<Vec<E>> {
        self.ensure_open()?;
        let orm = self.orm;
        let state = &orm.state;
        if state.mode.is_update() {
            return Err(OrmError::InvalidState("an update runs on where_ or using"));
        }

        debug!(target: "skinny.sql", verb = state.mode.verb(), sql = %state.sql, params = state.params.len());
        let rows = with_table_recovery(&mut orm.store, &orm.config, E::schema(), |cursor| {
            match state.mode {
                Mode::Delete => cursor.execute(&state.sql, &state.params).map(|_| Vec::new()),
                _ => cursor.fetch_all(&state.sql, &state.params),
            }
        })?;
        if commit {
            orm.store.commit()?;
        }
        orm.state.phase = Phase::Executed;
        orm.marshaler.records(rows)
    }

    /// Execute and return the first matching record, if any.
    pub fn first(self) -> OrmResult<Option<E>> {
        self.ensure_open()?;
        let orm = self.orm;
        let state = &orm.state;
        if state.mode != Mode::Select {
            return Err(OrmError::InvalidState("first is only valid on a select"));
        }

        debug!(target: "skinny.sql", verb = "first", sql = %state.sql, params = state.params.len());
        let row = with_table_recovery(&mut orm.store, &orm.config, E::schema(), |cursor| {
            cursor.fetch_one(&state.sql, &state.params)
        })?;
        orm.state.phase = Phase::Executed;
        row.map(|row| orm.marshaler.record(row)).transpose()
    }

    /// Write the pending records back, matching rows on `keys`, and commit.
    ///
    /// Every field is assigned from the record. Assignments from earlier
    /// `set` calls are discarded.
    pub fn using<I>(self, keys: I) -> OrmResult<()>
    where
        I: IntoIterator,
        I::Item: Into<Field>,
    {
        self.ensure_open()?;
        let keys: Vec<Field> = keys.into_iter().map(Into::into).collect();
        let orm = self.orm;
        let state = &mut orm.state;
        if !state.mode.is_update() {
            return Err(OrmError::InvalidState("using is only valid on an update"));
        }
        if state.pending.is_empty() {
            return Err(OrmError::NoPendingRecords);
        }

        let stmt = statement::render_using(E::schema(), &keys, &state.pending)?;
        state.sql = stmt.sql;
        state.set_clause.clear();
        state.params.clear();
        state.batch.clear();
        let bulk = state.mode == Mode::BulkUpdate;
        if bulk {
            state.batch = stmt.rows;
        } else {
            state.params = stmt.rows.into_iter().next().unwrap_or_default();
        }

        let state = &orm.state;
        let rows = if bulk { state.batch.len() } else { 1 };
        debug!(target: "skinny.sql", verb = "using", sql = %state.sql, rows);
        {
            let mut cursor = orm.store.cursor()?;
            if bulk {
                cursor.execute_many(&state.sql, &state.batch)?;
            } else {
                cursor.execute(&state.sql, &state.params)?;
            }
        }
        orm.store.commit()?;
        orm.state.phase = Phase::Executed;
        Ok(())
    }

    /// Execute the assembled delete/update once and commit.
    fn finish(&mut self) -> OrmResult<()> {
        let orm = &mut *self.orm;
        let state = &orm.state;
        debug!(target: "skinny.sql", verb = state.mode.verb(), sql = %state.sql, params = state.params.len());
        {
            let mut cursor = orm.store.cursor()?;
            cursor.execute(&state.sql, &state.params)?;
        }
        orm.store.commit()?;
        orm.state.phase = Phase::Executed;
        Ok(())
    }
}

#[cfg(test)]
mod tests;
