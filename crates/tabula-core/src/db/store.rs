use crate::{
    db::{
        executor::{eval_on_row, matches_row},
        query::{Assignment, Predicate, QueryError, Source},
        row::Row,
        source::{BulkMutation, RowSource},
    },
    error::InternalError,
    model::SourceModel,
    value::Value,
};
use parking_lot::RwLock;
use std::{collections::BTreeMap, sync::Arc};

///
/// MemoryStore
///
/// In-memory row source and bulk-mutation backend. Tables are registered
/// from their models; rows are stored in model column order and shared with
/// readers behind `Arc`, so a bulk mutation replaces rows rather than
/// editing them in place.
///

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<BTreeMap<&'static str, Table>>,
}

#[derive(Debug)]
struct Table {
    model: &'static SourceModel,
    rows: Vec<Arc<Row>>,
    next_key: i64,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an empty table; registering twice keeps existing rows.
    pub fn register(&self, model: &'static SourceModel) {
        self.tables.write().entry(model.name).or_insert_with(|| Table {
            model,
            rows: Vec::new(),
            next_key: 1,
        });
    }

    /// Insert one row and return its primary key.
    ///
    /// Columns are reordered to the model; missing nullable columns become
    /// null and a missing primary key is assigned.
    pub fn insert(&self, model: &'static SourceModel, row: Row) -> Result<i64, InternalError> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(model.name)
            .ok_or_else(|| InternalError::store_not_found(model.name))?;

        for (name, _) in row.iter() {
            if !model.has_column(name) {
                return Err(InternalError::store_unsupported(format!(
                    "unknown column '{name}' for source '{}'",
                    model.name
                )));
            }
        }

        let key = match row.get(model.primary_key) {
            Some(Value::Int(key)) => *key,
            Some(Value::Null) | None => table.next_key,
            Some(other) => {
                return Err(InternalError::store_unsupported(format!(
                    "primary key '{}' must be an integer, found {}",
                    model.primary_key,
                    other.kind()
                )));
            }
        };
        if table.rows.iter().any(|existing| primary_key(model, existing) == Some(key)) {
            return Err(InternalError::store_conflict(format!(
                "duplicate primary key {key} for source '{}'",
                model.name
            )));
        }

        let mut stored = Row::new();
        for column in model.columns {
            let value = if column.name == model.primary_key {
                Value::Int(key)
            } else {
                row.get(column.name).cloned().unwrap_or_default()
            };
            check_column(model, column.name, &value)?;
            stored.set(column.name, value);
        }

        table.next_key = table.next_key.max(key.saturating_add(1));
        table.rows.push(stored.into_shared());

        Ok(key)
    }

    /// Row by primary key.
    #[must_use]
    pub fn get(&self, model: &'static SourceModel, key: i64) -> Option<Row> {
        self.tables.read().get(model.name).and_then(|table| {
            table
                .rows
                .iter()
                .find(|row| primary_key(model, row) == Some(key))
                .map(|row| Row::clone(row))
        })
    }

    /// Number of stored rows; zero for unregistered sources.
    #[must_use]
    pub fn len(&self, model: &'static SourceModel) -> usize {
        self.tables
            .read()
            .get(model.name)
            .map_or(0, |table| table.rows.len())
    }

    #[must_use]
    pub fn is_empty(&self, model: &'static SourceModel) -> bool {
        self.len(model) == 0
    }

    /// Drop every row of one table and restart key assignment.
    pub fn clear(&self, model: &'static SourceModel) {
        if let Some(table) = self.tables.write().get_mut(model.name) {
            table.rows.clear();
            table.next_key = 1;
        }
    }
}

impl RowSource for MemoryStore {
    fn scan(&self, source: &str) -> Result<Vec<Arc<Row>>, InternalError> {
        self.tables
            .read()
            .get(source)
            .map(|table| table.rows.clone())
            .ok_or_else(|| InternalError::store_not_found(source))
    }
}

impl BulkMutation for MemoryStore {
    fn update(
        &self,
        target: Source,
        predicate: &Predicate,
        assignments: &[Assignment],
    ) -> Result<u64, QueryError> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(target.name())
            .ok_or_else(|| InternalError::store_not_found(target.name()))?;
        let model = table.model;

        if let Some(assignment) = assignments
            .iter()
            .find(|assignment| assignment.column.name == model.primary_key)
        {
            return Err(InternalError::store_unsupported(format!(
                "primary key column '{}' cannot be updated",
                assignment.column
            ))
            .into());
        }

        // compute every replacement before touching the table
        let mut replacements = Vec::new();
        for (index, row) in table.rows.iter().enumerate() {
            if !matches_row(target, row, predicate)? {
                continue;
            }

            let mut updated = Row::clone(row);
            for assignment in assignments {
                let value = eval_on_row(target, row, &assignment.value)?;
                check_column(model, assignment.column.name, &value)?;
                updated.set(assignment.column.name, value);
            }
            replacements.push((index, updated.into_shared()));
        }

        let count = replacements.len() as u64;
        for (index, row) in replacements {
            table.rows[index] = row;
        }

        Ok(count)
    }

    fn delete(&self, target: Source, predicate: &Predicate) -> Result<u64, QueryError> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(target.name())
            .ok_or_else(|| InternalError::store_not_found(target.name()))?;

        let mut keep = Vec::with_capacity(table.rows.len());
        for row in &table.rows {
            keep.push(!matches_row(target, row, predicate)?);
        }

        let before = table.rows.len();
        let mut flags = keep.into_iter();
        table.rows.retain(|_| flags.next().unwrap_or(true));

        Ok((before - table.rows.len()) as u64)
    }
}

fn primary_key(model: &SourceModel, row: &Row) -> Option<i64> {
    row.get(model.primary_key).and_then(Value::as_int)
}

fn check_column(model: &SourceModel, name: &str, value: &Value) -> Result<(), InternalError> {
    let column = model.column(name).ok_or_else(|| {
        InternalError::store_unsupported(format!(
            "unknown column '{name}' for source '{}'",
            model.name
        ))
    })?;

    if value.is_null() {
        if column.nullable {
            return Ok(());
        }
        return Err(InternalError::store_unsupported(format!(
            "column '{}.{name}' is not nullable",
            model.name
        )));
    }

    if !value.kind().binds_to(column.kind) {
        return Err(InternalError::store_unsupported(format!(
            "column '{}.{name}' holds {}, found {}",
            model.name,
            column.kind,
            value.kind()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests;
