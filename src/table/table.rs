#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use crate::table::cell::{Cell, Row};
use crate::table::column::Column;
use crate::types::{QvogError, Result};

/// Ordered, uniquely named columns of equal length.
///
/// The first column fixes the table size. Later columns and the table are
/// padded to the larger of the two sizes, so every column always has
/// exactly [`size`](Table::size) cells. A table whose only columns are
/// predicate columns reports the predicate sentinel size.
#[derive(Clone, Debug)]
pub struct Table {
    name: String,
    size: isize,
    columns: Vec<Column>,
}

impl Table {
    /// Empty table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: 0,
            columns: Vec::new(),
        }
    }

    /// Table holding a single column.
    pub fn with_column(name: impl Into<String>, column: impl Into<Column>) -> Self {
        let column = column.into();
        Self {
            name: name.into(),
            size: column.size(),
            columns: vec![column],
        }
    }

    /// Table name, used as its alias in a [`TableSet`].
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Same table under another name.
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Number of rows.
    pub fn size(&self) -> isize {
        self.size
    }

    /// Number of rows, clamped at zero.
    pub fn row_count(&self) -> usize {
        self.size.max(0) as usize
    }

    /// Columns in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in order.
    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    /// Whether a column is named `name`.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column.name() == name)
    }

    /// Column by name.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|column| column.name() == name)
            .ok_or_else(|| QvogError::not_found("column", name))
    }

    /// Appends a column, padding with [`Cell::Null`].
    pub fn add_column(&mut self, column: impl Into<Column>) -> Result<()> {
        self.add_column_with_default(column, Cell::Null)
    }

    /// Appends a column, padding the shorter side with `default`.
    pub fn add_column_with_default(&mut self, column: impl Into<Column>, default: Cell) -> Result<()> {
        let mut column = column.into();
        if self.has_column(column.name()) {
            return Err(QvogError::duplicate("column", column.name()));
        }
        if self.columns.is_empty() {
            self.size = column.size();
            self.columns.push(column);
            return Ok(());
        }

        let target = self.size.max(column.size());
        if self.size < target && self.columns.iter().any(Column::is_predicate) {
            return Err(QvogError::unsupported("pad a predicate column"));
        }
        column.pad(&default, (target - column.size()) as usize)?;
        let missing = (target - self.size) as usize;
        for existing in &mut self.columns {
            existing.pad(&default, missing)?;
        }
        self.size = target;
        self.columns.push(column);
        Ok(())
    }

    /// Removes a column by name.
    pub fn remove_column(&mut self, name: &str) -> Result<Column> {
        let pos = self
            .columns
            .iter()
            .position(|column| column.name() == name)
            .ok_or_else(|| QvogError::not_found("column", name))?;
        let column = self.columns.remove(pos);
        if self.columns.is_empty() {
            self.size = 0;
        }
        Ok(column)
    }

    /// Appends a row; columns without a matching key receive [`Cell::Null`].
    pub fn add_row(&mut self, mut row: Row) -> Result<()> {
        if self.columns.iter().any(Column::is_predicate) {
            return Err(QvogError::unsupported("add a row to a table with a predicate column"));
        }
        for column in &mut self.columns {
            let cell = row.remove(column.name()).unwrap_or_default();
            column.add_value(cell)?;
        }
        self.size += 1;
        Ok(())
    }

    /// Row `index` keyed by column name.
    pub fn row(&self, index: usize) -> Result<Row> {
        self.check_row(index)?;
        self.columns
            .iter()
            .map(|column| Ok((column.name().to_string(), column.value(index)?.clone())))
            .collect()
    }

    /// Row `index` in column order.
    pub fn row_without_header(&self, index: usize) -> Result<Vec<Cell>> {
        self.check_row(index)?;
        self.columns
            .iter()
            .map(|column| column.value(index).cloned())
            .collect()
    }

    /// Rows in order.
    pub fn rows(&self) -> impl Iterator<Item = Result<Row>> + '_ {
        (0..self.row_count()).map(move |index| self.row(index))
    }

    /// Copy of the table; `schema_only` keeps the columns but no rows.
    pub fn duplicate(&self, schema_only: bool) -> Table {
        let size = if schema_only { self.size.min(0) } else { self.size };
        Table {
            name: self.name.clone(),
            size,
            columns: self
                .columns
                .iter()
                .map(|column| column.duplicate(schema_only))
                .collect(),
        }
    }

    /// The only column.
    pub fn as_column(&self) -> Result<&Column> {
        match self.columns.as_slice() {
            [column] => Ok(column),
            columns => Err(QvogError::NotExactlyOne {
                kind: "column",
                found: columns.len(),
            }),
        }
    }

    /// Consumes the table, returning its only column.
    pub fn into_column(mut self) -> Result<Column> {
        if self.columns.len() != 1 {
            return Err(QvogError::NotExactlyOne {
                kind: "column",
                found: self.columns.len(),
            });
        }
        Ok(self.columns.remove(0))
    }

    fn check_row(&self, index: usize) -> Result<()> {
        if index >= self.row_count() {
            return Err(QvogError::not_found(
                "row",
                format!("{index} of table {}", self.name),
            ));
        }
        Ok(())
    }
}

/// Tables keyed by alias.
#[derive(Clone, Debug, Default)]
pub struct TableSet {
    tables: BTreeMap<String, Table>,
}

impl TableSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `table` under its name.
    pub fn add_table(&mut self, table: Table) -> Result<()> {
        if self.tables.contains_key(table.name()) {
            return Err(QvogError::duplicate("table", table.name()));
        }
        self.tables.insert(table.name().to_string(), table);
        Ok(())
    }

    /// Removes the table registered under `alias`.
    pub fn remove_table(&mut self, alias: &str) -> Result<Table> {
        self.tables
            .remove(alias)
            .ok_or_else(|| QvogError::not_found("table", alias))
    }

    /// Table registered under `alias`.
    pub fn table(&self, alias: &str) -> Result<&Table> {
        self.tables
            .get(alias)
            .ok_or_else(|| QvogError::not_found("table", alias))
    }

    /// Whether `alias` is registered.
    pub fn has_table(&self, alias: &str) -> bool {
        self.tables.contains_key(alias)
    }

    /// Number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// `true` without tables.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Registered aliases.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Moves every table of `other` into this set.
    pub fn merge(&mut self, other: TableSet) -> Result<()> {
        if let Some(alias) = other.aliases().find(|alias| self.has_table(alias)) {
            return Err(QvogError::duplicate("table", alias));
        }
        self.tables.extend(other.tables);
        Ok(())
    }

    /// The only table.
    pub fn as_table(&self) -> Result<&Table> {
        match self.tables.len() {
            1 => self
                .tables
                .values()
                .next()
                .ok_or_else(|| QvogError::NotExactlyOne { kind: "table", found: 0 }),
            found => Err(QvogError::NotExactlyOne {
                kind: "table",
                found,
            }),
        }
    }

    /// Consumes the set, returning its only table.
    pub fn into_table(self) -> Result<Table> {
        let found = self.tables.len();
        match self.tables.into_values().next() {
            Some(table) if found == 1 => Ok(table),
            _ => Err(QvogError::NotExactlyOne {
                kind: "table",
                found,
            }),
        }
    }
}
