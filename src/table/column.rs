#![forbid(unsafe_code)]

use rustc_hash::FxHashMap;

use crate::query::predicate::ValuePredicate;
use crate::table::cell::Cell;
use crate::types::{QvogError, Result, VertexId};

/// Size reported by predicate columns, which hold no data.
pub const PREDICATE_SIZE: isize = -1;

/// Materialized values with optional vertex-id index.
#[derive(Clone, Debug)]
pub struct DataColumn {
    name: String,
    values: Vec<Cell>,
    index: Option<FxHashMap<VertexId, usize>>,
}

impl DataColumn {
    /// Empty column; `indexed` enables id lookups.
    pub fn new(name: impl Into<String>, indexed: bool) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
            index: indexed.then(FxHashMap::default),
        }
    }

    /// Column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// `true` without cells.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether id lookups are available.
    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }

    /// Appends a cell; bound values are recorded in the index.
    pub fn add_value(&mut self, cell: Cell) {
        if let (Some(index), Some(id)) = (
            self.index.as_mut(),
            cell.as_value().and_then(|value| value.bound_id()),
        ) {
            index.entry(id).or_insert(self.values.len());
        }
        self.values.push(cell);
    }

    /// Membership by value identity.
    pub fn contains_value(&self, cell: &Cell) -> bool {
        if let (Some(index), Some(id)) = (
            self.index.as_ref(),
            cell.as_value().and_then(|value| value.bound_id()),
        ) {
            return index.contains_key(&id);
        }
        self.values.iter().any(|existing| existing == cell)
    }

    /// First cell holding a value bound to `id`.
    pub fn value_with_key(&self, id: VertexId) -> Result<Option<&Cell>> {
        let index = self
            .index
            .as_ref()
            .ok_or_else(|| QvogError::unsupported("key lookup on a column without index"))?;
        Ok(index.get(&id).map(|&row| &self.values[row]))
    }

    /// Whether a value bound to `id` was added.
    pub fn contains_key(&self, id: VertexId) -> Result<bool> {
        self.value_with_key(id).map(|cell| cell.is_some())
    }
}

/// Membership test without data.
#[derive(Clone, Debug)]
pub struct PredicateColumn {
    name: String,
    predicate: ValuePredicate,
}

impl PredicateColumn {
    /// Column answering membership with `predicate`.
    pub fn new(name: impl Into<String>, predicate: ValuePredicate) -> Self {
        Self {
            name: name.into(),
            predicate,
        }
    }

    /// Stored predicate.
    pub fn predicate(&self) -> &ValuePredicate {
        &self.predicate
    }
}

/// Arbitrary cells without identity semantics.
#[derive(Clone, Debug)]
pub struct AnyColumn {
    name: String,
    values: Vec<Cell>,
}

impl AnyColumn {
    /// Empty column.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
        }
    }

    /// Column of `len` copies of `cell`.
    pub fn filled(name: impl Into<String>, cell: Cell, len: usize) -> Self {
        Self {
            name: name.into(),
            values: vec![cell; len],
        }
    }
}

/// Named column of a [`Table`](crate::table::Table).
#[derive(Clone, Debug)]
pub enum Column {
    /// Materialized values.
    Data(DataColumn),
    /// Predicate-only membership.
    Predicate(PredicateColumn),
    /// Computed cells.
    Any(AnyColumn),
}

impl Column {
    /// Column name.
    pub fn name(&self) -> &str {
        match self {
            Column::Data(column) => &column.name,
            Column::Predicate(column) => &column.name,
            Column::Any(column) => &column.name,
        }
    }

    /// Number of cells; [`PREDICATE_SIZE`] for predicate columns.
    pub fn size(&self) -> isize {
        match self {
            Column::Data(column) => column.values.len() as isize,
            Column::Predicate(_) => PREDICATE_SIZE,
            Column::Any(column) => column.values.len() as isize,
        }
    }

    /// `true` only when the size is exactly zero.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// `true` for predicate columns.
    pub fn is_predicate(&self) -> bool {
        matches!(self, Column::Predicate(_))
    }

    /// Whether id lookups are available.
    pub fn has_index(&self) -> bool {
        matches!(self, Column::Data(column) if column.has_index())
    }

    /// Appends a cell.
    pub fn add_value(&mut self, cell: Cell) -> Result<()> {
        match self {
            Column::Data(column) => {
                column.add_value(cell);
                Ok(())
            }
            Column::Predicate(_) => Err(QvogError::unsupported("add value to a predicate column")),
            Column::Any(column) => {
                column.values.push(cell);
                Ok(())
            }
        }
    }

    /// Appends `count` copies of `cell`.
    pub fn pad(&mut self, cell: &Cell, count: usize) -> Result<()> {
        for _ in 0..count {
            self.add_value(cell.clone())?;
        }
        Ok(())
    }

    /// Cell at `row`.
    pub fn value(&self, row: usize) -> Result<&Cell> {
        self.cells()?
            .get(row)
            .ok_or_else(|| QvogError::not_found("row", format!("{row} of column {}", self.name())))
    }

    /// All cells in row order.
    pub fn cells(&self) -> Result<&[Cell]> {
        match self {
            Column::Data(column) => Ok(&column.values),
            Column::Predicate(_) => Err(QvogError::unsupported("read a predicate column")),
            Column::Any(column) => Ok(&column.values),
        }
    }

    /// Membership test: identity for data columns, the predicate for
    /// predicate columns, equality for any columns.
    pub fn contains_value(&self, cell: &Cell) -> bool {
        match self {
            Column::Data(column) => column.contains_value(cell),
            Column::Predicate(column) => cell
                .as_value()
                .map_or(false, |value| column.predicate.test(value)),
            Column::Any(column) => column.values.iter().any(|existing| existing == cell),
        }
    }

    /// Copy of the column; `schema_only` drops the cells.
    pub fn duplicate(&self, schema_only: bool) -> Column {
        match self {
            Column::Data(column) if schema_only => {
                Column::Data(DataColumn::new(column.name.clone(), column.has_index()))
            }
            Column::Any(column) if schema_only => Column::Any(AnyColumn::new(column.name.clone())),
            other => other.clone(),
        }
    }

    /// Drops every cell.
    pub fn clear(&mut self) {
        *self = self.duplicate(true);
    }
}

impl From<DataColumn> for Column {
    fn from(column: DataColumn) -> Self {
        Column::Data(column)
    }
}

impl From<PredicateColumn> for Column {
    fn from(column: PredicateColumn) -> Self {
        Column::Predicate(column)
    }
}

impl From<AnyColumn> for Column {
    fn from(column: AnyColumn) -> Self {
        Column::Any(column)
    }
}
