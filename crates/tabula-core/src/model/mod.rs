//! Schema descriptors.
//!
//! Sources and columns are declared as `static` constants by the crate that
//! owns the data; nothing here is generated.

use crate::value::ValueKind;

///
/// SourceModel
/// Runtime metadata for one row source (table).
///

#[derive(Debug, Eq, PartialEq)]
pub struct SourceModel {
    /// Source name as registered with the row source.
    pub name: &'static str,
    /// Column holding the primary key; assigned by stores on insert.
    pub primary_key: &'static str,
    /// Declared columns in storage order.
    pub columns: &'static [ColumnModel],
}

impl SourceModel {
    #[must_use]
    pub const fn new(
        name: &'static str,
        primary_key: &'static str,
        columns: &'static [ColumnModel],
    ) -> Self {
        Self {
            name,
            primary_key,
            columns,
        }
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnModel> {
        self.columns.iter().find(|column| column.name == name)
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    #[must_use]
    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }
}

///
/// ColumnModel
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ColumnModel {
    pub name: &'static str,
    pub kind: ValueKind,
    pub nullable: bool,
}

impl ColumnModel {
    #[must_use]
    pub const fn new(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            kind,
            nullable: false,
        }
    }

    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}
