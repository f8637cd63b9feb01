use crate::{
    db::{
        query::{
            QueryError,
            intent::{QuerySpec, SelectItem, SelectList},
        },
        row::{Row, Tuple},
    },
    value::{FromValue, Value, ValueConversionError, ValueKind},
};
use std::marker::PhantomData;
use thiserror::Error as ThisError;

///
/// ProjectionError
///
/// Mismatch between a query's select list and the requested output shape.
/// Statically known mismatches are reported when the projection is chosen;
/// value-level mismatches (a null or float landing in the wrong field)
/// surface during execution.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum ProjectionError {
    #[error("projection expects {expected} column(s), query selects {found}")]
    Arity { expected: usize, found: usize },

    #[error("column {position} ('{label}') cannot be converted: {source}")]
    Conversion {
        position: usize,
        label: String,
        source: ValueConversionError,
    },

    #[error("label '{label}' appears more than once; alias one of the columns")]
    DuplicateLabel { label: String },

    #[error("entity projection requires a whole-row select")]
    NotWholeRow,

    #[error("column {position} ('{label}') of kind {kind} does not bind to the target field")]
    Type {
        position: usize,
        label: String,
        kind: ValueKind,
    },

    #[error("no property '{property}' on the target type")]
    UnknownProperty { property: String },
}

///
/// FetchedRow
/// Row loaded through a fetch join; `None` when a left join found no match.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FetchedRow {
    pub alias: &'static str,
    pub row: Option<Row>,
}

///
/// ProjectedRow
/// Executor output for one result row, before it is shaped by a projector.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectedRow {
    pub tuple: Tuple,
    pub fetched: Vec<FetchedRow>,
}

///
/// Projector
///
/// Output shape of a typed query. `check` runs when the projection is
/// chosen; `project` runs once per result row.
///

pub trait Projector {
    type Output;

    fn check(spec: &QuerySpec) -> Result<(), ProjectionError>;

    fn project(row: ProjectedRow) -> Result<Self::Output, ProjectionError>;
}

///
/// TypedQuery
///
/// Validated query bound to an output shape.
///

pub struct TypedQuery<P> {
    spec: QuerySpec,
    _marker: PhantomData<fn() -> P>,
}

impl<P> Clone for TypedQuery<P> {
    fn clone(&self) -> Self {
        Self {
            spec: self.spec.clone(),
            _marker: PhantomData,
        }
    }
}

impl<P> std::fmt::Debug for TypedQuery<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedQuery")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

impl<P: Projector> TypedQuery<P> {
    pub fn new(spec: QuerySpec) -> Result<Self, QueryError> {
        P::check(&spec)?;

        Ok(Self {
            spec,
            _marker: PhantomData,
        })
    }

    #[must_use]
    pub const fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    #[must_use]
    pub fn into_spec(self) -> QuerySpec {
        self.spec
    }

    /// Same projection over an explicit window.
    #[must_use]
    pub fn with_window(&self, offset: u64, limit: Option<u64>) -> Self {
        Self {
            spec: self.spec.with_window(offset, limit),
            _marker: PhantomData,
        }
    }
}

impl QuerySpec {
    /// Project into the given shape.
    pub fn project<P: Projector>(self) -> Result<TypedQuery<P>, QueryError> {
        TypedQuery::new(self)
    }

    /// Labelled tuples in select-list order.
    pub fn tuples(self) -> Result<TypedQuery<AsTuple>, QueryError> {
        self.project()
    }

    /// Dynamic rows keyed by select labels.
    pub fn rows(self) -> Result<TypedQuery<AsRow>, QueryError> {
        self.project()
    }

    /// Whole rows of the selected source plus fetch-joined rows.
    pub fn entities(self) -> Result<TypedQuery<AsEntity>, QueryError> {
        self.project()
    }

    /// Single-column results decoded as `T`.
    pub fn scalars<T: FromValue>(self) -> Result<TypedQuery<AsScalar<T>>, QueryError> {
        self.project()
    }

    /// Positional construction of `T` from the select list.
    pub fn constructor<T: FromTuple>(self) -> Result<TypedQuery<AsConstructor<T>>, QueryError> {
        self.project()
    }

    /// Property-by-label population of a default-constructed `T`.
    pub fn bean<T: Bean>(self) -> Result<TypedQuery<AsBean<T>>, QueryError> {
        self.project()
    }
}

///
/// AsTuple
///

#[derive(Clone, Copy, Debug)]
pub struct AsTuple;

impl Projector for AsTuple {
    type Output = Tuple;

    fn check(_: &QuerySpec) -> Result<(), ProjectionError> {
        Ok(())
    }

    fn project(row: ProjectedRow) -> Result<Tuple, ProjectionError> {
        Ok(row.tuple)
    }
}

///
/// AsRow
///

#[derive(Clone, Copy, Debug)]
pub struct AsRow;

impl Projector for AsRow {
    type Output = Row;

    fn check(spec: &QuerySpec) -> Result<(), ProjectionError> {
        let mut seen = Vec::new();
        for item in spec.select_items() {
            let label = item.label();
            if seen.contains(&label) {
                return Err(ProjectionError::DuplicateLabel { label });
            }
            seen.push(label);
        }

        Ok(())
    }

    fn project(row: ProjectedRow) -> Result<Row, ProjectionError> {
        Row::try_from(row.tuple)
    }
}

// A row is keyed by name, so every tuple label must be distinct.
impl TryFrom<Tuple> for Row {
    type Error = ProjectionError;

    fn try_from(tuple: Tuple) -> Result<Self, Self::Error> {
        let mut row = Self::new();
        for (label, value) in tuple {
            if row.get(&label).is_some() {
                return Err(ProjectionError::DuplicateLabel { label });
            }
            row.set(label, value);
        }

        Ok(row)
    }
}

///
/// EntityRow
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EntityRow {
    pub row: Row,
    pub fetched: Vec<FetchedRow>,
}

impl EntityRow {
    /// Row fetched under `alias`, if it was fetch-joined and matched.
    #[must_use]
    pub fn fetched(&self, alias: &str) -> Option<&Row> {
        self.fetched
            .iter()
            .find(|fetched| fetched.alias == alias)
            .and_then(|fetched| fetched.row.as_ref())
    }

    /// Whether `alias` was loaded in the same execution.
    #[must_use]
    pub fn is_loaded(&self, alias: &str) -> bool {
        self.fetched.iter().any(|fetched| fetched.alias == alias)
    }
}

///
/// AsEntity
///

#[derive(Clone, Copy, Debug)]
pub struct AsEntity;

impl Projector for AsEntity {
    type Output = EntityRow;

    fn check(spec: &QuerySpec) -> Result<(), ProjectionError> {
        match spec.select_list() {
            SelectList::Source(_) => Ok(()),
            SelectList::Items(_) => Err(ProjectionError::NotWholeRow),
        }
    }

    fn project(row: ProjectedRow) -> Result<EntityRow, ProjectionError> {
        Ok(EntityRow {
            row: Row::try_from(row.tuple)?,
            fetched: row.fetched,
        })
    }
}

///
/// AsScalar
///

pub struct AsScalar<T>(PhantomData<fn() -> T>);

impl<T: FromValue> Projector for AsScalar<T> {
    type Output = T;

    fn check(spec: &QuerySpec) -> Result<(), ProjectionError> {
        check_positional(spec, 1, |_, kind| T::accepts(kind))
    }

    fn project(row: ProjectedRow) -> Result<T, ProjectionError> {
        let found = row.tuple.len();
        let label = row.tuple.labels().first().cloned().unwrap_or_default();
        let mut values = row.tuple.into_values();
        if found != 1 {
            return Err(ProjectionError::Arity { expected: 1, found });
        }

        T::from_value(values.remove(0)).map_err(|source| ProjectionError::Conversion {
            position: 0,
            label,
            source,
        })
    }
}

///
/// FromTuple
///
/// Constructor-style projection: `T` is built from the select list by
/// position, like calling a constructor with one argument per column.
///

pub trait FromTuple: Sized {
    type Args: ProjectionArgs;

    fn from_args(args: Self::Args) -> Self;
}

///
/// ProjectionArgs
/// Positional argument list decoded from projected values.
///

pub trait ProjectionArgs: Sized {
    const ARITY: usize;

    fn accepts(position: usize, kind: ValueKind) -> bool;

    fn decode(tuple: Tuple) -> Result<Self, ProjectionError>;
}

macro_rules! impl_projection_args {
    ($arity:literal; $($name:ident => $idx:tt),+) => {
        impl<$($name: FromValue),+> ProjectionArgs for ($($name,)+) {
            const ARITY: usize = $arity;

            fn accepts(position: usize, kind: ValueKind) -> bool {
                match position {
                    $($idx => $name::accepts(kind),)+
                    _ => false,
                }
            }

            fn decode(tuple: Tuple) -> Result<Self, ProjectionError> {
                if tuple.len() != $arity {
                    return Err(ProjectionError::Arity {
                        expected: $arity,
                        found: tuple.len(),
                    });
                }

                let labels = tuple.labels().to_vec();
                let mut values = tuple.into_values().into_iter();

                Ok(($(
                    $name::from_value(values.next().unwrap_or_default()).map_err(|source| {
                        ProjectionError::Conversion {
                            position: $idx,
                            label: labels[$idx].clone(),
                            source,
                        }
                    })?,
                )+))
            }
        }
    };
}

impl_projection_args!(1; A => 0);
impl_projection_args!(2; A => 0, B => 1);
impl_projection_args!(3; A => 0, B => 1, C => 2);
impl_projection_args!(4; A => 0, B => 1, C => 2, D => 3);
impl_projection_args!(5; A => 0, B => 1, C => 2, D => 3, E => 4);
impl_projection_args!(6; A => 0, B => 1, C => 2, D => 3, E => 4, F => 5);

///
/// AsConstructor
///

pub struct AsConstructor<T>(PhantomData<fn() -> T>);

impl<T: FromTuple> Projector for AsConstructor<T> {
    type Output = T;

    fn check(spec: &QuerySpec) -> Result<(), ProjectionError> {
        check_positional(spec, T::Args::ARITY, T::Args::accepts)
    }

    fn project(row: ProjectedRow) -> Result<T, ProjectionError> {
        T::Args::decode(row.tuple).map(T::from_args)
    }
}

///
/// Bean
///
/// Setter-style projection: a default-constructed `T` receives one
/// property per select label. Every label must name a declared property.
///

pub trait Bean: Default {
    /// Declared properties and the kind each one holds.
    const PROPERTIES: &'static [(&'static str, ValueKind)];

    fn set(&mut self, property: &str, value: Value) -> Result<(), ValueConversionError>;
}

///
/// AsBean
///

pub struct AsBean<T>(PhantomData<fn() -> T>);

impl<T: Bean> Projector for AsBean<T> {
    type Output = T;

    fn check(spec: &QuerySpec) -> Result<(), ProjectionError> {
        let kinds = spec.output_kinds();

        for (position, item) in spec.select_items().iter().enumerate() {
            let label = item.label();
            let Some((_, declared)) = T::PROPERTIES.iter().find(|(name, _)| *name == label)
            else {
                return Err(ProjectionError::UnknownProperty { property: label });
            };

            if let Some(kind) = kinds[position]
                && !kind.binds_to(*declared)
            {
                return Err(type_error(spec, position, kind));
            }
        }

        Ok(())
    }

    fn project(row: ProjectedRow) -> Result<T, ProjectionError> {
        let mut bean = T::default();

        for (position, (label, value)) in row.tuple.into_iter().enumerate() {
            if !T::PROPERTIES.iter().any(|(name, _)| *name == label) {
                return Err(ProjectionError::UnknownProperty { property: label });
            }
            bean.set(&label, value)
                .map_err(|source| ProjectionError::Conversion {
                    position,
                    label,
                    source,
                })?;
        }

        Ok(bean)
    }
}

fn check_positional(
    spec: &QuerySpec,
    expected: usize,
    accepts: impl Fn(usize, ValueKind) -> bool,
) -> Result<(), ProjectionError> {
    let kinds = spec.output_kinds();
    if kinds.len() != expected {
        return Err(ProjectionError::Arity {
            expected,
            found: kinds.len(),
        });
    }

    for (position, kind) in kinds.into_iter().enumerate() {
        if let Some(kind) = kind
            && !accepts(position, kind)
        {
            return Err(type_error(spec, position, kind));
        }
    }

    Ok(())
}

fn type_error(spec: &QuerySpec, position: usize, kind: ValueKind) -> ProjectionError {
    let label = spec
        .select_items()
        .get(position)
        .map(SelectItem::label)
        .unwrap_or_default();

    ProjectionError::Type {
        position,
        label,
        kind,
    }
}
