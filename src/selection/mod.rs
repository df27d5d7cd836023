//! Selection Tree Walker.
//!
//! A [`SelectionNode`] is one requested field plus its nested selections.
//! [`classify`] partitions the children of a node into scalar, to-one,
//! to-many and to-many-to-many selections using the
//! [`SchemaIndex`](crate::schema::SchemaIndex); every child lands in exactly
//! one bucket.

pub mod document;

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::error::{ResolveError, ResolveResult};
use crate::schema::{FieldDef, RelationKind, SchemaIndex, TypeRef};
use crate::value::InputValue;

/// Introspection field, never mapped to a column.
pub const TYPENAME_FIELD: &str = "__typename";

/// One requested field with its arguments and nested selections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionNode {
    pub name: String,
    pub arguments: IndexMap<String, InputValue>,
    pub children: Vec<SelectionNode>,
}

impl SelectionNode {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// A node with only leaf children, e.g. `leaves("author", &["name"])`.
    pub fn leaves(name: &str, children: &[&str]) -> Self {
        Self::new(name).with_children(children.iter().map(|c| SelectionNode::new(c)).collect())
    }

    pub fn with_children(mut self, children: Vec<SelectionNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_argument(mut self, name: &str, value: impl Into<InputValue>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }

    pub fn is_composite(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Whether a resolution yields one object or a list of objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    One,
    Many,
}

impl Cardinality {
    pub fn of(ty: &TypeRef) -> Self {
        if ty.list {
            Cardinality::Many
        } else {
            Cardinality::One
        }
    }
}

impl std::fmt::Display for Cardinality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cardinality::One => write!(f, "one"),
            Cardinality::Many => write!(f, "many"),
        }
    }
}

/// A to-one selection flattened into the parent statement.
#[derive(Debug, Clone)]
pub struct JoinSelection<'a> {
    pub field: &'a FieldDef,
    /// Requested columns of the target type.
    pub columns: Vec<&'a str>,
}

/// A to-many or to-many-to-many selection resolved separately.
#[derive(Debug, Clone, Copy)]
pub struct RelationSelection<'a> {
    pub node: &'a SelectionNode,
    pub field: &'a FieldDef,
}

impl RelationSelection<'_> {
    pub fn target_type(&self) -> &str {
        &self.field.ty.name
    }

    pub fn cardinality(&self) -> Cardinality {
        Cardinality::of(&self.field.ty)
    }
}

/// The children of one selection node, partitioned by relation kind.
#[derive(Debug, Clone, Default)]
pub struct ClassifiedSelection<'a> {
    pub scalars: Vec<&'a str>,
    pub to_one: Vec<JoinSelection<'a>>,
    pub to_many: Vec<RelationSelection<'a>>,
    pub to_many_many: Vec<RelationSelection<'a>>,
}

impl ClassifiedSelection<'_> {
    /// Any relation that needs the parent id after the statement ran.
    pub fn has_many_relations(&self) -> bool {
        !self.to_many.is_empty() || !self.to_many_many.is_empty()
    }
}

/// Partition the children of `node`, a selection on `type_name`.
///
/// With `strict`, a child that `type_name` does not define is a
/// [`ResolveError::SchemaFieldNotFound`]; otherwise it is treated as a plain
/// column. `__typename` is skipped and repeated fields are kept once.
pub fn classify<'a>(
    schema: &'a SchemaIndex,
    type_name: &str,
    node: &'a SelectionNode,
    strict: bool,
) -> ResolveResult<ClassifiedSelection<'a>> {
    let ty = schema
        .get_type(type_name)
        .ok_or_else(|| ResolveError::UnknownType(type_name.to_string()))?;

    let mut out = ClassifiedSelection::default();
    let mut seen = HashSet::new();

    for child in &node.children {
        if child.name == TYPENAME_FIELD || !seen.insert(child.name.as_str()) {
            continue;
        }

        let Some(field) = ty.get(&child.name) else {
            if strict {
                return Err(ResolveError::SchemaFieldNotFound {
                    type_name: type_name.to_string(),
                    field: child.name.clone(),
                });
            }
            out.scalars.push(&child.name);
            continue;
        };

        match field.relation {
            RelationKind::None => out.scalars.push(&child.name),
            RelationKind::ToOne => out.to_one.push(JoinSelection {
                field,
                columns: joined_columns(schema, &field.ty.name, child, strict)?,
            }),
            RelationKind::ToMany => out.to_many.push(RelationSelection { node: child, field }),
            RelationKind::ToManyMany { .. } => {
                out.to_many_many.push(RelationSelection { node: child, field })
            }
        }
    }

    Ok(out)
}

/// Leaf columns requested under a to-one selection.
fn joined_columns<'a>(
    schema: &SchemaIndex,
    target_type: &str,
    node: &'a SelectionNode,
    strict: bool,
) -> ResolveResult<Vec<&'a str>> {
    let target = schema.get_type(target_type);
    if strict && target.is_none() {
        return Err(ResolveError::UnknownType(target_type.to_string()));
    }

    let mut columns = Vec::new();
    for child in &node.children {
        if child.name == TYPENAME_FIELD || columns.contains(&child.name.as_str()) {
            continue;
        }
        match target.and_then(|t| t.get(&child.name)) {
            Some(field) if field.relation.is_relation() || child.is_composite() => {
                return Err(ResolveError::NestedRelationInJoin {
                    type_name: target_type.to_string(),
                    field: child.name.clone(),
                });
            }
            None if strict => {
                return Err(ResolveError::SchemaFieldNotFound {
                    type_name: target_type.to_string(),
                    field: child.name.clone(),
                });
            }
            _ => columns.push(child.name.as_str()),
        }
    }
    Ok(columns)
}
