//! Schema Directive Index.
//!
//! A typed, immutable view over the GraphQL object types the resolver walks:
//! type name -> ordered fields -> declared type + relation kind.
//!
//! Relation kinds come from field directives:
//!
//! ```graphql
//! type Post {
//!   id: Int
//!   author: User @toOne
//!   comments: [Comment] @toMany
//!   tags: [Tag] @toManyMany @first
//! }
//! ```
//!
//! Lookups are lenient: an unknown type or field reports
//! [`RelationKind::None`]. Deciding whether that is an error belongs to the
//! selection walker.

pub mod sdl;

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;

use crate::error::{SchemaError, SchemaResult};
use crate::reshape::NESTING_DELIMITER;

/// Default name of the root query type.
pub const DEFAULT_QUERY_TYPE: &str = "Query";

/// How a field relates its owning type to its target type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelationKind {
    /// Plain column (or unknown field).
    #[default]
    None,
    /// Foreign key `<field>Id` on the owning table, resolved by join.
    ToOne,
    /// Foreign key `<ownerType>Id` on the target table.
    ToMany,
    /// Pivot table; `first` puts the owning table first in the pivot name.
    ToManyMany { first: bool },
}

impl RelationKind {
    pub fn is_relation(&self) -> bool {
        !matches!(self, RelationKind::None)
    }
}

/// A declared GraphQL type, unwrapped to at most one list level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    /// Innermost named type.
    pub name: String,
    pub list: bool,
    pub nullable: bool,
}

impl TypeRef {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.into(),
            list: false,
            nullable: true,
        }
    }

    pub fn list_of(name: &str) -> Self {
        Self {
            name: name.into(),
            list: true,
            nullable: true,
        }
    }

    pub fn non_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bang = if self.nullable { "" } else { "!" };
        if self.list {
            write!(f, "[{}]{}", self.name, bang)
        } else {
            write!(f, "{}{}", self.name, bang)
        }
    }
}

/// A field on a [`SchemaType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeRef,
    pub relation: RelationKind,
}

impl FieldDef {
    pub fn new(name: &str, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            relation: RelationKind::None,
        }
    }

    pub fn with_relation(mut self, relation: RelationKind) -> Self {
        self.relation = relation;
        self
    }
}

/// A named entity type with its fields in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaType {
    pub name: String,
    fields: IndexMap<String, FieldDef>,
}

impl SchemaType {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
        }
    }

    /// Add a field, rejecting duplicates and names holding the nesting delimiter.
    pub fn add_field(&mut self, field: FieldDef) -> SchemaResult<()> {
        self.check_name(&field.name)?;
        if self.fields.contains_key(&field.name) {
            return Err(SchemaError::DuplicateField {
                type_name: self.name.clone(),
                field: field.name,
            });
        }
        self.fields.insert(field.name.clone(), field);
        Ok(())
    }

    /// Builder form of [`SchemaType::add_field`] for hand-built schemas.
    ///
    /// A duplicate replaces the earlier definition.
    pub fn field(mut self, name: &str, ty: TypeRef, relation: RelationKind) -> Self {
        self.fields
            .insert(name.into(), FieldDef::new(name, ty).with_relation(relation));
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldDef> {
        self.fields.get(field)
    }

    /// Joined columns are aliased `<relation>__<column>`, so a field name
    /// holding the delimiter would be read back as a nested object.
    fn check_name(&self, field: &str) -> SchemaResult<()> {
        if field.contains(NESTING_DELIMITER) {
            return Err(SchemaError::ReservedFieldName {
                type_name: self.name.clone(),
                field: field.to_string(),
            });
        }
        Ok(())
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.values()
    }
}

/// Index over every object type of a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaIndex {
    types: HashMap<String, SchemaType>,
    query_type: String,
}

impl Default for SchemaIndex {
    fn default() -> Self {
        Self::new(DEFAULT_QUERY_TYPE)
    }
}

impl SchemaIndex {
    pub fn new(query_type: &str) -> Self {
        Self {
            types: HashMap::new(),
            query_type: query_type.into(),
        }
    }

    /// Add a type, rejecting duplicates.
    pub fn add_type(&mut self, ty: SchemaType) -> SchemaResult<()> {
        if self.types.contains_key(&ty.name) {
            return Err(SchemaError::DuplicateType(ty.name));
        }
        self.types.insert(ty.name.clone(), ty);
        Ok(())
    }

    /// Builder form of [`SchemaIndex::add_type`]; a duplicate replaces the earlier type.
    pub fn with_type(mut self, ty: SchemaType) -> Self {
        self.types.insert(ty.name.clone(), ty);
        self
    }

    pub fn query_type_name(&self) -> &str {
        &self.query_type
    }

    pub fn get_type(&self, name: &str) -> Option<&SchemaType> {
        self.types.get(name)
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn field(&self, type_name: &str, field: &str) -> Option<&FieldDef> {
        self.types.get(type_name)?.get(field)
    }

    /// Relation kind of `type_name.field`; `None` when undefined or undecorated.
    pub fn relation_kind_of(&self, type_name: &str, field: &str) -> RelationKind {
        self.field(type_name, field)
            .map(|f| f.relation)
            .unwrap_or_default()
    }

    /// Innermost declared type name of `type_name.field`.
    pub fn target_type_of(&self, type_name: &str, field: &str) -> Option<&str> {
        self.field(type_name, field).map(|f| f.ty.name.as_str())
    }

    /// A field on the root query type.
    pub fn query_field(&self, field: &str) -> Option<&FieldDef> {
        self.field(&self.query_type, field)
    }

    /// Check that the query type exists and no field name holds the
    /// nesting delimiter.
    pub fn validate(&self) -> SchemaResult<()> {
        if !self.has_type(&self.query_type) {
            return Err(SchemaError::MissingQueryType(self.query_type.clone()));
        }
        for ty in self.types.values() {
            for field in ty.fields.keys() {
                ty.check_name(field)?;
            }
        }
        Ok(())
    }
}
