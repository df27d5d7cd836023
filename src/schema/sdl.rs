//! Build a [`SchemaIndex`] from GraphQL SDL.
//!
//! Object and interface types are indexed; `extend type` adds fields to an
//! existing type. A `schema { query: ... }` block renames the root query
//! type. Directive definitions, scalars, enums, unions and input objects are
//! skipped.

use async_graphql_parser::parse_schema;
use async_graphql_parser::types::{
    BaseType, ConstDirective, FieldDefinition, Type, TypeKind, TypeSystemDefinition,
};
use async_graphql_parser::Positioned;

use super::{FieldDef, RelationKind, SchemaIndex, SchemaType, TypeRef, DEFAULT_QUERY_TYPE};
use crate::error::{SchemaError, SchemaResult};

const TO_ONE: &str = "toOne";
const TO_MANY: &str = "toMany";
const TO_MANY_MANY: &str = "toManyMany";
const FIRST: &str = "first";

impl SchemaIndex {
    /// Parse SDL and index its object types.
    pub fn from_sdl(sdl: &str) -> SchemaResult<Self> {
        let document = parse_schema(sdl).map_err(|e| SchemaError::Parse(e.to_string()))?;

        let mut query_type = DEFAULT_QUERY_TYPE.to_string();
        let mut types: Vec<SchemaType> = Vec::new();
        let mut extensions: Vec<SchemaType> = Vec::new();

        for definition in document.definitions {
            match definition {
                TypeSystemDefinition::Schema(schema) => {
                    if let Some(query) = &schema.node.query {
                        query_type = query.node.to_string();
                    }
                }
                TypeSystemDefinition::Type(def) => {
                    let def = def.node;
                    let fields = match &def.kind {
                        TypeKind::Object(object) => &object.fields,
                        TypeKind::Interface(interface) => &interface.fields,
                        _ => continue,
                    };

                    let mut ty = SchemaType::new(def.name.node.as_str());
                    for field in fields {
                        ty.add_field(field_def(&ty.name, &field.node)?)?;
                    }

                    if def.extend {
                        extensions.push(ty);
                    } else {
                        types.push(ty);
                    }
                }
                TypeSystemDefinition::Directive(_) => {}
            }
        }

        let mut index = SchemaIndex::new(&query_type);
        for ty in types {
            index.add_type(ty)?;
        }
        for extension in extensions {
            match index.types.get_mut(&extension.name) {
                Some(existing) => {
                    for field in extension.fields.into_values() {
                        existing.add_field(field)?;
                    }
                }
                None => index.add_type(extension)?,
            }
        }

        log::debug!(
            "indexed {} schema types (query type `{}`)",
            index.types.len(),
            index.query_type
        );
        Ok(index)
    }
}

fn field_def(type_name: &str, field: &FieldDefinition) -> SchemaResult<FieldDef> {
    let name = field.name.node.as_str();
    let relation = relation_kind(type_name, name, &field.directives)?;
    Ok(FieldDef::new(name, type_ref(&field.ty.node)).with_relation(relation))
}

fn relation_kind(
    type_name: &str,
    field: &str,
    directives: &[Positioned<ConstDirective>],
) -> SchemaResult<RelationKind> {
    let has = |name: &str| directives.iter().any(|d| d.node.name.node.as_str() == name);

    let declared: Vec<RelationKind> = [
        (TO_ONE, RelationKind::ToOne),
        (TO_MANY, RelationKind::ToMany),
        (
            TO_MANY_MANY,
            RelationKind::ToManyMany { first: has(FIRST) },
        ),
    ]
    .into_iter()
    .filter(|(directive, _)| has(directive))
    .map(|(_, kind)| kind)
    .collect();

    match declared.as_slice() {
        [] => Ok(RelationKind::None),
        [kind] => Ok(*kind),
        _ => Err(SchemaError::ConflictingDirectives {
            type_name: type_name.to_string(),
            field: field.to_string(),
        }),
    }
}

fn type_ref(ty: &Type) -> TypeRef {
    match &ty.base {
        BaseType::Named(name) => TypeRef {
            name: name.to_string(),
            list: false,
            nullable: ty.nullable,
        },
        BaseType::List(inner) => TypeRef {
            name: innermost_name(inner),
            list: true,
            nullable: ty.nullable,
        },
    }
}

fn innermost_name(ty: &Type) -> String {
    match &ty.base {
        BaseType::Named(name) => name.to_string(),
        BaseType::List(inner) => innermost_name(inner),
    }
}
