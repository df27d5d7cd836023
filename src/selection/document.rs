//! Convert a GraphQL executable document into [`SelectionNode`]s.
//!
//! Fragments (inline and named) are flattened into the selection that uses
//! them, `@skip` / `@include` are honoured and variables are substituted
//! into argument values.

use std::collections::HashMap;

use async_graphql_parser::parse_query;
use async_graphql_parser::types::{
    Directive, DocumentOperations, ExecutableDocument, FragmentDefinition, OperationDefinition,
    OperationType, Selection, SelectionSet,
};
use async_graphql_parser::Positioned;
use async_graphql_value::{Name, Value as GqlValue};
use indexmap::IndexMap;

use super::SelectionNode;
use crate::error::{ResolveError, ResolveResult};
use crate::value::{InputValue, ScalarValue};

/// Variables supplied alongside a query document.
pub type Variables = serde_json::Map<String, serde_json::Value>;

/// Parse `source` and return the root fields of the chosen query operation.
///
/// `operation_name` is required only when the document holds several operations.
pub fn parse_operation(
    source: &str,
    operation_name: Option<&str>,
    variables: &Variables,
) -> ResolveResult<Vec<SelectionNode>> {
    let document =
        parse_query(source).map_err(|e| ResolveError::InvalidDocument(e.to_string()))?;
    root_fields(&document, operation_name, variables)
}

/// Root fields of a query operation in an already parsed document.
pub fn root_fields(
    document: &ExecutableDocument,
    operation_name: Option<&str>,
    variables: &Variables,
) -> ResolveResult<Vec<SelectionNode>> {
    let operation = pick_operation(document, operation_name)?;
    if operation.ty != OperationType::Query {
        return Err(ResolveError::InvalidDocument(
            "only query operations can be resolved".into(),
        ));
    }

    let mut scope = Scope {
        fragments: &document.fragments,
        variables: variables.clone(),
        visiting: Vec::new(),
    };

    // Declared defaults fill in variables the caller left out.
    for definition in &operation.variable_definitions {
        let name = definition.node.name.node.to_string();
        if scope.variables.contains_key(&name) {
            continue;
        }
        if let Some(default) = &definition.node.default_value {
            let json = default
                .node
                .clone()
                .into_json()
                .map_err(|e| ResolveError::InvalidDocument(e.to_string()))?;
            scope.variables.insert(name, json);
        }
    }

    let mut fields = Vec::new();
    scope.collect(&operation.selection_set.node, &mut fields)?;
    Ok(fields)
}

fn pick_operation<'a>(
    document: &'a ExecutableDocument,
    operation_name: Option<&str>,
) -> ResolveResult<&'a OperationDefinition> {
    match &document.operations {
        DocumentOperations::Single(operation) => Ok(&operation.node),
        DocumentOperations::Multiple(map) => match operation_name {
            Some(name) => map.get(name).map(|op| &op.node).ok_or_else(|| {
                ResolveError::InvalidDocument(format!("operation `{name}` not found"))
            }),
            None if map.len() == 1 => map
                .values()
                .next()
                .map(|op| &op.node)
                .ok_or_else(|| ResolveError::InvalidDocument("document has no operation".into())),
            None => Err(ResolveError::InvalidDocument(
                "document has several operations, pick one by name".into(),
            )),
        },
    }
}

struct Scope<'d> {
    fragments: &'d HashMap<Name, Positioned<FragmentDefinition>>,
    variables: Variables,
    visiting: Vec<&'d str>,
}

impl<'d> Scope<'d> {
    fn collect(&mut self, set: &'d SelectionSet, out: &mut Vec<SelectionNode>) -> ResolveResult<()> {
        for selection in &set.items {
            match &selection.node {
                Selection::Field(field) => {
                    let field = &field.node;
                    if !self.included(&field.directives)? {
                        continue;
                    }
                    let mut node = SelectionNode::new(field.name.node.as_str());
                    for (name, value) in &field.arguments {
                        node.arguments
                            .insert(name.node.to_string(), self.input_value(&value.node)?);
                    }
                    self.collect(&field.selection_set.node, &mut node.children)?;
                    out.push(node);
                }
                Selection::InlineFragment(fragment) => {
                    if self.included(&fragment.node.directives)? {
                        self.collect(&fragment.node.selection_set.node, out)?;
                    }
                }
                Selection::FragmentSpread(spread) => {
                    if !self.included(&spread.node.directives)? {
                        continue;
                    }
                    let name = spread.node.fragment_name.node.as_str();
                    if self.visiting.contains(&name) {
                        return Err(ResolveError::InvalidDocument(format!(
                            "fragment `{name}` spreads itself"
                        )));
                    }
                    let fragments = self.fragments;
                    let fragment = fragments.get(name).ok_or_else(|| {
                        ResolveError::InvalidDocument(format!("unknown fragment `{name}`"))
                    })?;
                    self.visiting.push(name);
                    self.collect(&fragment.node.selection_set.node, out)?;
                    self.visiting.pop();
                }
            }
        }
        Ok(())
    }

    /// Evaluate `@skip(if:)` and `@include(if:)`.
    fn included(&self, directives: &[Positioned<Directive>]) -> ResolveResult<bool> {
        for directive in directives {
            let directive = &directive.node;
            let skip_when = match directive.name.node.as_str() {
                "skip" => true,
                "include" => false,
                _ => continue,
            };
            let condition = match directive.get_argument("if") {
                Some(value) => self.input_value(&value.node)?,
                None => InputValue::Scalar(ScalarValue::Bool(false)),
            };
            match condition {
                InputValue::Scalar(ScalarValue::Bool(flag)) if flag == skip_when => {
                    return Ok(false)
                }
                InputValue::Scalar(ScalarValue::Bool(_)) => {}
                other => {
                    return Err(ResolveError::invalid_argument(
                        "if",
                        format!("expected boolean, got {}", other.kind()),
                    ))
                }
            }
        }
        Ok(true)
    }

    fn input_value(&self, value: &GqlValue) -> ResolveResult<InputValue> {
        Ok(match value {
            GqlValue::Variable(name) => match self.variables.get(name.as_str()) {
                Some(json) => serde_json::from_value(json.clone()).map_err(|e| {
                    ResolveError::invalid_argument(name.as_str(), e.to_string())
                })?,
                None => InputValue::Scalar(ScalarValue::Null),
            },
            GqlValue::Null => InputValue::Scalar(ScalarValue::Null),
            GqlValue::Number(n) => InputValue::Scalar(match n.as_i64() {
                Some(i) => ScalarValue::Int(i),
                None => ScalarValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            }),
            GqlValue::String(s) => InputValue::Scalar(ScalarValue::String(s.clone())),
            GqlValue::Boolean(b) => InputValue::Scalar(ScalarValue::Bool(*b)),
            GqlValue::Enum(e) => InputValue::Scalar(ScalarValue::String(e.to_string())),
            GqlValue::Binary(_) => {
                return Err(ResolveError::invalid_argument(
                    "binary",
                    "binary values are not supported",
                ))
            }
            GqlValue::List(items) => InputValue::List(
                items
                    .iter()
                    .map(|item| self.input_value(item))
                    .collect::<ResolveResult<_>>()?,
            ),
            GqlValue::Object(fields) => InputValue::Object(
                fields
                    .iter()
                    .map(|(k, v)| Ok((k.to_string(), self.input_value(v)?)))
                    .collect::<ResolveResult<IndexMap<_, _>>>()?,
            ),
        })
    }
}
