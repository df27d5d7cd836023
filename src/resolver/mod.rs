//! Relation Resolver.
//!
//! Resolution of one selection level:
//!
//! ```text
//!   SelectionNode ──classify──▶ scalars + to-one ──StatementBuilder──▶ SQL
//!                                                                     │
//!                                           Executor::fetch_all ◀─────┘
//!                                                   │
//!                                              unflatten
//!                                                   │
//!        to-many / to-many-to-many ──▶ resolve() per parent row (concurrent)
//!                                                   │
//!                                    attach by parent id, strip hidden id
//! ```
//!
//! To-one relations cost no extra statement. Every many-valued relation
//! costs one statement per parent row, at every depth.

mod request;

pub use request::{EntityQuery, ForcedFn, ForcedModifiers, ResolutionRequest, ResolveContext};

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt, TryStreamExt};
use tokio::sync::Semaphore;

use crate::builder::{
    entity_table, foreign_key, pivot_table, to_many_table, Statement, StatementBuilder, ID_COLUMN,
};
use crate::config::Settings;
use crate::error::{ResolveError, ResolveResult};
use crate::executor::Executor;
use crate::modifiers::{merge, Precedence, QueryModifiers};
use crate::reshape::unflatten_list;
use crate::schema::{RelationKind, SchemaIndex};
use crate::selection::{
    classify, Cardinality, ClassifiedSelection, RelationSelection, SelectionNode,
};
use crate::value::{ResultObject, Row, ScalarValue, Value};

/// Tuning knobs for a [`Resolver`].
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Statements in flight at once across a whole resolution tree.
    pub max_concurrency: usize,
    pub strict_fields: bool,
    pub allow_raw_order_by: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            strict_fields: true,
            allow_raw_order_by: true,
        }
    }
}

impl From<&Settings> for ResolverOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            max_concurrency: settings.effective_concurrency(),
            strict_fields: settings.resolver.strict_fields,
            allow_raw_order_by: settings.resolver.allow_raw_order_by,
        }
    }
}

/// Compiles selections into SQL, runs them and reshapes the rows.
pub struct Resolver {
    schema: Arc<SchemaIndex>,
    executor: Arc<dyn Executor>,
    options: ResolverOptions,
    permits: Arc<Semaphore>,
}

impl Resolver {
    pub fn new(schema: Arc<SchemaIndex>, executor: Arc<dyn Executor>) -> Self {
        Self::with_options(schema, executor, ResolverOptions::default())
    }

    pub fn with_options(
        schema: Arc<SchemaIndex>,
        executor: Arc<dyn Executor>,
        options: ResolverOptions,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(options.max_concurrency.max(1)));
        Self {
            schema,
            executor,
            options,
            permits,
        }
    }

    pub fn schema(&self) -> &SchemaIndex {
        &self.schema
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Resolve a root query field through `entity`.
    ///
    /// Cardinality comes from the field's declared type on the query type.
    /// The entity's forced `where` keys hold whatever the caller passes; its
    /// forced `limit` and `orderBy` are defaults the caller may override.
    pub async fn query(
        &self,
        entity: &EntityQuery,
        field: &SelectionNode,
        ctx: &ResolveContext,
    ) -> ResolveResult<Value> {
        let request = self.root_request(entity, field, ctx)?;
        self.resolve(request).await
    }

    /// Request for a root query field, without running it.
    pub fn root_request<'a>(
        &self,
        entity: &'a EntityQuery,
        field: &'a SelectionNode,
        ctx: &ResolveContext,
    ) -> ResolveResult<ResolutionRequest<'a>> {
        let declared = self
            .schema
            .query_field(&field.name)
            .ok_or_else(|| ResolveError::UnknownQueryField(field.name.clone()))?;

        let caller = QueryModifiers::from_arguments(&field.arguments, self.options.allow_raw_order_by)?;
        let forced = entity.forced_for(ctx.identity(), &caller);

        Ok(ResolutionRequest::new(field, &entity.type_name, &entity.table)
            .cardinality(Cardinality::of(&declared.ty))
            .modifiers(merge(caller, forced, Precedence::Caller)))
    }

    /// Statement for one level of `request`, without running it.
    pub fn statement(&self, request: &ResolutionRequest<'_>) -> ResolveResult<Statement> {
        let selection = classify(
            &self.schema,
            request.type_name,
            request.selection,
            self.options.strict_fields,
        )?;
        Ok(self.build(request, &selection))
    }

    fn build(
        &self,
        request: &ResolutionRequest<'_>,
        selection: &ClassifiedSelection<'_>,
    ) -> Statement {
        let mut builder = StatementBuilder::for_selection(&request.table, selection)
            .modifiers(request.modifiers.clone())
            .cardinality(request.cardinality);
        if let Some(target) = request.pivot_target {
            builder = builder.pivot_join(target);
        }
        builder.build()
    }

    /// Resolve one level and, recursively, every many-valued relation below it.
    ///
    /// Returns a list for [`Cardinality::Many`], otherwise an object or null.
    pub fn resolve<'a>(&'a self, request: ResolutionRequest<'a>) -> BoxFuture<'a, ResolveResult<Value>> {
        Box::pin(async move {
            let selection = classify(
                &self.schema,
                request.type_name,
                request.selection,
                self.options.strict_fields,
            )?;
            let statement = self.build(&request, &selection);
            let rows = self.fetch(&statement.to_sql(self.executor.dialect())).await?;

            log::debug!(
                "resolved {} from `{}` ({}): {} row(s)",
                request.type_name,
                request.table,
                request.cardinality,
                rows.len()
            );

            let mut parents = unflatten_list(rows);
            if request.cardinality == Cardinality::One {
                parents.truncate(1);
                if parents.is_empty() {
                    return Ok(Value::NULL);
                }
            }

            let relations: Vec<RelationSelection<'a>> = selection
                .to_many
                .iter()
                .chain(&selection.to_many_many)
                .copied()
                .collect();

            if !relations.is_empty() {
                self.attach_relations(&request, &relations, &mut parents).await?;
            }

            let mut objects = parents
                .into_iter()
                .map(|obj| arrange(obj, request.selection, statement.hidden_id))
                .map(Value::Object);

            Ok(match request.cardinality {
                Cardinality::Many => Value::List(objects.collect()),
                Cardinality::One => objects.next().unwrap_or(Value::NULL),
            })
        })
    }

    /// Run one sub-resolution per (relation, parent row) and attach the results.
    async fn attach_relations<'a>(
        &'a self,
        request: &ResolutionRequest<'a>,
        relations: &[RelationSelection<'a>],
        parents: &mut [ResultObject],
    ) -> ResolveResult<()> {
        let mut seen = HashSet::new();
        let mut tasks = Vec::with_capacity(relations.len() * parents.len());
        for relation in relations {
            let field: &'a str = relation.field.name.as_str();
            let caller = QueryModifiers::from_arguments(
                &relation.node.arguments,
                self.options.allow_raw_order_by,
            )?;
            for parent in parents.iter() {
                let (key, id) = parent_id(parent, request.type_name, field)?;
                // Parents sharing an id share one sub-resolution.
                if !seen.insert((field, key.clone())) {
                    continue;
                }
                let sub = self.relation_request(request, relation, id, caller.clone());
                tasks.push((field, key, sub));
            }
        }

        let pending: Vec<BoxFuture<'a, ResolveResult<((&'a str, String), Value)>>> = tasks
            .into_iter()
            .map(|(field, key, sub)| {
                let resolved = self.resolve(sub);
                async move { resolved.await.map(|value| ((field, key), value)) }.boxed()
            })
            .collect();
        let by_parent: HashMap<(&str, String), Value> = stream::iter(pending)
            .buffer_unordered(self.options.max_concurrency.max(1))
            .try_collect()
            .await?;

        for parent in parents.iter_mut() {
            let Some(key) = parent_key(parent) else {
                continue;
            };
            for relation in relations {
                let field = relation.field.name.as_str();
                if let Some(value) = by_parent.get(&(field, key.clone())) {
                    parent.insert(field.to_string(), value.clone());
                }
            }
        }

        Ok(())
    }

    fn relation_request<'a>(
        &self,
        parent: &ResolutionRequest<'a>,
        relation: &RelationSelection<'a>,
        parent_id: ScalarValue,
        caller: QueryModifiers,
    ) -> ResolutionRequest<'a> {
        let target = relation.field.ty.name.as_str();
        let forced =
            QueryModifiers::new().with_filter(&foreign_key(&parent.type_name.to_lowercase()), parent_id);

        let mut sub = ResolutionRequest::new(relation.node, target, "")
            .cardinality(relation.cardinality())
            .modifiers(merge(caller, forced, Precedence::Forced));

        match relation.field.relation {
            RelationKind::ToManyMany { first } => {
                sub.table = pivot_table(&parent.entity_table, &relation.field.name, first);
                sub.entity_table = entity_table(target);
                sub.pivot_target = Some(target);
            }
            _ => {
                sub.table = to_many_table(&relation.field.name);
                sub.entity_table = sub.table.clone();
            }
        }
        sub
    }

    async fn fetch(&self, sql: &str) -> ResolveResult<Vec<Row>> {
        // A closed semaphore only means no throttling.
        let _permit = self.permits.acquire().await.ok();
        Ok(self.executor.fetch_all(sql).await?)
    }
}

fn parent_key(parent: &ResultObject) -> Option<String> {
    match parent.get(ID_COLUMN) {
        Some(Value::Scalar(id)) => id.id_key(),
        _ => None,
    }
}

fn parent_id(
    parent: &ResultObject,
    type_name: &str,
    field: &str,
) -> ResolveResult<(String, ScalarValue)> {
    match parent.get(ID_COLUMN) {
        Some(Value::Scalar(id)) if !id.is_null() => {
            let key = id.id_key().unwrap_or_default();
            Ok((key, id.clone()))
        }
        _ => Err(ResolveError::MissingParentId {
            type_name: type_name.to_string(),
            field: field.to_string(),
        }),
    }
}

/// Order fields like the selection and drop an id nobody asked for.
fn arrange(mut obj: ResultObject, selection: &SelectionNode, hidden_id: bool) -> ResultObject {
    if hidden_id {
        obj.shift_remove(ID_COLUMN);
    }
    let mut out = ResultObject::with_capacity(obj.len());
    for child in &selection.children {
        if let Some((name, value)) = obj.shift_remove_entry(&child.name) {
            out.insert(name, value);
        }
    }
    out.extend(obj);
    out
}
