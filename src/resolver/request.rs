//! Values passed into a resolution.

use std::fmt;
use std::sync::Arc;

use crate::auth::Identity;
use crate::modifiers::QueryModifiers;
use crate::selection::{Cardinality, SelectionNode};

/// Per-request context: who is asking.
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    identity: Identity,
}

impl ResolveContext {
    pub fn new(identity: Identity) -> Self {
        Self { identity }
    }

    pub fn guest() -> Self {
        Self::new(Identity::guest())
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}

/// Computes forced modifiers from the caller's identity and arguments.
pub type ForcedFn = dyn Fn(&Identity, &QueryModifiers) -> QueryModifiers + Send + Sync;

/// Modifiers an [`EntityQuery`] injects into every resolution.
#[derive(Clone, Default)]
pub enum ForcedModifiers {
    #[default]
    None,
    Static(QueryModifiers),
    Computed(Arc<ForcedFn>),
}

impl fmt::Debug for ForcedModifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForcedModifiers::None => write!(f, "None"),
            ForcedModifiers::Static(m) => f.debug_tuple("Static").field(m).finish(),
            ForcedModifiers::Computed(_) => write!(f, "Computed(..)"),
        }
    }
}

/// A root entry point: `posts` resolves `Post` rows from `posts`.
#[derive(Debug, Clone)]
pub struct EntityQuery {
    pub type_name: String,
    pub table: String,
    pub forced: ForcedModifiers,
}

impl EntityQuery {
    pub fn new(type_name: &str, table: &str) -> Self {
        Self {
            type_name: type_name.into(),
            table: table.into(),
            forced: ForcedModifiers::None,
        }
    }

    pub fn with_forced(mut self, modifiers: QueryModifiers) -> Self {
        self.forced = ForcedModifiers::Static(modifiers);
        self
    }

    /// Derive forced modifiers per request, e.g. restrict rows to their owner.
    pub fn with_forced_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&Identity, &QueryModifiers) -> QueryModifiers + Send + Sync + 'static,
    {
        self.forced = ForcedModifiers::Computed(Arc::new(f));
        self
    }

    pub fn forced_for(&self, identity: &Identity, caller: &QueryModifiers) -> QueryModifiers {
        match &self.forced {
            ForcedModifiers::None => QueryModifiers::default(),
            ForcedModifiers::Static(m) => m.clone(),
            ForcedModifiers::Computed(f) => f(identity, caller),
        }
    }
}

/// One level of the recursive resolution.
#[derive(Debug, Clone)]
pub struct ResolutionRequest<'a> {
    pub selection: &'a SelectionNode,
    pub type_name: &'a str,
    /// Table the statement reads from (the pivot for many-to-many).
    pub table: String,
    /// Table holding `type_name` rows; pivot names are built from it.
    pub entity_table: String,
    pub cardinality: Cardinality,
    /// Already merged caller and forced modifiers.
    pub modifiers: QueryModifiers,
    /// Entity type joined through `table` when it is a pivot.
    pub pivot_target: Option<&'a str>,
}

impl<'a> ResolutionRequest<'a> {
    pub fn new(selection: &'a SelectionNode, type_name: &'a str, table: &str) -> Self {
        Self {
            selection,
            type_name,
            table: table.into(),
            entity_table: table.into(),
            cardinality: Cardinality::Many,
            modifiers: QueryModifiers::default(),
            pivot_target: None,
        }
    }

    pub fn cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }

    pub fn modifiers(mut self, modifiers: QueryModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}
