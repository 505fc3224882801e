use super::conformer::ConformerGenerationRecipe;
use super::error::RecipeError;
use super::{EntryPoint, Recipe, entry_points};
use phf::phf_map;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

type Loader = fn() -> Arc<dyn Recipe>;

fn load_conformer_generation() -> Arc<dyn Recipe> {
    Arc::new(ConformerGenerationRecipe::new())
}

/// Implementations behind each advertised entry-point target.
static LOADERS: phf::Map<&'static str, Loader> = phf_map! {
    "mkite_conformer.recipes.rdkit:ConformerGenerationRecipe" => load_conformer_generation,
};

/// Resolves `(namespace, key)` pairs to recipe implementations.
#[derive(Default)]
pub struct RecipeRegistry {
    entries: Vec<(EntryPoint, Arc<dyn Recipe>)>,
}

impl RecipeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every entry point this package declares.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for entry in entry_points() {
            match LOADERS.get(entry.target) {
                Some(load) => registry.register(*entry, load()),
                None => debug!(target = entry.target, "no loader for entry point target"),
            }
        }
        registry
    }

    /// Adds `recipe` under `entry`, replacing any recipe already registered
    /// for the same namespace and key.
    pub fn register(&mut self, entry: EntryPoint, recipe: Arc<dyn Recipe>) {
        self.entries
            .retain(|(e, _)| !(e.namespace == entry.namespace && e.key == entry.key));
        self.entries.push((entry, recipe));
    }

    pub fn resolve(&self, namespace: &str, key: &str) -> Result<Arc<dyn Recipe>, RecipeError> {
        let mut in_namespace = self
            .entries
            .iter()
            .filter(|(entry, _)| entry.namespace == namespace)
            .peekable();
        if in_namespace.peek().is_none() {
            return Err(RecipeError::UnknownNamespace(namespace.to_string()));
        }
        in_namespace
            .find(|(entry, _)| entry.key == key)
            .map(|(_, recipe)| Arc::clone(recipe))
            .ok_or_else(|| RecipeError::UnknownRecipe {
                namespace: namespace.to_string(),
                key: key.to_string(),
            })
    }

    /// Registered entry points, sorted by key.
    pub fn list(&self) -> Vec<&EntryPoint> {
        let mut entries: Vec<&EntryPoint> = self.entries.iter().map(|(entry, _)| entry).collect();
        entries.sort_by(|a, b| a.key.cmp(b.key).then(a.namespace.cmp(b.namespace)));
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for RecipeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecipeRegistry")
            .field("entries", &self.list())
            .finish()
    }
}
