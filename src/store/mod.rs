//! Catalog persistence.
//!
//! The whole catalog (renderers, queries, reports) is one JSON document that
//! is loaded and saved as a unit; there is no partial update API.
//!
//! # Design
//!
//! - [`Catalog`] holds the entity collections and their CRUD rules
//! - [`Store`] loads and saves a catalog document
//! - [`Repository`] pairs the two and persists after every mutation
//! - Deletes never cascade; dangling references surface through validation

mod catalog;
mod file;

pub use catalog::Catalog;
pub use file::{JsonFileStore, MemoryStore};

use crate::model::{Query, Renderer, Report};
use crate::render::RenderEngine;
use crate::validation::ValidationErrors;

/// Errors that can occur during catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("validation failed: {0}")]
    Invalid(#[from] ValidationErrors),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Validation errors, if that is what this is.
    pub fn validation(&self) -> Option<&ValidationErrors> {
        match self {
            StoreError::Invalid(errors) => Some(errors),
            _ => None,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Loads and saves whole catalog documents.
pub trait Store {
    fn load(&self) -> StoreResult<Catalog>;

    fn save(&self, catalog: &Catalog) -> StoreResult<()>;
}

/// A catalog bound to its store; every mutation is persisted immediately.
pub struct Repository<S: Store> {
    store: S,
    catalog: Catalog,
}

impl<S: Store> Repository<S> {
    /// Load the catalog, seeding the default renderers when absent.
    pub fn open(store: S) -> StoreResult<Self> {
        let mut catalog = store.load()?;
        if catalog.seed_default_renderers() > 0 {
            store.save(&catalog)?;
        }
        Ok(Self { store, catalog })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Discard in-memory state and read the store again.
    pub fn reload(&mut self) -> StoreResult<()> {
        self.catalog = self.store.load()?;
        Ok(())
    }

    pub fn save_renderer(&mut self, renderer: Renderer, engine: &RenderEngine) -> StoreResult<String> {
        self.commit(|catalog| catalog.save_renderer(renderer, engine))
    }

    pub fn save_query(&mut self, query: Query) -> StoreResult<String> {
        self.commit(|catalog| catalog.save_query(query))
    }

    pub fn save_report(&mut self, report: Report) -> StoreResult<String> {
        self.commit(|catalog| catalog.save_report(report))
    }

    pub fn delete_renderer(&mut self, id: &str) -> StoreResult<Renderer> {
        self.commit(|catalog| catalog.delete_renderer(id))
    }

    pub fn delete_query(&mut self, id: &str) -> StoreResult<Query> {
        self.commit(|catalog| catalog.delete_query(id))
    }

    pub fn delete_report(&mut self, id: &str) -> StoreResult<Report> {
        self.commit(|catalog| catalog.delete_report(id))
    }

    /// Apply `change` to a copy of the catalog and keep it only once the
    /// store has accepted it.
    fn commit<T>(&mut self, change: impl FnOnce(&mut Catalog) -> StoreResult<T>) -> StoreResult<T> {
        let mut next = self.catalog.clone();
        let out = change(&mut next)?;
        self.store.save(&next)?;
        self.catalog = next;
        Ok(out)
    }

    pub fn into_store(self) -> S {
        self.store
    }
}
