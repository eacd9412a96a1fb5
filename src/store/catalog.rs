//! In-memory catalog and its CRUD rules.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{StoreError, StoreResult};
use crate::model::{default_renderers, Query, Renderer, Report};
use crate::render::RenderEngine;
use crate::validation::{validate_query, validate_renderer, validate_report};

/// The persisted document: every renderer, query and report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    #[serde(default, alias = "renderer")]
    pub renderers: Vec<Renderer>,
    #[serde(default)]
    pub queries: Vec<Query>,
    #[serde(default)]
    pub reports: Vec<Report>,
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl Catalog {
    pub fn renderer(&self, id: &str) -> Option<&Renderer> {
        self.renderers.iter().find(|r| r.id == id)
    }

    pub fn query(&self, id: &str) -> Option<&Query> {
        self.queries.iter().find(|q| q.id == id)
    }

    pub fn report(&self, id: &str) -> Option<&Report> {
        self.reports.iter().find(|r| r.id == id)
    }

    /// Find a report by id, or by name when no id matches.
    pub fn find_report(&self, id_or_name: &str) -> Option<&Report> {
        self.report(id_or_name)
            .or_else(|| self.reports.iter().find(|r| r.name == id_or_name))
    }

    pub fn find_query(&self, id_or_name: &str) -> Option<&Query> {
        self.query(id_or_name)
            .or_else(|| self.queries.iter().find(|q| q.name == id_or_name))
    }

    /// Add the built-in renderers that are missing. Returns how many were added.
    pub fn seed_default_renderers(&mut self) -> usize {
        let missing: Vec<Renderer> = default_renderers()
            .into_iter()
            .filter(|d| self.renderer(&d.id).is_none())
            .collect();
        let added = missing.len();
        if added > 0 {
            debug!(added, "seeding default renderers");
        }
        self.renderers.extend(missing);
        added
    }

    /// Create (empty id) or update a renderer.
    pub fn save_renderer(&mut self, mut renderer: Renderer, engine: &RenderEngine) -> StoreResult<String> {
        validate_renderer(&renderer, engine)?;
        if renderer.id.is_empty() {
            renderer.id = new_id();
            let id = renderer.id.clone();
            self.renderers.push(renderer);
            return Ok(id);
        }
        let slot = self
            .renderers
            .iter_mut()
            .find(|r| r.id == renderer.id)
            .ok_or_else(|| StoreError::not_found("renderer", &renderer.id))?;
        *slot = renderer;
        Ok(slot.id.clone())
    }

    /// Create (empty id) or update a query.
    pub fn save_query(&mut self, mut query: Query) -> StoreResult<String> {
        validate_query(&query, &self.renderers)?;
        if query.id.is_empty() {
            query.id = new_id();
            let id = query.id.clone();
            self.queries.push(query);
            return Ok(id);
        }
        let slot = self
            .queries
            .iter_mut()
            .find(|q| q.id == query.id)
            .ok_or_else(|| StoreError::not_found("query", &query.id))?;
        *slot = query;
        Ok(slot.id.clone())
    }

    /// Create (empty id) or update a report.
    pub fn save_report(&mut self, mut report: Report) -> StoreResult<String> {
        validate_report(&report, &self.queries)?;
        if report.id.is_empty() {
            report.id = new_id();
            let id = report.id.clone();
            self.reports.push(report);
            return Ok(id);
        }
        let slot = self
            .reports
            .iter_mut()
            .find(|r| r.id == report.id)
            .ok_or_else(|| StoreError::not_found("report", &report.id))?;
        *slot = report;
        Ok(slot.id.clone())
    }

    /// Remove a renderer. Columns referring to it are left dangling.
    pub fn delete_renderer(&mut self, id: &str) -> StoreResult<Renderer> {
        let idx = self
            .renderers
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| StoreError::not_found("renderer", id))?;
        let users = self
            .queries
            .iter()
            .flat_map(|q| &q.columns)
            .filter(|c| c.renderer_id.as_deref() == Some(id))
            .count();
        if users > 0 {
            warn!(renderer = id, columns = users, "deleted renderer is still referenced");
        }
        Ok(self.renderers.remove(idx))
    }

    /// Remove a query. Reports built on it are left dangling.
    pub fn delete_query(&mut self, id: &str) -> StoreResult<Query> {
        let idx = self
            .queries
            .iter()
            .position(|q| q.id == id)
            .ok_or_else(|| StoreError::not_found("query", id))?;
        let users = self.reports.iter().filter(|r| r.query_id == id).count();
        if users > 0 {
            warn!(query = id, reports = users, "deleted query is still referenced");
        }
        Ok(self.queries.remove(idx))
    }

    pub fn delete_report(&mut self, id: &str) -> StoreResult<Report> {
        let idx = self
            .reports
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| StoreError::not_found("report", id))?;
        Ok(self.reports.remove(idx))
    }

    /// Draft a new, unsaved report over an existing query.
    pub fn report_from_query(&self, name: &str, query_id: &str) -> StoreResult<Report> {
        let query = self
            .query(query_id)
            .ok_or_else(|| StoreError::not_found("query", query_id))?;
        Ok(Report::from_query(name, query))
    }
}
