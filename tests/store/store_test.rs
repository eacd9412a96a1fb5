use folio::model::{default_renderers, Column, Query, Renderer, Report, SemanticType};
use folio::render::RenderEngine;
use folio::store::{Catalog, JsonFileStore, MemoryStore, Repository, Store, StoreError};
use std::cell::Cell;
use std::io;

use tempfile::TempDir;

fn sales_query() -> Query {
    Query {
        id: String::new(),
        name: "Sales".to_string(),
        description: "Monthly sales".to_string(),
        sql_text: "SELECT region, amount FROM sales".to_string(),
        columns: vec![
            Column::new("region", "NVarChar")
                .named("Region")
                .rendered_by("DefaultStringRenderer")
                .enabled(true),
            Column::new("amount", "Money")
                .named("Amount")
                .rendered_by("DefaultNumberRenderer")
                .enabled(true),
        ],
    }
}

fn sales_report(catalog: &Catalog, query_id: &str) -> Report {
    let mut report = catalog.report_from_query("Sales by region", query_id).unwrap();
    report.padding = 10.0;
    for column in &mut report.columns {
        column.active = true;
        column.width = 95.0;
    }
    report
}

#[test]
fn test_open_seeds_default_renderers() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("db.json");

    let repo = Repository::open(JsonFileStore::new(&path)).unwrap();
    assert_eq!(repo.catalog().renderers.len(), default_renderers().len());
    assert!(path.exists());

    // A second open finds them and adds nothing.
    let again = Repository::open(JsonFileStore::new(&path)).unwrap();
    assert_eq!(again.catalog(), repo.catalog());
}

#[test]
fn test_crud_round_trip_through_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");
    let mut repo = Repository::open(JsonFileStore::new(&path)).unwrap();

    let query_id = repo.save_query(sales_query()).unwrap();
    assert!(uuid::Uuid::parse_str(&query_id).is_ok());

    let report = sales_report(repo.catalog(), &query_id);
    let report_id = repo.save_report(report).unwrap();

    let reopened = Repository::open(JsonFileStore::new(&path)).unwrap();
    let catalog = reopened.catalog();
    assert_eq!(catalog.query(&query_id).unwrap().name, "Sales");
    let stored = catalog.report(&report_id).unwrap();
    assert_eq!(stored.query_id, query_id);
    assert_eq!(stored.columns.len(), 2);
    assert_eq!(catalog.find_report("Sales by region").unwrap().id, report_id);
    assert_eq!(catalog.find_query("Sales").unwrap().id, query_id);
}

#[test]
fn test_update_keeps_id_and_unknown_id_fails() {
    let mut repo = Repository::open(MemoryStore::default()).unwrap();
    let id = repo.save_query(sales_query()).unwrap();

    let mut query = repo.catalog().query(&id).unwrap().clone();
    query.name = "Sales (EU)".to_string();
    assert_eq!(repo.save_query(query).unwrap(), id);
    assert_eq!(repo.catalog().queries.len(), 1);
    assert_eq!(repo.catalog().query(&id).unwrap().name, "Sales (EU)");

    let mut stray = sales_query();
    stray.id = "does-not-exist".to_string();
    let err = repo.save_query(stray).unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "query", .. }));
    assert_eq!(err.to_string(), "query 'does-not-exist' not found");
}

#[test]
fn test_invalid_entities_are_not_saved() {
    let store = MemoryStore::default();
    let mut repo = Repository::open(store).unwrap();

    let mut query = sales_query();
    query.sql_text.clear();
    let err = repo.save_query(query).unwrap_err();
    let errors = err.validation().unwrap();
    assert_eq!(errors.field_message("sqlText"), Some("SQL Query is required"));
    assert!(repo.catalog().queries.is_empty());

    let query_id = repo.save_query(sales_query()).unwrap();
    let mut report = sales_report(repo.catalog(), &query_id);
    report.columns[0].width = 90.0;
    let err = repo.save_report(report).unwrap_err();
    assert!(err.validation().unwrap().field_message("paperSize").is_some());
    assert!(repo.catalog().reports.is_empty());

    let engine = RenderEngine::new().unwrap();
    let renderer = Renderer::new("", "Upper", SemanticType::String, "function(v) return v:upper(")
        .with_description("upper case");
    assert!(repo.save_renderer(renderer, &engine).is_err());
}

#[test]
fn test_deletes_do_not_cascade() {
    let mut repo = Repository::open(MemoryStore::default()).unwrap();
    let engine = RenderEngine::new().unwrap();

    let renderer_id = repo
        .save_renderer(
            Renderer::new("", "Upper", SemanticType::String, "function(v) return string.upper(v) end")
                .with_description("upper case"),
            &engine,
        )
        .unwrap();
    let mut query = sales_query();
    query.columns[0].renderer_id = Some(renderer_id.clone());
    let query_id = repo.save_query(query).unwrap();
    let report_id = repo
        .save_report(sales_report(repo.catalog(), &query_id))
        .unwrap();

    repo.delete_renderer(&renderer_id).unwrap();
    let column = &repo.catalog().query(&query_id).unwrap().columns[0];
    assert_eq!(column.renderer_id.as_deref(), Some(renderer_id.as_str()));

    repo.delete_query(&query_id).unwrap();
    assert_eq!(repo.catalog().report(&report_id).unwrap().query_id, query_id);

    repo.delete_report(&report_id).unwrap();
    assert!(matches!(
        repo.delete_report(&report_id),
        Err(StoreError::NotFound { entity: "report", .. })
    ));
}

#[test]
fn test_memory_store_persists_each_mutation() {
    let mut repo = Repository::open(MemoryStore::default()).unwrap();
    repo.save_query(sales_query()).unwrap();

    let store = repo.into_store();
    let snapshot = store.snapshot();
    assert_eq!(snapshot.queries.len(), 1);
    assert_eq!(store.load().unwrap(), snapshot);
}

#[test]
fn test_reload_discards_unsaved_state() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");
    let mut repo = Repository::open(JsonFileStore::new(&path)).unwrap();
    let id = repo.save_query(sales_query()).unwrap();

    std::fs::write(&path, "").unwrap();
    repo.reload().unwrap();
    assert!(repo.catalog().query(&id).is_none());
}

#[test]
fn test_legacy_document_keys() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");
    std::fs::write(
        &path,
        r#"{
            "renderer": [
                {"id": "Upper", "name": "Upper", "typeOf": "string",
                 "rendererFunction": "function(v) return string.upper(v) end"}
            ],
            "queries": [
                {"id": "q1", "name": "Sales", "sqlQuery": "SELECT 1 AS one",
                 "columns": [{"key": "one", "type": "Int", "name": "One",
                              "rendererId": "", "enabled": true}]}
            ]
        }"#,
    )
    .unwrap();

    let catalog = JsonFileStore::new(&path).load().unwrap();
    assert_eq!(catalog.renderers[0].id, "Upper");
    assert_eq!(
        catalog.renderers[0].format_expression,
        "function(v) return string.upper(v) end"
    );
    let query = catalog.query("q1").unwrap();
    assert_eq!(query.sql_text, "SELECT 1 AS one");
    assert_eq!(query.columns[0].display_name, "One");
    assert_eq!(query.columns[0].renderer_id, None);
    assert!(catalog.reports.is_empty());
}

#[test]
fn test_corrupt_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(
        Repository::open(JsonFileStore::new(&path)),
        Err(StoreError::Json(_))
    ));
}

/// Memory store whose writes can be switched off.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    read_only: Cell<bool>,
}

impl Store for FlakyStore {
    fn load(&self) -> Result<Catalog, StoreError> {
        self.inner.load()
    }

    fn save(&self, catalog: &Catalog) -> Result<(), StoreError> {
        if self.read_only.get() {
            return Err(StoreError::Io(io::Error::other("disk is read-only")));
        }
        self.inner.save(catalog)
    }
}

#[test]
fn test_failed_write_leaves_catalog_untouched() {
    let mut repo = Repository::open(FlakyStore::default()).unwrap();
    let query_id = repo.save_query(sales_query()).unwrap();
    let before = repo.catalog().clone();

    let store = repo.into_store();
    store.read_only.set(true);
    let mut repo = Repository::open(store).unwrap();

    let mut renamed = repo.catalog().query(&query_id).unwrap().clone();
    renamed.name = "Renamed".to_string();
    assert!(matches!(repo.save_query(renamed), Err(StoreError::Io(_))));
    assert!(matches!(repo.save_query(sales_query()), Err(StoreError::Io(_))));
    assert!(matches!(repo.delete_query(&query_id), Err(StoreError::Io(_))));
    assert_eq!(repo.catalog(), &before);

    let store = repo.into_store();
    assert_eq!(store.inner.snapshot(), before);
}
