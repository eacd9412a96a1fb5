use folio::model::{default_renderers, Column, Record, Renderer, SemanticType};
use folio::render::{RenderEngine, RowMapper, ERROR_MARKER};
use serde_json::{json, Value};

fn record(value: Value) -> Record {
    value.as_object().cloned().unwrap_or_default()
}

fn col(key: &str, source_type: &str) -> Column {
    Column::new(key, source_type).enabled(true)
}

fn people() -> Vec<Record> {
    vec![
        record(json!({"id": 1, "name": "Ada", "score": 1500, "secret": "x"})),
        record(json!({"id": 2, "name": "Brian", "score": 20, "secret": "y"})),
        record(json!({"id": 3, "name": "Cleo", "score": null, "secret": "z"})),
    ]
}

#[test]
fn test_enabled_columns_only() {
    let engine = RenderEngine::new().unwrap();
    let columns = vec![
        col("id", "Int").named("Id"),
        col("name", "NVarChar").named("Name"),
        Column::new("secret", "NVarChar"),
    ];
    let mapper = RowMapper::new(&engine, &columns, &[]);
    let mapped = mapper.map_all(&people()).unwrap();

    assert_eq!(mapped.records.len(), 3);
    for (raw, out) in people().iter().zip(&mapped.records) {
        let keys: Vec<_> = out.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["id", "name"]);
        assert_eq!(out["id"], raw["id"]);
        assert_eq!(out["name"], raw["name"]);
    }
    assert!(mapped.errors.is_empty());
    assert_eq!(mapper.keys().collect::<Vec<_>>(), vec!["id", "name"]);
}

#[test]
fn test_default_renderers_applied() {
    let engine = RenderEngine::new().unwrap();
    let columns = vec![
        col("score", "Int").named("Score").rendered_by("DefaultNumberRenderer"),
        col("name", "NVarChar").named("Name").rendered_by("DefaultStringRenderer"),
    ];
    let mapped = RowMapper::new(&engine, &columns, &default_renderers())
        .map_all(&people())
        .unwrap();

    assert_eq!(mapped.records[0]["score"], json!("1,500"));
    assert_eq!(mapped.records[1]["score"], json!("20"));
    // nil in, nil out
    assert_eq!(mapped.records[2]["score"], Value::Null);
    assert_eq!(mapped.records[2]["name"], json!("Cleo"));
}

#[test]
fn test_failing_cell_does_not_abort() {
    let engine = RenderEngine::new().unwrap();
    let renderers = vec![Renderer::new(
        "strict",
        "Strict",
        SemanticType::Number,
        "function(value) if value == nil then error('no score') end return value * 2 end",
    )];
    let columns = vec![
        col("name", "NVarChar").named("Name"),
        col("score", "Int").named("Score").rendered_by("strict"),
    ];
    let mapped = RowMapper::new(&engine, &columns, &renderers)
        .map_all(&people())
        .unwrap();

    assert_eq!(mapped.records.len(), 3);
    assert_eq!(mapped.records[0]["score"], json!(3000));
    assert_eq!(mapped.records[2]["score"], json!(ERROR_MARKER));
    assert_eq!(mapped.records[2]["name"], json!("Cleo"));

    assert_eq!(mapped.errors.len(), 1);
    let error = &mapped.errors[0];
    assert_eq!(error.row_index, 2);
    assert_eq!(error.column_key, "score");
    assert!(error.message.contains("no score"), "{}", error.message);
}

#[test]
fn test_uncompilable_renderer_marks_whole_column() {
    let engine = RenderEngine::new().unwrap();
    let renderers = vec![Renderer::new("bad", "Bad", SemanticType::String, "function(v) return")];
    let columns = vec![col("name", "NVarChar").named("Name").rendered_by("bad")];
    let mapped = RowMapper::new(&engine, &columns, &renderers)
        .map_all(&people())
        .unwrap();

    assert!(mapped
        .records
        .iter()
        .all(|r| r["name"] == json!(ERROR_MARKER)));
    assert_eq!(mapped.errors.len(), 3);
}

#[test]
fn test_unresolved_renderers_fall_back_to_identity() {
    let engine = RenderEngine::new().unwrap();
    let columns = vec![
        col("name", "NVarChar").named("Name").rendered_by("Gone"),
        col("id", "Int").named("Id").rendered_by("DefaultBooleanRenderer"),
    ];
    let mapper = RowMapper::new(&engine, &columns, &default_renderers());

    let unresolved = mapper.unresolved();
    assert_eq!(unresolved.len(), 2);
    assert_eq!(unresolved[0].column_key, "name");
    assert_eq!(unresolved[0].renderer_id, "Gone");
    assert_eq!(unresolved[1].column_key, "id");

    let mapped = mapper.map_all(&people()).unwrap();
    assert_eq!(mapped.records[1]["name"], json!("Brian"));
    assert_eq!(mapped.records[1]["id"], json!(2));
    assert!(mapped.errors.is_empty());
}

#[test]
fn test_row_index_rows_and_context() {
    let engine = RenderEngine::new().unwrap();
    let renderers = vec![Renderer::new(
        "rank",
        "Rank",
        SemanticType::String,
        "function(value, row, index, rows, key, name, ctx)
            return ctx.reportName .. ':' .. name .. ':' .. value .. ' ' .. (index + 1) .. '/' .. #rows
        end",
    )];
    let columns = vec![col("name", "NVarChar").named("Who").rendered_by("rank")];
    let mapper = RowMapper::new(&engine, &columns, &renderers)
        .with_context(record(json!({"reportName": "Team"})));

    let mapped = mapper.map_all(&people()).unwrap();
    assert_eq!(mapped.records[0]["name"], json!("Team:Who:Ada 1/3"));
    assert_eq!(mapped.records[2]["name"], json!("Team:Who:Cleo 3/3"));

    let rows = people();
    let single = mapper.map_row(&rows[1], 1, &rows).unwrap();
    assert_eq!(single.record["name"], json!("Team:Who:Brian 2/3"));
    assert!(single.errors.is_empty());
}

#[test]
fn test_missing_key_renders_as_null() {
    let engine = RenderEngine::new().unwrap();
    let columns = vec![col("absent", "NVarChar").named("Absent")];
    let mapped = RowMapper::new(&engine, &columns, &[])
        .map_all(&people())
        .unwrap();
    assert_eq!(mapped.records[0]["absent"], Value::Null);
}
