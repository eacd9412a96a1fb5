use folio::model::{
    default_renderers, Column, ColumnFilter, FilterCondition, FilterValue, JoinType, Query,
    Renderer, Report, SemanticType,
};
use folio::render::RenderEngine;
use folio::validation::{
    validate_query, validate_renderer, validate_report, validate_report_content,
};

fn orders_query() -> Query {
    Query {
        id: "q1".to_string(),
        name: "Orders".to_string(),
        description: String::new(),
        sql_text: "SELECT id, customer, total FROM orders".to_string(),
        columns: vec![
            Column::new("id", "Int")
                .named("Id")
                .rendered_by("DefaultNumberRenderer")
                .enabled(true),
            Column::new("customer", "NVarChar")
                .named("Customer")
                .rendered_by("DefaultStringRenderer")
                .enabled(true),
            Column::new("total", "Money").named("Total"),
        ],
    }
}

fn orders_report() -> Report {
    let query = orders_query();
    let mut report = Report::from_query("Orders by customer", &query);
    report.id = "r1".to_string();
    report.padding = 10.0;
    report.columns[0].active = true;
    report.columns[0].width = 40.0;
    report.columns[1].active = true;
    report.columns[1].width = 150.0;
    report
}

#[test]
fn test_valid_query() {
    assert!(validate_query(&orders_query(), &default_renderers()).is_ok());
}

#[test]
fn test_query_required_fields() {
    let mut query = orders_query();
    query.name = "  ".to_string();
    query.sql_text = String::new();
    let errors = validate_query(&query, &default_renderers()).unwrap_err();
    assert_eq!(errors.field_message("name"), Some("Name is required"));
    assert_eq!(errors.field_message("sqlText"), Some("SQL Query is required"));
}

#[test]
fn test_query_rejects_non_select() {
    let mut query = orders_query();
    query.sql_text = "UPDATE orders SET total = 0".to_string();
    let errors = validate_query(&query, &default_renderers()).unwrap_err();
    assert_eq!(
        errors.field_message("sqlText"),
        Some("SQL Query must be a SELECT statement")
    );
}

#[test]
fn test_enabled_columns_need_name_and_matching_renderer() {
    let mut query = orders_query();
    query.columns[0].display_name.clear();
    query.columns[1].renderer_id = Some("DefaultBooleanRenderer".to_string());
    query.columns[2].enabled = true;

    let errors = validate_query(&query, &default_renderers()).unwrap_err();
    assert_eq!(errors.column_message("id", "displayName"), Some("Name is required"));
    assert!(errors
        .column_message("customer", "rendererId")
        .is_some_and(|m| m.contains("boolean")));
    assert_eq!(
        errors.column_message("total", "rendererId"),
        Some("Renderer is required")
    );
    assert_eq!(errors.len(), 3);
}

#[test]
fn test_disabled_columns_are_not_checked() {
    let mut query = orders_query();
    query.columns.push(Column::new("notes", "NText"));
    assert!(validate_query(&query, &default_renderers()).is_ok());
}

#[test]
fn test_unknown_renderer() {
    let mut query = orders_query();
    query.columns[0].renderer_id = Some("Deleted".to_string());
    let errors = validate_query(&query, &default_renderers()).unwrap_err();
    assert_eq!(
        errors.column_message("id", "rendererId"),
        Some("Renderer 'Deleted' does not exist")
    );
}

#[test]
fn test_renderer_validation() {
    let engine = RenderEngine::new().unwrap();
    for renderer in default_renderers() {
        assert!(validate_renderer(&renderer, &engine).is_ok(), "{}", renderer.id);
    }

    let blank = Renderer::new("x", "", SemanticType::String, "");
    let errors = validate_renderer(&blank, &engine).unwrap_err();
    assert!(errors.field_message("name").is_some());
    assert!(errors.field_message("description").is_some());
    assert_eq!(
        errors.field_message("formatExpression"),
        Some("Render function is mandatory")
    );

    let broken = Renderer::new("x", "Broken", SemanticType::String, "function(v) return v +")
        .with_description("does not compile");
    let errors = validate_renderer(&broken, &engine).unwrap_err();
    assert!(errors
        .field_message("formatExpression")
        .is_some_and(|m| m.contains("does not compile")));
}

#[test]
fn test_valid_report() {
    assert!(validate_report(&orders_report(), &[orders_query()]).is_ok());
}

#[test]
fn test_report_width_error_is_keyed_on_paper_size() {
    let mut report = orders_report();
    report.columns[1].width = 145.0;
    let errors = validate_report(&report, &[orders_query()]).unwrap_err();
    assert_eq!(
        errors.field_message("paperSize"),
        Some("column widths total 185mm but must total 190mm (5mm short)")
    );
    // preview does not care about widths
    assert!(validate_report_content(&report, &[orders_query()]).is_ok());
}

#[test]
fn test_report_with_dangling_query() {
    let mut report = orders_report();
    report.query_id = "gone".to_string();
    let errors = validate_report_content(&report, &[orders_query()]).unwrap_err();
    assert_eq!(errors.field_message("queryId"), Some("Query 'gone' does not exist"));

    report.query_id.clear();
    report.name.clear();
    let errors = validate_report_content(&report, &[orders_query()]).unwrap_err();
    assert_eq!(errors.field_message("queryId"), Some("Query Id must not be empty"));
    assert_eq!(errors.field_message("name"), Some("Name must not be empty"));
}

#[test]
fn test_filter_completeness() {
    let mut report = orders_report();
    report.column_filters = vec![
        ColumnFilter::new("f1", JoinType::And, "customer", FilterCondition::Contains, "Ltd"),
        ColumnFilter {
            id: "f2".to_string(),
            join_type: JoinType::Or,
            column_key: String::new(),
            filter_condition: None,
            filter_value: FilterValue::default(),
        },
        ColumnFilter::new("f3", JoinType::And, "total", FilterCondition::Equals, "0"),
    ];

    let errors = validate_report_content(&report, &[orders_query()]).unwrap_err();
    assert!(errors.filters.get("f1").is_none());
    assert_eq!(
        errors.filter_message("f2", "filterCondition"),
        Some("Filter condition required")
    );
    assert_eq!(errors.filter_message("f2", "filterValue"), Some("Filter value required"));
    assert_eq!(errors.filter_message("f2", "columnKey"), Some("Column key required"));
    assert_eq!(
        errors.filter_message("f3", "columnKey"),
        Some("Column 'total' is not enabled on the query")
    );

    insta::assert_snapshot!(errors.to_string(), @"columnFilters[f2].columnKey: Column key required; columnFilters[f2].filterCondition: Filter condition required; columnFilters[f2].filterValue: Filter value required; columnFilters[f3].columnKey: Column 'total' is not enabled on the query");
}

#[test]
fn test_errors_serialize_by_key() {
    let mut query = orders_query();
    query.name.clear();
    query.columns[0].display_name.clear();
    let errors = validate_query(&query, &default_renderers()).unwrap_err();
    let json = serde_json::to_value(&errors).unwrap();
    assert_eq!(json["fields"]["name"], "Name is required");
    assert_eq!(json["columns"]["id"]["displayName"], "Name is required");
}
