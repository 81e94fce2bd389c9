//! SQL shape tests for the qb module.

use serde_json::{Map, Value, json};

use crate::error::DbError;
use crate::qb::{SqlQb, delete, insert, select, update};

fn map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(m) => m,
        other => panic!("expected object, got {other}"),
    }
}

#[test]
fn test_select_basic() {
    let qb = select("users");
    assert_eq!(qb.to_sql(), "SELECT * FROM users");
}

#[test]
fn test_select_with_conditions_and_limit() {
    let qb = select("users")
        .eq("status", json!("active"))
        .eq("age", json!(30))
        .limit(10);

    let (sql, params) = qb.build();
    assert_eq!(
        sql,
        "SELECT * FROM users WHERE status = $1 AND age = $2 LIMIT $3"
    );
    let labels: Vec<&str> = params.iter().map(|p| p.label.as_str()).collect();
    assert_eq!(labels, ["status", "age", "LIMIT"]);
    assert_eq!(params.iter().last().unwrap().value, json!(10));
}

#[test]
fn test_select_null_filter() {
    let qb = select("users").eq_map(&map(json!({"deleted_at": null})));
    let (sql, params) = qb.build();
    assert_eq!(sql, "SELECT * FROM users WHERE deleted_at IS NULL");
    assert!(params.is_empty());
}

#[test]
fn test_select_limit_keeps_string_value() {
    let (sql, params) = select("users").limit(json!("5")).build();
    assert_eq!(sql, "SELECT * FROM users LIMIT $1");
    assert_eq!(params.iter().next().unwrap().value, json!("5"));
}

#[test]
fn test_insert_basic() {
    let qb = insert("users")
        .set("username", json!("alice"))
        .set("email", json!("alice@example.com"));

    assert_eq!(
        qb.to_sql(),
        "INSERT INTO users (username, email) VALUES ($1, $2)"
    );
}

#[test]
fn test_insert_returning() {
    let qb = insert("users")
        .set_map(&map(json!({"name": "alice"})))
        .returning("id");
    assert_eq!(
        qb.to_sql(),
        "INSERT INTO users (name) VALUES ($1) RETURNING id"
    );
}

#[test]
fn test_insert_without_columns_uses_defaults() {
    let qb = insert("users").returning("id");
    assert_eq!(qb.to_sql(), "INSERT INTO users DEFAULT VALUES RETURNING id");
}

#[test]
fn test_insert_quoted_table() {
    let qb = insert("public.\"Order Items\"").set("qty", json!(1));
    assert_eq!(
        qb.to_sql(),
        "INSERT INTO public.\"Order Items\" (qty) VALUES ($1)"
    );
}

#[test]
fn test_update_basic() {
    let qb = update("users")
        .set("status", json!("inactive"))
        .eq("id", json!(1));
    assert_eq!(qb.to_sql(), "UPDATE users SET status = $1 WHERE id = $2");
    assert!(qb.has_conditions());
}

#[test]
fn test_update_maps() {
    let qb = update("users")
        .set_map(&map(json!({"age": 31, "name": "bob"})))
        .eq_map(&map(json!({"id": 3})));
    let (sql, params) = qb.build();
    assert_eq!(sql, "UPDATE users SET age = $1, name = $2 WHERE id = $3");
    assert_eq!(params.len(), 3);
}

#[test]
fn test_update_safe_default() {
    let qb = update("users").set("status", json!("x"));
    assert_eq!(qb.to_sql(), "UPDATE users SET status = $1 WHERE 1=0");
    assert!(!qb.has_conditions());
}

#[test]
fn test_update_requires_set() {
    let err = update("users").eq("id", json!(1)).validate().unwrap_err();
    assert!(matches!(err, DbError::Validation(_)));
}

#[test]
fn test_delete_basic() {
    let qb = delete("users").eq("id", json!(1));
    assert_eq!(qb.to_sql(), "DELETE FROM users WHERE id = $1");
}

#[test]
fn test_delete_safe_default() {
    let qb = delete("users");
    // Without WHERE, should generate safe no-op
    assert_eq!(qb.to_sql(), "DELETE FROM users WHERE 1=0");
}

#[test]
fn test_invalid_table_fails_validation() {
    assert!(select("users; DROP TABLE users").validate().is_err());
    assert!(insert("").validate().is_err());
    assert!(update("a b").set("x", json!(1)).validate().is_err());
    assert!(delete("1users").validate().is_err());
}

#[test]
fn test_invalid_column_fails_validation() {
    let err = insert("users")
        .set("name) VALUES ('x'); --", json!(1))
        .validate()
        .unwrap_err();
    assert!(matches!(err, DbError::Validation(_)));

    assert!(select("users").eq("a=1 OR 1", json!(1)).validate().is_err());
    assert!(delete("users").eq("", json!(1)).validate().is_err());
}

