use elif_datamodels::{Cast, JsonModel, Schema, Value, XmlModel};
use once_cell::sync::Lazy;
use serde_json::json;

mod common;
use common::object;

static COMMENT: Lazy<Schema> = Lazy::new(|| {
    Schema::new("comment")
        .with_root("comment")
        .with_cast("rate", Cast::Float)
        .with_default("author", json!("Can Gelis"))
        .with_default("rate", json!("0.0"))
});

#[test]
fn test_default_value_is_returned_when_it_doesnt_exist() {
    let mut comment = JsonModel::from_map(&COMMENT, object(json!({})));
    assert_eq!(comment.attribute("author").unwrap(), "Can Gelis");
}

#[test]
fn test_default_value_is_not_returned_when_the_value_exists() {
    let mut comment = JsonModel::from_map(&COMMENT, object(json!({"author": "Foo Bar"})));
    assert_eq!(comment.attribute("author").unwrap(), "Foo Bar");
}

#[test]
fn test_default_value_is_not_returned_when_the_value_is_null() {
    let mut comment = JsonModel::from_map(&COMMENT, object(json!({"author": null})));
    assert_eq!(comment.attribute("author").unwrap(), Value::Null);
}

#[test]
fn test_returns_null_when_there_is_no_default() {
    let mut comment = JsonModel::from_map(&COMMENT, object(json!({})));
    assert_eq!(comment.attribute("text").unwrap(), Value::Null);
}

#[test]
fn test_default_is_casted() {
    let mut comment = JsonModel::from_map(&COMMENT, object(json!({})));
    assert_eq!(comment.attribute("rate").unwrap(), Value::Float(0.0));
}

#[test]
fn test_resolved_default_is_exported() {
    let mut comment = JsonModel::from_map(&COMMENT, object(json!({"id": 3})));
    comment.attribute("author").unwrap();
    comment.attribute("text").unwrap();
    assert_eq!(
        comment.to_array(),
        json!({"id": 3, "author": "Can Gelis", "text": null})
    );
}

#[test]
fn test_tree_model_falls_back_to_default_only_when_absent() {
    let mut comment = XmlModel::from_xml_str(&COMMENT, "<comment><author/></comment>").unwrap();
    assert_eq!(comment.attribute("author").unwrap(), "");
    assert_eq!(comment.attribute("rate").unwrap(), Value::Float(0.0));
}
