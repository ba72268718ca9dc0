use nova_config::json_schema;

#[test]
fn schema_describes_both_tables() {
    let schema = serde_json::to_value(json_schema()).expect("serialize schema");
    let properties = &schema["properties"];
    assert!(properties.get("cdi").is_some());
    assert!(properties.get("logging").is_some());

    let cdi = &schema["definitions"]["CdiConfig"];
    assert_eq!(cdi["additionalProperties"], serde_json::Value::Bool(false));
    assert!(cdi["properties"].get("generation_threads").is_some());
}
