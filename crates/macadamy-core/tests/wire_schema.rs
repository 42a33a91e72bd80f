//! JsonSchema checks for records that cross a persistence boundary.

use chrono::Utc;
use schemars::schema_for;
use serde_json::json;

use macadamy_core::profile::ProfileRow;
use macadamy_core::{DemoSession, SelectedOrganizationValidation};

/// Validate a JSON value against a schemars-generated schema.
fn validate_against_schema(
    schema: &serde_json::Value,
    instance: &serde_json::Value,
) -> Vec<String> {
    let validator = jsonschema::validator_for(schema).expect("schema should be valid");
    validator
        .iter_errors(instance)
        .map(|e| format!("{e}"))
        .collect()
}

#[test]
fn web_client_demo_record_matches_schema() {
    let schema = serde_json::to_value(schema_for!(DemoSession)).unwrap();
    let stored = json!({
        "sessionId": "2b1f6a8e-demo",
        "userId": "6c0e2a9d-user",
        "createdAt": 1_735_689_600_000_i64
    });

    let errors = validate_against_schema(&schema, &stored);
    assert!(errors.is_empty(), "schema errors: {errors:?}");

    let parsed: DemoSession = serde_json::from_value(stored).unwrap();
    assert_eq!(parsed.session_id, "2b1f6a8e-demo");
    assert!(parsed.created_at_utc().is_some());
}

#[test]
fn snake_case_demo_record_is_rejected() {
    let schema = serde_json::to_value(schema_for!(DemoSession)).unwrap();
    let stored = json!({
        "session_id": "s",
        "user_id": "u",
        "created_at": Utc::now().timestamp_millis()
    });

    assert!(!validate_against_schema(&schema, &stored).is_empty());
    assert!(serde_json::from_value::<DemoSession>(stored).is_err());
}

#[test]
fn decoded_profile_serializes_within_schema() {
    let profile = ProfileRow::decode(json!({
        "id": "user-1",
        "role": "inspector",
        "email": "i@example.com",
        "organization_id": "org-1",
        "organizations": {"id": "org-1", "name": "Org One"}
    }))
    .unwrap();

    let schema = serde_json::to_value(schema_for!(macadamy_core::Profile)).unwrap();
    let instance = serde_json::to_value(&profile).unwrap();
    let errors = validate_against_schema(&schema, &instance);
    assert!(errors.is_empty(), "schema errors: {errors:?}");
}

#[test]
fn validation_result_schema_accepts_cleared_selection() {
    let schema = serde_json::to_value(schema_for!(SelectedOrganizationValidation)).unwrap();
    let instance = json!({
        "validated_selected_organization_id": null,
        "validated_active_membership": false,
        "should_clear_selection": true
    });
    assert!(validate_against_schema(&schema, &instance).is_empty());
}
