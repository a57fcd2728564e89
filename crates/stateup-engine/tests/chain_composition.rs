//! Composing table steps across several versions

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use stateup_engine::{
    ChainConfigurationError, FieldRule, MappingTable, Synthesis, TableStep, UpgradeChain,
    UpgradeOptions, UpgradeStep, VersionedState,
};
use stateup_schema::{Attribute, AttributeKind, Shape};
use stateup_test_utils::{dynamic_string, from_bytes, to_bytes};
use stateup_value::LegacyKind;

fn shape_v0() -> Shape {
    Shape::new(0)
        .with_attribute("name", Attribute::required(AttributeKind::String))
        .with_attribute("note", Attribute::optional(AttributeKind::String))
        .with_attribute("legacy_flag", Attribute::optional(AttributeKind::String))
}

fn shape_v1() -> Shape {
    Shape::new(1)
        .with_attribute("title", Attribute::required(AttributeKind::String))
        .with_attribute("note", Attribute::optional(AttributeKind::String))
}

fn shape_v2() -> Shape {
    Shape::new(2)
        .with_attribute("title", Attribute::required(AttributeKind::String))
        .with_attribute("note", Attribute::optional(AttributeKind::Dynamic))
        .with_attribute("labels", Attribute::optional(AttributeKind::StringMap))
}

fn step_0_to_1() -> TableStep {
    let table = MappingTable::new()
        .rule(FieldRule::renamed("name", "title"))
        .rule(FieldRule::identity("note"))
        .rule(FieldRule::removed("legacy_flag"));
    TableStep::new("rename_name", shape_v0(), shape_v1(), table)
}

fn step_1_to_2() -> TableStep {
    let table = MappingTable::new()
        .rule(FieldRule::identity("title"))
        .rule(FieldRule::coerced("note", LegacyKind::Scalar))
        .rule(FieldRule::synthesized("labels", Synthesis::UnpopulatedMap));
    TableStep::new("widen_note", shape_v1(), shape_v2(), table)
}

fn chain() -> UpgradeChain {
    let steps: [Arc<dyn UpgradeStep>; 2] = [Arc::new(step_0_to_1()), Arc::new(step_1_to_2())];
    UpgradeChain::from_steps(2, steps).unwrap()
}

#[test]
fn chain_equals_manual_application() {
    let stored = to_bytes(&json!({"name": "w", "note": "hi", "legacy_flag": "on"}));

    let resolution = chain().resolve(&VersionedState::new(0, stored.clone()));
    assert!(resolution.is_success());
    assert!(resolution.diagnostics.is_empty());
    let resolved = resolution.state.unwrap();
    assert_eq!(resolved.version, 2);

    let first = step_0_to_1().upgrade(&stored);
    let second = step_1_to_2().upgrade(&first.state.unwrap());
    assert_eq!(Some(resolved.bytes.clone()), second.state);

    assert_eq!(
        from_bytes(&resolved.bytes),
        json!({"title": "w", "note": dynamic_string("hi"), "labels": {}})
    );
    assert_eq!(
        resolution.path.to_string(),
        "0 -[rename_name]-> 1 -[widen_note]-> 2"
    );
}

#[test]
fn record_at_intermediate_version_finishes_the_chain() {
    let stored = to_bytes(&json!({"title": "w", "note": ""}));
    let resolution = chain().resolve(&VersionedState::new(1, stored));
    assert!(resolution.is_success());
    assert_eq!(resolution.path.hops().len(), 1);
    assert_eq!(
        from_bytes(&resolution.state.unwrap().bytes),
        json!({"title": "w", "note": null, "labels": {}})
    );
}

#[test]
fn failure_in_first_step_stops_the_chain() {
    let stored = to_bytes(&json!({"note": "hi"}));
    let resolution = chain().resolve(&VersionedState::new(0, stored));
    assert!(!resolution.is_success());
    assert!(resolution.state.is_none());
    assert!(resolution.path.is_empty());
    assert_eq!(resolution.diagnostics.errors().count(), 1);
}

#[test]
fn failure_in_second_step_reports_its_diagnostics() {
    // version 1 document carrying a field version 1 does not declare
    let stored = to_bytes(&json!({"title": "w", "extra": 1}));
    let resolution = chain().resolve(&VersionedState::new(1, stored));
    assert!(resolution.state.is_none());
    let errors: Vec<_> = resolution.diagnostics.errors().collect();
    assert_eq!(errors[0].summary, "failed to decode prior state");
    assert!(errors[0].detail.contains("extra"), "{}", errors[0].detail);
}

#[test]
fn duplicate_step_is_a_configuration_error() {
    let steps: [Arc<dyn UpgradeStep>; 2] = [Arc::new(step_0_to_1()), Arc::new(step_0_to_1())];
    assert_eq!(
        UpgradeChain::from_steps(2, steps).unwrap_err(),
        ChainConfigurationError::DuplicateStep(0)
    );
}

#[test]
fn missing_step_is_a_configuration_error() {
    let steps: [Arc<dyn UpgradeStep>; 1] = [Arc::new(step_0_to_1())];
    assert_eq!(
        UpgradeChain::from_steps(2, steps).unwrap_err(),
        ChainConfigurationError::MissingStep(1)
    );
}

#[test]
fn inconsistent_table_is_caught_at_registration() {
    let table = MappingTable::new().rule(FieldRule::identity("title"));
    let broken = TableStep::new("broken", shape_v1(), shape_v2(), table);
    let mut chain = UpgradeChain::new().with_current_version(2);
    let err = chain.register_step(Arc::new(broken)).unwrap_err();
    assert!(matches!(err, ChainConfigurationError::Table { ref name, .. } if name == "broken"));
    assert!(chain.is_empty());
}

#[test]
fn options_reach_every_step() {
    let options = UpgradeOptions::new().with_unpopulated_maps(stateup_engine::MapSynthesis::Null);
    let step = step_1_to_2().with_options(options);
    let response = step.upgrade(&to_bytes(&json!({"title": "w"})));
    assert_eq!(from_bytes(&response.state.unwrap())["labels"], json!(null));
}
