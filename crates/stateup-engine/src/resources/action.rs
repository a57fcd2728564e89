//! Resource action state, version 0 to version 2
//!
//! Version 0 stored `body`, `output` and `response_export_values` as plain
//! strings and string lists. Version 2 stores them as dynamic values and adds
//! sensitive outputs, a retry block, request headers and query parameters.
//! There is no version 1; the single step hops straight from 0 to 2.

use std::sync::Arc;

use stateup_schema::{Attribute, AttributeKind, Shape};
use stateup_value::LegacyKind;

use crate::chain::UpgradeChain;
use crate::error::ChainConfigurationError;
use crate::mapping::{FieldRule, MappingTable, Synthesis};
use crate::options::UpgradeOptions;
use crate::step::{TableStep, UpgradeStep};

/// Oldest stored version
pub const PRIOR_VERSION: u64 = 0;

/// Current version
pub const CURRENT_VERSION: u64 = 2;

/// Value of `when` for records that never set it
pub const DEFAULT_WHEN: &str = "apply";

/// Name of the 0 to 2 step
pub const STEP_NAME: &str = "resource_action_v0_to_v2";

/// Version 0 shape
#[must_use]
pub fn prior_shape() -> Shape {
    use AttributeKind::{Opaque, String, StringList};

    Shape::new(PRIOR_VERSION)
        .with_attribute("id", Attribute::computed(String))
        .with_attribute("type", Attribute::required(String))
        .with_attribute("resource_id", Attribute::required(String))
        .with_attribute("action", Attribute::optional(String))
        .with_attribute("method", Attribute::optional_computed(String))
        .with_attribute("body", Attribute::optional(String))
        .with_attribute("when", Attribute::optional_computed(String))
        .with_attribute("locks", Attribute::optional(StringList))
        .with_attribute("response_export_values", Attribute::optional(StringList))
        .with_attribute("output", Attribute::computed(String))
        .with_attribute("timeouts", Attribute::optional(Opaque))
}

/// Version 2 shape
#[must_use]
pub fn current_shape() -> Shape {
    use AttributeKind::{Dynamic, Opaque, String, StringList, StringListMap, StringMap};

    Shape::new(CURRENT_VERSION)
        .with_attribute("id", Attribute::computed(String))
        .with_attribute("type", Attribute::required(String))
        .with_attribute("resource_id", Attribute::required(String))
        .with_attribute("action", Attribute::optional(String))
        .with_attribute("method", Attribute::optional_computed(String))
        .with_attribute("body", Attribute::optional(Dynamic))
        .with_attribute("when", Attribute::optional_computed(String))
        .with_attribute("locks", Attribute::optional(StringList))
        .with_attribute("response_export_values", Attribute::optional(Dynamic))
        .with_attribute(
            "sensitive_response_export_values",
            Attribute::optional(Dynamic),
        )
        .with_attribute("output", Attribute::computed(Dynamic))
        .with_attribute("sensitive_output", Attribute::computed(Dynamic).sensitive())
        .with_attribute("timeouts", Attribute::optional(Opaque))
        .with_attribute("retry", Attribute::optional(Opaque))
        .with_attribute("headers", Attribute::optional(StringMap))
        .with_attribute("query_parameters", Attribute::optional(StringListMap))
}

/// Rules taking version 0 to version 2
#[must_use]
pub fn mapping_table() -> MappingTable {
    MappingTable::new()
        .rule(FieldRule::identity("id"))
        .rule(FieldRule::identity("type"))
        .rule(FieldRule::identity("resource_id"))
        .rule(FieldRule::identity("action"))
        .rule(FieldRule::identity("method"))
        .rule(FieldRule::coerced("body", LegacyKind::Scalar))
        .rule(FieldRule::defaulted("when", DEFAULT_WHEN))
        .rule(FieldRule::identity("locks"))
        .rule(FieldRule::coerced("response_export_values", LegacyKind::List))
        .rule(FieldRule::synthesized(
            "sensitive_response_export_values",
            Synthesis::DynamicNull,
        ))
        .rule(FieldRule::coerced("output", LegacyKind::Scalar))
        .rule(FieldRule::synthesized("sensitive_output", Synthesis::DynamicNull))
        .rule(FieldRule::identity("timeouts"))
        .rule(FieldRule::synthesized("retry", Synthesis::Null))
        // no legacy source; see UpgradeOptions::unpopulated_maps
        .rule(FieldRule::synthesized("headers", Synthesis::UnpopulatedMap))
        .rule(FieldRule::synthesized("query_parameters", Synthesis::UnpopulatedMap))
}

/// The 0 to 2 step
#[must_use]
pub fn upgrade_step(options: UpgradeOptions) -> TableStep {
    TableStep::new(STEP_NAME, prior_shape(), current_shape(), mapping_table()).with_options(options)
}

/// Chain bringing any stored version to [`CURRENT_VERSION`]
///
/// # Errors
/// Only if the declared shapes and table disagree
pub fn upgrade_chain(options: UpgradeOptions) -> Result<UpgradeChain, ChainConfigurationError> {
    let step: Arc<dyn UpgradeStep> = Arc::new(upgrade_step(options));
    UpgradeChain::from_steps(CURRENT_VERSION, [step])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_shapes() {
        assert_eq!(mapping_table().validate(&prior_shape(), &current_shape()), Ok(()));
        assert_eq!(mapping_table().len(), current_shape().len());
    }

    #[test]
    fn only_sensitive_output_is_sensitive() {
        let shape = current_shape();
        let sensitive: Vec<_> = shape
            .attributes()
            .filter(|(_, attribute)| attribute.is_sensitive())
            .map(|(name, _)| name)
            .collect();
        assert_eq!(sensitive, vec!["sensitive_output"]);
    }

    #[test]
    fn step_hops_zero_to_two() {
        let step = upgrade_step(UpgradeOptions::default());
        assert_eq!(step.from_version(), PRIOR_VERSION);
        assert_eq!(step.to_version(), CURRENT_VERSION);
        assert_eq!(step.name(), STEP_NAME);
    }

    #[test]
    fn chain_has_single_step() {
        let chain = upgrade_chain(UpgradeOptions::default()).unwrap();
        assert_eq!(chain.versions().collect::<Vec<_>>(), vec![PRIOR_VERSION]);
        assert_eq!(chain.current_version(), Some(CURRENT_VERSION));
    }

    #[test]
    fn synthesized_rules() {
        let table = mapping_table();
        for field in ["sensitive_output", "sensitive_response_export_values"] {
            assert_eq!(
                table.rule_for(field),
                Some(&FieldRule::synthesized(field, Synthesis::DynamicNull))
            );
        }
        assert_eq!(
            table.rule_for("retry"),
            Some(&FieldRule::synthesized("retry", Synthesis::Null))
        );
    }
}
