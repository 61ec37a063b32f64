//! Model selection policy.
//!
//! Routing is pure selection over the capability table: honor the
//! requested tier unless an image is attached and that tier's model
//! cannot accept one, in which case fall back to the first image-capable
//! row. The assembly strategy derives solely from the chosen row, so a
//! decision can never contradict the table.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::capability::{CapabilityTable, ModelCapability};
use crate::core::error::ChatError;

/// Coarse model selection exposed to the user: a higher-quota default
/// and a lower-quota, more capable alternative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Basic,
    Elevated,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Basic => "basic",
            Tier::Elevated => "elevated",
        }
    }
}

/// How the persona instruction reaches the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonaStrategy {
    /// The model accepts a native system-instruction field.
    SystemField,
    /// The persona text is concatenated ahead of the user text in a
    /// single text block, for models without system-instruction support.
    InlineText,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingDecision {
    pub model_id: String,
    pub strategy: PersonaStrategy,
    pub use_history: bool,
}

fn decision_for(row: &ModelCapability) -> RoutingDecision {
    // Models without native persona support are also treated as
    // stateless, to bound prompt growth under the inline strategy.
    if row.supports_system_instruction {
        RoutingDecision {
            model_id: row.id.clone(),
            strategy: PersonaStrategy::SystemField,
            use_history: row.supports_history,
        }
    } else {
        RoutingDecision {
            model_id: row.id.clone(),
            strategy: PersonaStrategy::InlineText,
            use_history: false,
        }
    }
}

/// Pick a model and assembly strategy for one request.
pub fn route(
    tier: Tier,
    has_image: bool,
    table: &CapabilityTable,
) -> Result<RoutingDecision, ChatError> {
    if table.is_empty() {
        return Err(ChatError::EmptyCapabilityTable);
    }

    let tier_row = table
        .default_for_tier(tier)
        .or_else(|| table.rows().first())
        .expect("non-empty table has a first row");

    let selected = if has_image && !tier_row.supports_image {
        match table.first_image_capable() {
            Some(fallback) => {
                debug!(
                    tier = tier.as_str(),
                    from = %tier_row.id,
                    to = %fallback.id,
                    "image attached; overriding tier selection"
                );
                fallback
            }
            // No image-capable row anywhere; send to the tier's model
            // and let the backend report the unsupported modality.
            None => tier_row,
        }
    } else {
        tier_row
    };

    Ok(decision_for(selected))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(
        id: &str,
        tier: Option<Tier>,
        system: bool,
        image: bool,
        history: bool,
    ) -> ModelCapability {
        ModelCapability {
            id: id.to_string(),
            display_name: id.to_string(),
            tier,
            supports_system_instruction: system,
            supports_image: image,
            supports_history: history,
        }
    }

    fn hybrid_table() -> CapabilityTable {
        CapabilityTable::new(vec![
            row("text-basic", Some(Tier::Basic), false, false, false),
            row("vision-fallback", None, false, true, false),
            row("full-elevated", Some(Tier::Elevated), true, true, true),
        ])
    }

    #[test]
    fn empty_table_is_a_configuration_error() {
        let table = CapabilityTable::new(vec![]);
        assert_eq!(
            route(Tier::Basic, false, &table),
            Err(ChatError::EmptyCapabilityTable)
        );
    }

    #[test]
    fn honors_requested_tier_without_image() {
        let table = hybrid_table();
        let decision = route(Tier::Basic, false, &table).unwrap();
        assert_eq!(decision.model_id, "text-basic");

        let decision = route(Tier::Elevated, false, &table).unwrap();
        assert_eq!(decision.model_id, "full-elevated");
    }

    #[test]
    fn image_forces_fallback_when_tier_model_is_text_only() {
        let table = hybrid_table();
        let decision = route(Tier::Basic, true, &table).unwrap();
        assert_eq!(decision.model_id, "vision-fallback");
        assert_eq!(decision.strategy, PersonaStrategy::InlineText);
        assert!(!decision.use_history);
    }

    #[test]
    fn image_does_not_override_an_image_capable_tier() {
        let table = hybrid_table();
        let decision = route(Tier::Elevated, true, &table).unwrap();
        assert_eq!(decision.model_id, "full-elevated");
    }

    #[test]
    fn strategy_always_matches_capability_row() {
        let table = hybrid_table();
        for tier in [Tier::Basic, Tier::Elevated] {
            for has_image in [false, true] {
                let decision = route(tier, has_image, &table).unwrap();
                let row = table.find(&decision.model_id).expect("row must exist");
                match decision.strategy {
                    PersonaStrategy::SystemField => {
                        assert!(row.supports_system_instruction)
                    }
                    PersonaStrategy::InlineText => {
                        assert!(!row.supports_system_instruction)
                    }
                }
            }
        }
    }

    #[test]
    fn image_fallback_always_supports_images() {
        let table = hybrid_table();
        for tier in [Tier::Basic, Tier::Elevated] {
            let decision = route(tier, true, &table).unwrap();
            let row = table.find(&decision.model_id).unwrap();
            assert!(row.supports_image);
        }
    }

    #[test]
    fn system_capable_but_stateless_row_keeps_system_strategy() {
        let table = CapabilityTable::new(vec![row(
            "system-no-history",
            Some(Tier::Basic),
            true,
            false,
            false,
        )]);
        let decision = route(Tier::Basic, false, &table).unwrap();
        assert_eq!(decision.strategy, PersonaStrategy::SystemField);
        assert!(!decision.use_history);
    }

    #[test]
    fn table_without_any_image_row_keeps_tier_model() {
        let table = CapabilityTable::new(vec![row(
            "text-only",
            Some(Tier::Basic),
            false,
            false,
            false,
        )]);
        let decision = route(Tier::Basic, true, &table).unwrap();
        assert_eq!(decision.model_id, "text-only");
    }
}
