//! Built-in model capability table
//!
//! This module handles loading the capability rows the router selects
//! from, embedded from the builtin_models.toml file at build time.

use serde::{Deserialize, Serialize};

use crate::core::router::Tier;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCapability {
    pub id: String,
    pub display_name: String,
    /// Tier this row is the default model for. Rows without a tier are
    /// reachable only through the image fallback.
    pub tier: Option<Tier>,
    pub supports_system_instruction: bool,
    pub supports_image: bool,
    pub supports_history: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct CapabilityTableConfig {
    models: Vec<ModelCapability>,
}

#[derive(Debug, Clone)]
pub struct CapabilityTable {
    rows: Vec<ModelCapability>,
}

impl CapabilityTable {
    pub fn new(rows: Vec<ModelCapability>) -> Self {
        Self { rows }
    }

    /// Load the built-in table from the embedded configuration.
    pub fn builtin() -> Self {
        const CONFIG_CONTENT: &str = include_str!("../builtin_models.toml");

        let config: CapabilityTableConfig =
            toml::from_str(CONFIG_CONTENT).expect("Failed to parse builtin_models.toml");

        Self::new(config.models)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[ModelCapability] {
        &self.rows
    }

    pub fn find(&self, id: &str) -> Option<&ModelCapability> {
        self.rows.iter().find(|row| row.id.eq_ignore_ascii_case(id))
    }

    /// Default row for a tier, if the table declares one.
    pub fn default_for_tier(&self, tier: Tier) -> Option<&ModelCapability> {
        self.rows.iter().find(|row| row.tier == Some(tier))
    }

    /// First image-capable row in table order.
    pub fn first_image_capable(&self) -> Option<&ModelCapability> {
        self.rows.iter().find(|row| row.supports_image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_has_expected_models() {
        let table = CapabilityTable::builtin();
        assert!(!table.is_empty());

        let ids: Vec<&str> = table.rows().iter().map(|row| row.id.as_str()).collect();
        assert!(ids.contains(&"gemma-3-27b-it"));
        assert!(ids.contains(&"gemini-2.5-flash"));
        assert!(ids.contains(&"gemini-2.5-pro"));
    }

    #[test]
    fn builtin_table_declares_both_tiers() {
        let table = CapabilityTable::builtin();
        assert_eq!(
            table.default_for_tier(Tier::Basic).map(|r| r.id.as_str()),
            Some("gemma-3-27b-it")
        );
        assert_eq!(
            table.default_for_tier(Tier::Elevated).map(|r| r.id.as_str()),
            Some("gemini-2.5-pro")
        );
    }

    #[test]
    fn find_is_case_insensitive() {
        let table = CapabilityTable::builtin();
        let row = table.find("Gemma-3-27B-IT");
        assert!(row.is_some());
        assert_eq!(row.unwrap().id, "gemma-3-27b-it");

        assert!(table.find("nonexistent").is_none());
    }

    #[test]
    fn basic_tier_model_is_text_only() {
        let table = CapabilityTable::builtin();
        let gemma = table.find("gemma-3-27b-it").unwrap();
        assert!(!gemma.supports_system_instruction);
        assert!(!gemma.supports_image);
        assert!(!gemma.supports_history);
    }

    #[test]
    fn image_fallback_precedes_elevated_row() {
        let table = CapabilityTable::builtin();
        let fallback = table.first_image_capable().unwrap();
        assert_eq!(fallback.id, "gemini-2.5-flash");
    }
}
