// crates/veilcraft-coordinator/src/config.rs
//
// Coordinator configuration. Embedded as the `[coordinator]` table of the
// daemon's TOML file, or built directly by library users.

use serde::{Deserialize, Serialize};

use veilcraft_core::error::CraftError;
use veilcraft_core::identity::Address;

/// Which aggregation the craft engine applies to a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CraftPolicyKind {
    /// Sum of value * weight over all contributors.
    #[default]
    WeightedSum,
    /// Sum of values, weights ignored.
    ValueSum,
}

/// Runtime configuration for one coordinator instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Name hashed into this instance's identity. The identity salts every
    /// state hash, so two instances never produce interchangeable commitments.
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    /// Minimum seconds between two actions of the same kind by one address.
    #[serde(default = "default_cooldown_seconds")]
    pub cooldown_seconds: u64,

    /// Aggregation applied when crafting.
    #[serde(default)]
    pub craft_policy: CraftPolicyKind,
}

fn default_instance_name() -> String {
    "veilcraft-coordinator".to_string()
}

fn default_cooldown_seconds() -> u64 {
    60
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            instance_name: default_instance_name(),
            cooldown_seconds: default_cooldown_seconds(),
            craft_policy: CraftPolicyKind::default(),
        }
    }
}

impl CoordinatorConfig {
    /// The system identity derived from `instance_name`.
    pub fn identity(&self) -> Address {
        Address::derive(&self.instance_name)
    }

    /// Reject configurations the coordinator cannot run with.
    ///
    /// # Errors
    /// Returns `CraftError::InvalidCooldown` if `cooldown_seconds` is zero.
    pub fn validate(&self) -> Result<(), CraftError> {
        if self.cooldown_seconds == 0 {
            return Err(CraftError::InvalidCooldown);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_to_missing_fields() {
        let config: CoordinatorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.cooldown_seconds, 60);
        assert_eq!(config.craft_policy, CraftPolicyKind::WeightedSum);
        assert_eq!(config.instance_name, "veilcraft-coordinator");
    }

    #[test]
    fn test_policy_parses_snake_case() {
        let config: CoordinatorConfig =
            serde_json::from_str(r#"{"craft_policy": "value_sum", "cooldown_seconds": 5}"#).unwrap();
        assert_eq!(config.craft_policy, CraftPolicyKind::ValueSum);
        assert_eq!(config.cooldown_seconds, 5);
    }

    #[test]
    fn test_zero_cooldown_is_invalid() {
        let config = CoordinatorConfig {
            cooldown_seconds: 0,
            ..CoordinatorConfig::default()
        };
        assert!(matches!(config.validate(), Err(CraftError::InvalidCooldown)));
        assert!(CoordinatorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_identity_follows_instance_name() {
        let a = CoordinatorConfig::default();
        let b = CoordinatorConfig {
            instance_name: "other".to_string(),
            ..CoordinatorConfig::default()
        };
        assert_eq!(a.identity(), CoordinatorConfig::default().identity());
        assert_ne!(a.identity(), b.identity());
    }
}
