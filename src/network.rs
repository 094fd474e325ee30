//! Network profiles: which addresses and ids a dispatch targets.
//!
//! A profile carries an object-chain section, an EVM section, or both.
//! Profiles are read-only once a registry is built and are resolved once per
//! dispatch call.

use crate::address::{parse_evm_address, validate_type_tag, SuiAddress};
use crate::error::IntentError;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

pub const DEFAULT_NETWORK: &str = "MAINNET";

/// Mainnet executor package
pub const MAINNET_EXECUTOR_ADDRESS: &str =
    "0x7c884688fbe4e9d67579a50361f09ebcf59a55c3f589b20f207cfa555c0ba019";
/// Mainnet shared protocol config object
pub const MAINNET_PROTOCOL_CONFIG_ID: &str =
    "0x3492c874c1e3b3e2984e8c41b589e642d4d0a5d6459e5a9cfc2d52fd7c89c267";
/// Shared clock object
pub const CLOCK_ID: &str = "0x6";
/// Canonical USDC coin type on mainnet
pub const MAINNET_USDC_TYPE: &str =
    "0x5d4b302506645c37ff133b98c4b50a5ae14841659738d6d733d59d0d217a93bf::coin::COIN";

/// Object-chain section of a network profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveProfile {
    pub executor_address: String,
    pub protocol_config_id: String,
    pub clock_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usdc_type: Option<String>,
}

impl MoveProfile {
    fn validate(&self, network: &str) -> Result<(), IntentError> {
        let bad = |what: &str, value: &str| {
            IntentError::InvalidInput(format!("network {}: invalid {}: {}", network, what, value))
        };
        for (what, value) in [
            ("executorAddress", &self.executor_address),
            ("protocolConfigId", &self.protocol_config_id),
            ("clockId", &self.clock_id),
        ] {
            value
                .parse::<SuiAddress>()
                .map_err(|_| bad(what, value))?;
        }
        if let Some(usdc) = &self.usdc_type {
            validate_type_tag(usdc).map_err(|_| bad("usdcType", usdc))?;
        }
        Ok(())
    }
}

/// EVM section of a network profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmProfile {
    pub token_factory_address: String,
    pub pool_creator_address: String,
    pub provider_endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
}

impl EvmProfile {
    fn validate(&self, network: &str) -> Result<(), IntentError> {
        for (what, value) in [
            ("tokenFactoryAddress", &self.token_factory_address),
            ("poolCreatorAddress", &self.pool_creator_address),
        ] {
            parse_evm_address(value, what).map_err(|_| {
                IntentError::InvalidInput(format!(
                    "network {}: invalid {}: {}",
                    network, what, value
                ))
            })?;
        }
        Ok(())
    }
}

/// Configuration selected for one dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawProfile", into = "RawProfile")]
pub enum NetworkProfile {
    Move(MoveProfile),
    Evm(EvmProfile),
    Both { sui: MoveProfile, evm: EvmProfile },
}

impl NetworkProfile {
    pub fn move_profile(&self) -> Option<&MoveProfile> {
        match self {
            NetworkProfile::Move(m) | NetworkProfile::Both { sui: m, .. } => Some(m),
            NetworkProfile::Evm(_) => None,
        }
    }

    pub fn evm_profile(&self) -> Option<&EvmProfile> {
        match self {
            NetworkProfile::Evm(e) | NetworkProfile::Both { evm: e, .. } => Some(e),
            NetworkProfile::Move(_) => None,
        }
    }
}

/// JSON shape of a profile: `{ "move": {..}, "evm": {..} }`
#[derive(Serialize, Deserialize)]
struct RawProfile {
    #[serde(rename = "move", default, skip_serializing_if = "Option::is_none")]
    sui: Option<MoveProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    evm: Option<EvmProfile>,
}

impl TryFrom<RawProfile> for NetworkProfile {
    type Error = String;

    fn try_from(raw: RawProfile) -> Result<Self, Self::Error> {
        match (raw.sui, raw.evm) {
            (Some(sui), Some(evm)) => Ok(NetworkProfile::Both { sui, evm }),
            (Some(sui), None) => Ok(NetworkProfile::Move(sui)),
            (None, Some(evm)) => Ok(NetworkProfile::Evm(evm)),
            (None, None) => Err("profile needs a `move` or `evm` section".to_string()),
        }
    }
}

impl From<NetworkProfile> for RawProfile {
    fn from(profile: NetworkProfile) -> Self {
        match profile {
            NetworkProfile::Move(sui) => RawProfile {
                sui: Some(sui),
                evm: None,
            },
            NetworkProfile::Evm(evm) => RawProfile {
                sui: None,
                evm: Some(evm),
            },
            NetworkProfile::Both { sui, evm } => RawProfile {
                sui: Some(sui),
                evm: Some(evm),
            },
        }
    }
}

/// A profile resolved for a specific network id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNetwork {
    pub id: String,
    pub profile: NetworkProfile,
}

/// Network id -> profile table. Ids are stored upper-cased.
///
/// Deserializing applies the same validation as [`NetworkRegistry::from_json`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "BTreeMap<String, NetworkProfile>")]
pub struct NetworkRegistry {
    profiles: BTreeMap<String, NetworkProfile>,
}

impl Serialize for NetworkRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.profiles.serialize(serializer)
    }
}

impl TryFrom<BTreeMap<String, NetworkProfile>> for NetworkRegistry {
    type Error = IntentError;

    fn try_from(parsed: BTreeMap<String, NetworkProfile>) -> Result<Self, Self::Error> {
        let mut registry = Self::empty();
        for (id, profile) in parsed {
            if let Some(sui) = profile.move_profile() {
                sui.validate(&id)?;
            }
            if let Some(evm) = profile.evm_profile() {
                evm.validate(&id)?;
            }
            registry.insert(&id, profile);
        }
        Ok(registry)
    }
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl NetworkRegistry {
    /// Registry with no profiles
    pub fn empty() -> Self {
        NetworkRegistry {
            profiles: BTreeMap::new(),
        }
    }

    /// The profiles compiled into the library
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.insert(
            DEFAULT_NETWORK,
            NetworkProfile::Move(MoveProfile {
                executor_address: MAINNET_EXECUTOR_ADDRESS.to_string(),
                protocol_config_id: MAINNET_PROTOCOL_CONFIG_ID.to_string(),
                clock_id: CLOCK_ID.to_string(),
                usdc_type: Some(MAINNET_USDC_TYPE.to_string()),
            }),
        );
        registry
    }

    /// Parse profiles from JSON and validate every address in them.
    pub fn from_json(json: &str) -> Result<Self, IntentError> {
        let parsed: BTreeMap<String, NetworkProfile> = serde_json::from_str(json)
            .map_err(|e| IntentError::InvalidInput(format!("network registry: {}", e)))?;
        Self::try_from(parsed)
    }

    pub fn insert(&mut self, id: &str, profile: NetworkProfile) {
        self.profiles.insert(id.to_ascii_uppercase(), profile);
    }

    /// Overlay `other` on top of this registry. Profiles with the same id are
    /// replaced wholesale.
    pub fn merge(mut self, other: NetworkRegistry) -> Self {
        self.profiles.extend(other.profiles);
        self
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    /// Look up a network id (case-insensitive)
    pub fn resolve(&self, id: &str) -> Result<ResolvedNetwork, IntentError> {
        let key = id.to_ascii_uppercase();
        self.profiles
            .get(&key)
            .map(|profile| ResolvedNetwork {
                id: key.clone(),
                profile: profile.clone(),
            })
            .ok_or_else(|| IntentError::InvalidNetwork(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVM_ONLY: &str = r#"{
        "sepolia": {
            "evm": {
                "tokenFactoryAddress": "0x5FbDB2315678afecb367f032d93F642f64180aa3",
                "poolCreatorAddress": "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512",
                "providerEndpoint": "https://rpc.sepolia.org",
                "chainId": 11155111
            }
        }
    }"#;

    #[test]
    fn test_builtin_mainnet() {
        let net = NetworkRegistry::builtin().resolve("mainnet").unwrap();
        assert_eq!(net.id, "MAINNET");
        let sui = net.profile.move_profile().unwrap();
        assert_eq!(sui.clock_id, "0x6");
        assert_eq!(sui.usdc_type.as_deref(), Some(MAINNET_USDC_TYPE));
        assert!(net.profile.evm_profile().is_none());
    }

    #[test]
    fn test_unknown_network() {
        let err = NetworkRegistry::builtin().resolve("LOCALNET").unwrap_err();
        assert!(matches!(err, IntentError::InvalidNetwork(ref id) if id == "LOCALNET"));
    }

    #[test]
    fn test_from_json_evm_only() {
        let registry = NetworkRegistry::builtin().merge(NetworkRegistry::from_json(EVM_ONLY).unwrap());
        let net = registry.resolve("SEPOLIA").unwrap();
        assert!(matches!(net.profile, NetworkProfile::Evm(_)));
        assert_eq!(net.profile.evm_profile().unwrap().chain_id, Some(11155111));
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["MAINNET", "SEPOLIA"]);
    }

    #[test]
    fn test_from_json_rejects_empty_profile() {
        assert!(NetworkRegistry::from_json(r#"{ "TESTNET": {} }"#).is_err());
    }

    #[test]
    fn test_from_json_rejects_placeholder_ids() {
        let json = r#"{ "TESTNET": { "move": {
            "executorAddress": "0x...", "protocolConfigId": "0x...", "clockId": "0x6"
        } } }"#;
        let err = NetworkRegistry::from_json(json).unwrap_err();
        assert!(err.to_string().contains("executorAddress"));
    }

    #[test]
    fn test_profile_json_shape() {
        let registry = NetworkRegistry::builtin();
        let value = serde_json::to_value(&registry).unwrap();
        assert_eq!(
            value["MAINNET"]["move"]["executorAddress"],
            MAINNET_EXECUTOR_ADDRESS
        );
        let back: NetworkRegistry = serde_json::from_value(value).unwrap();
        assert_eq!(back, registry);
    }

    #[test]
    fn test_deserialize_matches_from_json() {
        let registry: NetworkRegistry = serde_json::from_str(EVM_ONLY).unwrap();
        assert_eq!(registry, NetworkRegistry::from_json(EVM_ONLY).unwrap());
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["SEPOLIA"]);

        let json = r#"{ "TESTNET": { "move": {
            "executorAddress": "0x...", "protocolConfigId": "0x...", "clockId": "0x6"
        } } }"#;
        let err = serde_json::from_str::<NetworkRegistry>(json).unwrap_err();
        assert!(err.to_string().contains("executorAddress"));
    }
}
