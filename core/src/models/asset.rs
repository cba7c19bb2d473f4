use serde::{Deserialize, Serialize};

use crate::scaling::scale_amount;

/// Identifier of the ledger's native currency.
pub const NATIVE_ASSET_ID: &str = "base";

/// A resolved asset. Immutable once resolved; re-resolved on demand when missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub symbol: String,
    pub decimals: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Raw issued supply, when the registry tracks it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supply: Option<f64>,
}

impl Asset {
    pub fn new(id: impl Into<String>, symbol: impl Into<String>, decimals: u32) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            decimals,
            description: None,
            supply: None,
        }
    }

    /// The native currency resolves without a registry entry.
    pub fn native() -> Self {
        Self {
            id: NATIVE_ASSET_ID.to_string(),
            symbol: "GBYTE".to_string(),
            decimals: 9,
            description: Some("Obyte DAG native currency".to_string()),
            supply: None,
        }
    }

    pub fn is_native(&self) -> bool {
        self.id == NATIVE_ASSET_ID
    }

    /// Supply in display units.
    pub fn scaled_supply(&self) -> Option<f64> {
        self.supply.map(|s| scale_amount(s, self.decimals))
    }
}
