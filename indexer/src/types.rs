use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response of `GET /balance/{address}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TicksBalance {
    #[serde(default)]
    pub balances: Vec<TickBalance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickBalance {
    #[serde(default)]
    pub token_id: Option<u64>,
    #[serde(default)]
    pub chain: String,
    #[serde(default)]
    pub protocol: String,
    pub tick: String,
    pub amount: u64,
}

impl TicksBalance {
    /// Balance entry for `tick`, compared case-insensitively.
    pub fn for_tick(&self, tick: &str) -> Option<&TickBalance> {
        self.balances
            .iter()
            .find(|balance| balance.tick.eq_ignore_ascii_case(tick))
    }
}

/// One page of `GET /v2/inscriptions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TicksPage {
    #[serde(default)]
    pub content: Vec<TickInfo>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub last: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickInfo {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub protocol: String,
    pub tick: String,
    pub deploy_time: DateTime<Utc>,
    /// Minting progress in the indexer's own unit.
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub holder_count: u64,
    #[serde(default)]
    pub total_supply: i64,
    #[serde(default)]
    pub minted_count: i64,
}
