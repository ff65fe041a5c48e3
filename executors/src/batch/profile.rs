use std::{fmt, str::FromStr, time::Duration};

use alloy::primitives::U256;
use inscribe_core::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, DurationSeconds, serde_as};
use thiserror::Error;

const BASIS_POINTS: u64 = 10_000;

/// Multiplier applied to the node's suggested gas price, held as basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeeBuffer {
    basis_points: u64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid fee buffer {value:?}: {reason}")]
pub struct FeeBufferError {
    pub value: String,
    pub reason: &'static str,
}

impl FeeBuffer {
    pub const IDENTITY: FeeBuffer = FeeBuffer {
        basis_points: BASIS_POINTS,
    };

    pub const fn from_basis_points(basis_points: u64) -> Self {
        Self { basis_points }
    }

    pub fn basis_points(&self) -> u64 {
        self.basis_points
    }

    /// `price × buffer`, truncated toward zero.
    pub fn apply(&self, price: U256) -> U256 {
        let denominator = U256::from(BASIS_POINTS);
        let bps = U256::from(self.basis_points);
        let whole = price / denominator;
        let rem = price % denominator;
        whole
            .saturating_mul(bps)
            .saturating_add(rem * bps / denominator)
    }
}

impl FromStr for FeeBuffer {
    type Err = FeeBufferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |reason| FeeBufferError {
            value: s.to_string(),
            reason,
        };

        let trimmed = s.trim();
        let (int, frac) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        if int.is_empty() && frac.is_empty() {
            return Err(err("empty"));
        }
        if !int.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(err("expected a plain decimal number"));
        }
        if frac.len() > 4 {
            return Err(err("at most four decimal places are supported"));
        }

        let int_part: u64 = if int.is_empty() {
            0
        } else {
            int.parse().map_err(|_| err("integer part out of range"))?
        };
        let frac_part: u64 = format!("{frac:0<4}")
            .parse()
            .map_err(|_| err("expected a plain decimal number"))?;

        let basis_points = int_part
            .checked_mul(BASIS_POINTS)
            .and_then(|v| v.checked_add(frac_part))
            .ok_or_else(|| err("integer part out of range"))?;
        if basis_points == 0 {
            return Err(err("must be greater than zero"));
        }

        Ok(Self { basis_points })
    }
}

impl fmt::Display for FeeBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let int = self.basis_points / BASIS_POINTS;
        let frac = self.basis_points % BASIS_POINTS;
        if frac == 0 {
            write!(f, "{int}")
        } else {
            let digits = format!("{frac:04}");
            write!(f, "{int}.{}", digits.trim_end_matches('0'))
        }
    }
}

/// How broadcast failures are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Every broadcast failure ends the run.
    Strict,
    /// Sequencing conflicts, pooled duplicates and insufficient funds are
    /// handled per account; anything else ends the run.
    Classified,
}

#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationPolicy {
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(rename = "post_send_delay_secs")]
    pub post_send_delay: Duration,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(rename = "poll_interval_secs")]
    pub poll_interval: Duration,
    /// Unequal polls tolerated before the account is abandoned.
    pub max_polls: u32,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            post_send_delay: Duration::from_secs(3),
            poll_interval: Duration::from_secs(5),
            max_polls: 10,
        }
    }
}

/// Per-command knobs of the submission pipeline.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineProfile {
    /// Metric label and log field.
    #[serde(default)]
    pub name: String,
    pub gas_limit: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub fee_buffer: FeeBuffer,
    pub error_policy: ErrorPolicy,
    pub rpc_retry: RetryPolicy,
    #[serde(default)]
    pub confirmation: ConfirmationPolicy,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(rename = "conflict_delay_secs", default = "default_conflict_delay")]
    pub conflict_delay: Duration,
    #[serde(default = "default_max_sequence_conflicts")]
    pub max_sequence_conflicts: u32,
    /// Accounts processed at once; unbounded when absent.
    #[serde(default)]
    pub max_concurrency: Option<usize>,
}

fn default_conflict_delay() -> Duration {
    Duration::from_secs(3)
}

fn default_max_sequence_conflicts() -> u32 {
    10
}

impl PipelineProfile {
    pub fn mint() -> Self {
        Self {
            name: "mint".to_string(),
            gas_limit: 21_944,
            fee_buffer: FeeBuffer::IDENTITY,
            error_policy: ErrorPolicy::Strict,
            rpc_retry: RetryPolicy::new(5, Duration::from_secs(10)),
            confirmation: ConfirmationPolicy::default(),
            conflict_delay: default_conflict_delay(),
            max_sequence_conflicts: default_max_sequence_conflicts(),
            max_concurrency: Some(1),
        }
    }

    pub fn async_mint() -> Self {
        Self {
            name: "async_mint".to_string(),
            gas_limit: 22_000,
            fee_buffer: FeeBuffer::from_basis_points(11_000),
            error_policy: ErrorPolicy::Classified,
            max_concurrency: None,
            ..Self::mint()
        }
    }

    pub fn collect() -> Self {
        Self {
            name: "collect".to_string(),
            gas_limit: 22_100,
            rpc_retry: RetryPolicy::new(5, Duration::from_secs(5)),
            ..Self::mint()
        }
    }
}
