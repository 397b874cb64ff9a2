//! Parameter sweeps loaded from TOML.
//!
//! ```toml
//! strategy = "batched"
//! batch_size = 100
//!
//! [[points]]
//! difficulty = 10
//! count = 10000
//! ```

use super::{RunParams, default_batch_size, default_concurrency_limit};
use crate::error::{Error, Result};
use crate::model::StrategyKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One `(difficulty, count)` point of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub difficulty: u32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sweep {
    #[serde(default)]
    pub strategy: StrategyKind,
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    pub points: Vec<SweepPoint>,
}

impl Sweep {
    /// The sweep the benchmark ships with: one large run, then a single item.
    pub fn default_for(strategy: StrategyKind) -> Self {
        Self {
            strategy,
            concurrency_limit: default_concurrency_limit(),
            batch_size: default_batch_size(),
            points: vec![
                SweepPoint {
                    difficulty: 10,
                    count: 10_000,
                },
                SweepPoint {
                    difficulty: 8,
                    count: 1,
                },
            ],
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("bad sweep file: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read sweep file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Expand into per-run parameters, in file order.
    pub fn runs(&self) -> Vec<RunParams> {
        self.points
            .iter()
            .map(|point| RunParams {
                strategy: self.strategy,
                count: point.count,
                difficulty: point.difficulty,
                concurrency_limit: self.concurrency_limit,
                batch_size: self.batch_size,
            })
            .collect()
    }
}
