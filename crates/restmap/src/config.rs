use serde::{Deserialize, Serialize};

use crate::gate::{RateGate, DEFAULT_BURST, DEFAULT_REFILL_PER_SEC};
use crate::mapper::MapperOptions;

/// Environment-driven mapper configuration.
///
/// - `ORKA_RESTMAP_BURST`: refresh tokens available at once (default 5)
/// - `ORKA_RESTMAP_REFILL_PER_SEC`: token refill rate (default 5.0)
/// - `ORKA_RESTMAP_LAZY`: defer discovery until first lookup (default false)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestMapConfig {
    pub burst: u32,
    pub refill_per_sec: f64,
    pub lazy: bool,
}

impl Default for RestMapConfig {
    fn default() -> Self {
        Self { burst: DEFAULT_BURST, refill_per_sec: DEFAULT_REFILL_PER_SEC, lazy: false }
    }
}

impl RestMapConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|k| std::env::var(k).ok())
    }

    fn from_vars(get: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        let burst = get("ORKA_RESTMAP_BURST").and_then(|s| s.parse::<u32>().ok()).unwrap_or(d.burst);
        let refill_per_sec = get("ORKA_RESTMAP_REFILL_PER_SEC")
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|r| r.is_finite() && *r > 0.0)
            .unwrap_or(d.refill_per_sec);
        let lazy = get("ORKA_RESTMAP_LAZY").map(|s| parse_flag(&s)).unwrap_or(d.lazy);
        Self { burst, refill_per_sec, lazy }
    }

    pub fn options(&self) -> MapperOptions {
        MapperOptions { lazy: self.lazy, gate: RateGate::new(self.burst, self.refill_per_sec) }
    }
}

fn parse_flag(s: &str) -> bool {
    matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
