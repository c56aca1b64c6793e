//! Slippage Models
//!
//! Each model returns the absolute per-unit price concession for an order of
//! `size` against a base price, given the available liquidity. The simulator
//! adds it against buyers and subtracts it against sellers.
//!
//! ```text
//! none          0
//! fixed         price × percent
//! proportional  price × factor × (size / liquidity)
//! realistic     price × min(√(size / liquidity) × impact, max_impact)
//! ```
//!
//! The square-root law keeps impact concave in size; the cap stops tiny
//! books from producing absurd prices.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::math::sqrt_decimal;

/// Trait for slippage models
pub trait SlippageModel: Send + Sync {
    /// Per-unit slippage for `size` at `price` with `liquidity` available
    fn slippage(&self, price: Decimal, size: Decimal, liquidity: Decimal) -> Decimal;

    /// Model name for logging/display
    fn name(&self) -> &'static str;

    /// Clone into boxed trait object
    fn box_clone(&self) -> Box<dyn SlippageModel>;
}

impl Clone for Box<dyn SlippageModel> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// Size as a fraction of liquidity; `None` when no liquidity is known
fn size_ratio(size: Decimal, liquidity: Decimal) -> Option<Decimal> {
    if liquidity <= Decimal::ZERO {
        None
    } else {
        Some(size / liquidity)
    }
}

/// Fills exactly at the base price
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSlippage;

impl SlippageModel for NoSlippage {
    fn slippage(&self, _price: Decimal, _size: Decimal, _liquidity: Decimal) -> Decimal {
        Decimal::ZERO
    }

    fn name(&self) -> &'static str {
        "none"
    }

    fn box_clone(&self) -> Box<dyn SlippageModel> {
        Box::new(*self)
    }
}

/// Constant fraction of price, independent of size
#[derive(Debug, Clone, Copy)]
pub struct FixedSlippage {
    pub percent: Decimal,
}

impl Default for FixedSlippage {
    fn default() -> Self {
        Self {
            percent: dec!(0.001), // 0.1%
        }
    }
}

impl SlippageModel for FixedSlippage {
    fn slippage(&self, price: Decimal, _size: Decimal, _liquidity: Decimal) -> Decimal {
        price * self.percent
    }

    fn name(&self) -> &'static str {
        "fixed"
    }

    fn box_clone(&self) -> Box<dyn SlippageModel> {
        Box::new(*self)
    }
}

/// Linear in the size-to-liquidity ratio
#[derive(Debug, Clone, Copy)]
pub struct ProportionalSlippage {
    pub factor: Decimal,
}

impl Default for ProportionalSlippage {
    fn default() -> Self {
        Self { factor: dec!(0.1) }
    }
}

impl SlippageModel for ProportionalSlippage {
    fn slippage(&self, price: Decimal, size: Decimal, liquidity: Decimal) -> Decimal {
        // Unknown liquidity: treat the order as consuming the whole book
        let ratio = size_ratio(size, liquidity).unwrap_or(Decimal::ONE);
        price * self.factor * ratio
    }

    fn name(&self) -> &'static str {
        "proportional"
    }

    fn box_clone(&self) -> Box<dyn SlippageModel> {
        Box::new(*self)
    }
}

/// Square-root market impact, capped
#[derive(Debug, Clone, Copy)]
pub struct RealisticSlippage {
    pub impact_factor: Decimal,
    /// Upper bound on impact as a fraction of price
    pub max_impact: Decimal,
}

impl RealisticSlippage {
    pub fn with_impact(impact_factor: Decimal) -> Self {
        Self {
            impact_factor,
            ..Default::default()
        }
    }
}

impl Default for RealisticSlippage {
    fn default() -> Self {
        Self {
            impact_factor: dec!(0.1),
            max_impact: dec!(0.10),
        }
    }
}

impl SlippageModel for RealisticSlippage {
    fn slippage(&self, price: Decimal, size: Decimal, liquidity: Decimal) -> Decimal {
        let impact = match size_ratio(size, liquidity) {
            Some(ratio) => (sqrt_decimal(ratio) * self.impact_factor).min(self.max_impact),
            None => self.max_impact,
        };
        price * impact
    }

    fn name(&self) -> &'static str {
        "realistic"
    }

    fn box_clone(&self) -> Box<dyn SlippageModel> {
        Box::new(*self)
    }
}

impl fmt::Display for RealisticSlippage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Realistic(impact={}, cap={})",
            self.impact_factor, self.max_impact
        )
    }
}

/// Serializable model selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "lowercase")]
pub enum SlippageConfig {
    None,
    Fixed {
        #[serde(default = "default_fixed_percent")]
        percent: Decimal,
    },
    Proportional {
        #[serde(default = "default_proportional_factor")]
        factor: Decimal,
    },
    Realistic {
        #[serde(default = "default_impact_factor")]
        impact_factor: Decimal,
        #[serde(default = "default_max_impact")]
        max_impact: Decimal,
    },
}

fn default_fixed_percent() -> Decimal {
    FixedSlippage::default().percent
}

fn default_proportional_factor() -> Decimal {
    ProportionalSlippage::default().factor
}

fn default_impact_factor() -> Decimal {
    RealisticSlippage::default().impact_factor
}

fn default_max_impact() -> Decimal {
    RealisticSlippage::default().max_impact
}

impl Default for SlippageConfig {
    fn default() -> Self {
        SlippageConfig::Realistic {
            impact_factor: default_impact_factor(),
            max_impact: default_max_impact(),
        }
    }
}

impl SlippageConfig {
    /// Instantiate the configured model
    pub fn build(&self) -> Box<dyn SlippageModel> {
        match *self {
            SlippageConfig::None => Box::new(NoSlippage),
            SlippageConfig::Fixed { percent } => Box::new(FixedSlippage { percent }),
            SlippageConfig::Proportional { factor } => Box::new(ProportionalSlippage { factor }),
            SlippageConfig::Realistic {
                impact_factor,
                max_impact,
            } => Box::new(RealisticSlippage {
                impact_factor,
                max_impact,
            }),
        }
    }
}
