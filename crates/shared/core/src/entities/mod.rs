mod balance;
mod fill;
mod mode;
mod order;
mod order_status;
mod order_type;
mod position;
mod quote;
mod risk_config;
mod side;

pub use balance::Balance;
pub use fill::{Fill, Liquidity};
pub use mode::ExecutionMode;
pub use order::{Order, OrderId, OrderIntent};
pub use order_status::OrderStatus;
pub use order_type::OrderType;
pub use position::{Position, PositionKey};
pub use quote::{MarketState, Quote};
pub use risk_config::{KillSwitch, RiskConfig, RiskLimits, RiskLimitsUpdate};
pub use side::Side;
