//! Market-data tools the completion service may call.
//!
//! Every tool is one row of [`catalog::CATALOG`]: a name, a description and
//! the Alpha Vantage query it maps to. The registry picks the rows a
//! deployment exposes and dispatches calls through a shared
//! [`market::MarketDataClient`].
pub mod catalog;
pub mod market;
pub mod registry;

pub use catalog::{MarketEndpoint, CATALOG, DEFAULT_TOOLS};
pub use market::{MarketDataClient, MarketDataConfig};
pub use registry::{render_tool_result, ToolRegistry};
