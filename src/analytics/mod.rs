//! # Dashboard Analytics
//!
//! Computations behind the dashboard views over a loaded fact table:
//! dimension filters, the top manufacturer ranking, headline KPIs and market
//! insights. Every function is pure over `&[FactRecord]`.

pub mod filter;
pub mod insights;

pub use filter::available_categories;
pub use filter::available_years;
pub use filter::top_manufacturers;
pub use filter::FactFilter;
pub use filter::DEFAULT_TOP_MANUFACTURERS;
pub use insights::is_electric;
pub use insights::Kpis;
pub use insights::MarketInsights;
pub use insights::Share;
