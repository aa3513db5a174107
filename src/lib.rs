//! Fetch cryptocurrency price history from the CoinGecko public API.

pub mod interval;
pub mod market;
pub mod time;
