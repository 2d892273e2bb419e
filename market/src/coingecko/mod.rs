pub mod client;
pub mod symbol_map;
pub mod types;

pub use client::CoinGeckoClient;
pub use symbol_map::SymbolMap;
