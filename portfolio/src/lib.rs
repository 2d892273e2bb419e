pub mod holding;
pub mod service;
pub mod valuation;
pub mod wallet;

pub use holding::Holding;
pub use service::PortfolioService;
pub use valuation::{AssetStat, TotalStat, valuate};
pub use wallet::{Wallet, WalletError};
