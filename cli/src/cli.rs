use clap::{Parser, Subcommand, ValueEnum};

use market::{AssetClass, ChartPeriod};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ClassArg {
    Crypto,
    Stock,
}

impl From<ClassArg> for AssetClass {
    fn from(c: ClassArg) -> Self {
        match c {
            ClassArg::Crypto => AssetClass::Crypto,
            ClassArg::Stock => AssetClass::Stock,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PeriodArg {
    Month,
    HalfYear,
    Year,
}

impl From<PeriodArg> for ChartPeriod {
    fn from(p: PeriodArg) -> Self {
        match p {
            PeriodArg::Month => ChartPeriod::Month,
            PeriodArg::HalfYear => ChartPeriod::HalfYear,
            PeriodArg::Year => ChartPeriod::Year,
        }
    }
}

#[derive(Debug, Parser)]
#[clap(name = "folio", version)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Keep charts warm and log portfolio totals until Ctrl-C
    Watch {
        /// Seconds between portfolio reports
        #[clap(long, default_value = "60")]
        every_secs: u64,
    },

    /// Print a cached price chart, or "pending" while it is being fetched
    Chart {
        symbol: String,

        #[clap(long, value_enum, default_value = "crypto")]
        class: ClassArg,

        #[clap(long, value_enum, default_value = "month")]
        period: PeriodArg,

        /// Run the refresh worker and wait up to N seconds for the chart
        #[clap(long)]
        wait_secs: Option<u64>,
    },

    /// Add or replace a holding in the wallet
    Add {
        symbol: String,

        #[clap(long, value_enum)]
        class: ClassArg,

        #[clap(long)]
        amount: f64,

        /// Average entry price in USD
        #[clap(long)]
        avg_price: f64,
    },

    /// Remove a holding and its cached chart
    Remove {
        symbol: String,

        #[clap(long, value_enum)]
        class: ClassArg,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_defaults() {
        let cli = Cli::try_parse_from(["folio", "chart", "btc"]).expect("parse");
        match cli.command {
            Command::Chart {
                symbol,
                class,
                period,
                wait_secs,
            } => {
                assert_eq!(symbol, "btc");
                assert_eq!(AssetClass::from(class), AssetClass::Crypto);
                assert_eq!(ChartPeriod::from(period), ChartPeriod::Month);
                assert!(wait_secs.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn half_year_is_kebab_case() {
        let cli = Cli::try_parse_from([
            "folio",
            "chart",
            "aapl",
            "--class",
            "stock",
            "--period",
            "half-year",
        ])
        .expect("parse");
        let Command::Chart { period, .. } = cli.command else {
            panic!("expected chart");
        };
        assert_eq!(ChartPeriod::from(period), ChartPeriod::HalfYear);
    }

    #[test]
    fn add_requires_amounts() {
        assert!(Cli::try_parse_from(["folio", "add", "btc", "--class", "crypto"]).is_err());
        assert!(
            Cli::try_parse_from([
                "folio",
                "add",
                "btc",
                "--class",
                "crypto",
                "--amount",
                "0.5",
                "--avg-price",
                "30000",
            ])
            .is_ok()
        );
    }
}
