//! CLI Commands.
//!
//! One command per oracle operation. Each command runs against the
//! application's [`OracleService`](crate::oracle::OracleService) and returns
//! a [`CommandOutput`] for the formatter.

use async_trait::async_trait;

use super::{CliApp, CliError, CliResult, CommandOutput, Executable, Table};
use crate::core::types::TradingPair;
use crate::oracle::aggregator::{aggregate_prices, validate_price_data};
use crate::utils::format::format_price;

// ═══════════════════════════════════════════════════════════════════════════════
// COMMAND ENUM
// ═══════════════════════════════════════════════════════════════════════════════

/// All available commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Current price of one pair
    Price(PriceCommand),
    /// Prices of every configured pair
    Prices(PricesCommand),
    /// Provider health
    Sources(SourcesCommand),
    /// Oracle statistics
    Stats(StatsCommand),
    /// Query every source and aggregate
    Aggregate(AggregateCommand),
}

// ═══════════════════════════════════════════════════════════════════════════════
// PRICE COMMANDS
// ═══════════════════════════════════════════════════════════════════════════════

/// Look up one pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceCommand {
    /// Pair as `BASE/QUOTE` or `BASE-QUOTE`
    pub symbol: String,
}

#[async_trait]
impl Executable for PriceCommand {
    async fn execute(&self, app: &CliApp) -> CliResult<CommandOutput> {
        let reading = app
            .service()
            .get_price_data(&self.symbol)
            .await
            .ok_or_else(|| CliError::NotFound(format!("No price available for {}", self.symbol)))?;

        let message = format!("{} = {}", reading.pair, format_price(reading.price));
        let table = Table::readings([&reading]);
        Ok(CommandOutput::success_with_data(message, to_json(&reading)?).with_table(table))
    }
}

/// Look up every configured pair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PricesCommand;

#[async_trait]
impl Executable for PricesCommand {
    async fn execute(&self, app: &CliApp) -> CliResult<CommandOutput> {
        let configured = app.service().config().symbols.len();
        let readings = app.service().get_all_prices().await;

        let message = format!("{} of {} feeds available", readings.len(), configured);
        let mut output = CommandOutput::success_with_data(message, to_json(&readings)?)
            .with_table(Table::readings(&readings));

        if readings.len() < configured {
            output = output.with_warning(format!("{} feeds returned no data", configured - readings.len()));
        }
        Ok(output)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MONITORING COMMANDS
// ═══════════════════════════════════════════════════════════════════════════════

/// Probe provider health
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcesCommand;

#[async_trait]
impl Executable for SourcesCommand {
    async fn execute(&self, app: &CliApp) -> CliResult<CommandOutput> {
        let statuses = app.service().get_data_sources_status().await;
        let online = crate::monitoring::health::count_online(&statuses);

        let message = format!("{} of {} sources online", online, statuses.len());
        Ok(CommandOutput::success_with_data(message, to_json(&statuses)?)
            .with_table(Table::sources(&statuses)))
    }
}

/// Summary statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsCommand;

#[async_trait]
impl Executable for StatsCommand {
    async fn execute(&self, app: &CliApp) -> CliResult<CommandOutput> {
        let stats = app.service().get_oracle_stats().await;
        let metrics = app.service().metrics();

        let message = format!(
            "Oracle statistics ({:.1}% cache hits)",
            metrics.snapshot().cache_hit_pct()
        );
        Ok(CommandOutput::success_with_data(message, to_json(&stats)?)
            .with_table(Table::metrics(&metrics.values())))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// AGGREGATE COMMAND
// ═══════════════════════════════════════════════════════════════════════════════

/// Query every source for a pair and aggregate the readings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateCommand {
    /// Pair as `BASE/QUOTE` or `BASE-QUOTE`
    pub symbol: String,
}

#[async_trait]
impl Executable for AggregateCommand {
    async fn execute(&self, app: &CliApp) -> CliResult<CommandOutput> {
        let pair: TradingPair = self
            .symbol
            .parse()
            .map_err(|e: crate::error::Error| CliError::InvalidArgument(e.to_string()))?;

        let readings = app.service().fetch_from_all_sources(&pair).await;
        let aggregate = aggregate_prices(&readings)
            .ok_or_else(|| CliError::NotFound(format!("No source returned a price for {}", pair)))?;

        let historical = app
            .service()
            .cache()
            .latest(&pair.symbol())
            .await
            .map(|entry| entry.reading.price);
        let valid = validate_price_data(&aggregate, historical);

        let mut table = Table::readings(&readings);
        let mut summary = super::output::reading_row(&aggregate);
        summary[0] = format!("{} (aggregate)", aggregate.pair);
        table.push(summary);

        let data = serde_json::json!({
            "readings": readings,
            "aggregate": aggregate,
            "valid": valid,
        });

        let message = format!(
            "{} = {} from {} sources",
            aggregate.pair,
            format_price(aggregate.price),
            readings.len()
        );
        let mut output = CommandOutput::success_with_data(message, data).with_table(table);
        if !valid {
            output = output.with_warning("Aggregated reading failed anomaly checks");
        }
        Ok(output)
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> CliResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| CliError::Execution(e.to_string()))
}
