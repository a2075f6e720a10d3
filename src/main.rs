use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

use momentum_confluence::analysis::{AnalysisRequest, MultiTimeframeAnalyzer};
use momentum_confluence::config::MultiTimeframeConfig;
use momentum_confluence::logging;
use momentum_confluence::market::CandleSource;
use momentum_confluence::market::providers::{MockCandleSource, new_binance_source};

/// Multi-timeframe momentum confluence for one symbol.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Trading symbol, e.g. BTCUSDT
    symbol: String,

    /// Comma-separated timeframes (1m,5m,15m,30m,1h,4h,1d)
    #[arg(long, value_delimiter = ',', default_value = "15m,1h,4h,1d")]
    timeframes: Vec<String>,

    /// Candles fetched per timeframe
    #[arg(long)]
    lookback: Option<usize>,

    /// Use synthetic candles instead of Binance
    #[arg(long)]
    mock: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init("info");

    let args = Args::parse();
    let config = MultiTimeframeConfig::from_env().context("loading MOMENTUM_* configuration")?;

    if args.mock {
        let source = MockCandleSource::new().with_default_drift(0.002);
        run(source, config, &args).await
    } else {
        run(new_binance_source(), config, &args).await
    }
}

async fn run<S: CandleSource>(source: S, config: MultiTimeframeConfig, args: &Args) -> Result<()> {
    info!("Analyzing {} using {} candles", args.symbol, source.name());

    let engine = MultiTimeframeAnalyzer::new(source, config);
    debug!(
        max_concurrency = engine.config().max_concurrency,
        fetch_timeout_ms = ?engine.config().fetch_timeout_ms,
        "engine configured"
    );
    let mut request = AnalysisRequest::new(args.symbol.clone(), args.timeframes.clone());
    request.lookback = args.lookback;

    let result = engine.analyze(&request).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
