use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::util::SubscriberInitExt;

pub(crate) mod cache;
pub(crate) mod config;
pub(crate) mod error;
pub(crate) mod fetcher;
pub(crate) mod hn_api;
pub(crate) mod item;
pub(crate) mod render;
pub(crate) mod server;
#[cfg(test)]
pub(crate) mod test_helpers;
pub(crate) mod top_stories;

#[derive(Debug, Clone, clap::Parser)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(long, default_value = "false")]
    #[arg(help = "Fetch the top stories once, print them as json and exit")]
    once: bool,

    #[arg(short, long)]
    #[arg(help = "Address to serve on, overrides LISTEN_ADDR")]
    listen: Option<std::net::SocketAddr>,

    #[arg(short = 'n', long)]
    #[arg(help = "Number of stories to return, overrides TOP_STORIES_LIMIT")]
    limit: Option<usize>,

    #[arg(short = 'c', long, default_value = "false")]
    #[arg(help = "Log to console")]
    log_to_console: bool,
}

fn init_logging(
    config: &config::Config,
    args: &Args,
) -> tracing_appender::non_blocking::WorkerGuard {
    use tracing_subscriber::layer::Layer;
    use tracing_subscriber::layer::SubscriberExt;

    let env_filter = || {
        tracing_subscriber::EnvFilter::builder()
            .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
            .from_env_lossy()
    };

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "hn_top_stories.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .json()
        .with_filter(env_filter())
        .boxed();

    let pretty_layer = tracing_subscriber::fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .with_filter(env_filter())
        .boxed();

    let registry = tracing_subscriber::registry().with(file_layer);

    if config.log_to_console || args.log_to_console {
        registry.with(pretty_layer).init();
    } else {
        registry.init();
    };

    guard
}

async fn run(config: config::Config, args: Args) -> anyhow::Result<()> {
    let limit = args.limit.unwrap_or(config.top_stories_limit);
    if config.fetch_window < limit {
        tracing::warn!(
            window = config.fetch_window,
            limit,
            "Fetch window is smaller than the limit, the list will always be short"
        );
    }

    let upstream = hn_api::HnClient::new(&config.api_base, config.request_timeout)
        .context("Failed to build http client")?;

    let cache = cache::ItemCache::new(config.item_cache_ttl);
    let _sweeper = cache.start_sweeper(config.item_cache_sweep_interval);

    let fetcher = fetcher::ItemFetcher::new(Arc::new(upstream), cache.clone());
    let aggregator = top_stories::Aggregator::new(fetcher, config.fetch_window);

    if args.once {
        let report = aggregator
            .collect(limit)
            .await
            .context("Failed to get top stories")?;

        for skip in &report.skipped {
            tracing::info!(id = skip.id, rank = skip.rank, reason = %skip.reason, "Left out");
        }
        tracing::info!(
            num_candidates = report.num_candidates,
            num_dispatched = report.num_dispatched,
            num_skipped = report.skipped.len(),
            "Fetched top stories once"
        );

        println!("{}", serde_json::to_string_pretty(&report.stories)?);
        return Ok(());
    }

    let addr = args.listen.unwrap_or(config.listen_addr);
    let state = server::AppState {
        aggregator,
        cache,
        limit,
    };
    server::serve(state, addr).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use clap::Parser;
    let args = Args::parse();

    let config = config::Config::from_env().context("Failed to load configuration")?;
    let _guard = init_logging(&config, &args);

    tracing::info!(
        config =? config,
        args =? args,
        "Starting HN top stories"
    );

    match run(config, args).await {
        Ok(()) => {
            tracing::info!("HN top stories finished");
            Ok(())
        }
        Err(e) => {
            tracing::error!(error =? e, "HN top stories failed");
            Err(e)
        }
    }
}
