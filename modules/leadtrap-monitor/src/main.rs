use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use leadtrap_common::Config;
use leadtrap_enrich::Enricher;
use leadtrap_ledger::Ledger;
use leadtrap_sources::{
    craigslist::CraigslistAdapter, dob::DobAdapter, dohmh::DohmhAdapter, ecb::EcbAdapter,
    hpd::HpdAdapter, profile, reddit::RedditAdapter, three11::Three11Adapter,
    twitter::TwitterAdapter, HttpFetcher, SourceAdapter,
};
use socrata_client::SocrataClient;

use crate::aggregator::Aggregator;
use crate::notifier::{EmailNotifier, Notifier};

mod aggregator;
mod digest;
mod notifier;
mod stats;

#[derive(Parser, Debug)]
#[command(name = "leadtrap-monitor", about = "NYC pest-control lead monitor")]
struct Cli {
    /// Poll and report without persisting the ledger or sending email.
    #[arg(long)]
    dry_run: bool,

    /// Override the ledger file location (default from LEDGER_PATH).
    #[arg(long)]
    ledger_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("leadtrap=info".parse()?))
        .init();

    let cli = Cli::parse();
    let run_id = uuid::Uuid::new_v4();
    info!(%run_id, dry_run = cli.dry_run, "Lead monitor starting...");

    let config = Config::from_env();
    config.log_redacted();

    let socrata = Arc::new(SocrataClient::new(config.socrata_app_token.clone()));
    let fetcher = Arc::new(HttpFetcher::new());
    let profile = profile::nyc_profile(config.boroughs.clone(), config.nitter_base_url.clone());

    let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
        Arc::new(HpdAdapter::new(socrata.clone(), profile.boroughs.clone())),
        Arc::new(DobAdapter::new(socrata.clone(), profile.boroughs.clone())),
        Arc::new(EcbAdapter::new(socrata.clone(), profile.boroughs.clone())),
        Arc::new(DohmhAdapter::new(socrata.clone(), profile.boroughs.clone())),
        Arc::new(Three11Adapter::new(socrata.clone(), profile.boroughs.clone())),
        Arc::new(CraigslistAdapter::new(
            fetcher.clone(),
            profile.craigslist_feeds.clone(),
        )),
        Arc::new(RedditAdapter::new(
            fetcher.clone(),
            profile.reddit_subreddits.clone(),
            profile.reddit_nyc_subreddits.clone(),
        )),
        Arc::new(TwitterAdapter::new(
            fetcher.clone(),
            profile.twitter_accounts.clone(),
            profile.nitter_base_url.clone(),
        )),
    ];

    let enricher = Enricher::socrata(socrata.clone());

    let notifier: Option<Arc<dyn Notifier>> = config.sendgrid_api_key.clone().map(|key| {
        Arc::new(EmailNotifier::new(
            key,
            config.email_from.clone(),
            config.email_to.clone(),
        )) as Arc<dyn Notifier>
    });

    let ledger_path = cli.ledger_path.unwrap_or_else(|| config.ledger_path.clone());
    let mut ledger = Ledger::load(ledger_path);

    let aggregator = Aggregator::new(adapters, enricher, notifier, cli.dry_run);
    let stats = aggregator.run(&mut ledger).await?;

    info!(%run_id, "Run finished\n{stats}");
    Ok(())
}
