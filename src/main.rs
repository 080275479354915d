//! Reddit AI Harvester binary entrypoint.
//! Verbs: `run` (one-shot daily collection), `schedule` (long-running
//! scheduler plus the status/metrics HTTP surface), `status` (print today's
//! task state and exit).
//!
//! See `README.md` for quickstart.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reddit_ai_harvester::api::{self, AppState};
use reddit_ai_harvester::config::CollectionConfig;
use reddit_ai_harvester::fetch::reddit::RedditFetcher;
use reddit_ai_harvester::metrics::Metrics;
use reddit_ai_harvester::pipeline::Harvester;
use reddit_ai_harvester::report::ReportSender;
use reddit_ai_harvester::scheduler::{next_collection_time, spawn_daily_scheduler};
use reddit_ai_harvester::store::d1::D1Store;
use reddit_ai_harvester::store::{PostStore, SessionLog, TaskStore};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("reddit_ai_harvester=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

struct Wiring {
    config: Arc<CollectionConfig>,
    harvester: Arc<Harvester>,
    posts: Arc<dyn PostStore>,
    tasks: Arc<dyn TaskStore>,
}

fn wire() -> Result<Wiring> {
    let config = Arc::new(CollectionConfig::load_default().context("loading config")?);

    let store = Arc::new(D1Store::from_env().context("connecting to d1")?);
    let posts: Arc<dyn PostStore> = store.clone();
    let tasks: Arc<dyn TaskStore> = store.clone();
    let sessions: Arc<dyn SessionLog> = store;

    let fetcher = Arc::new(RedditFetcher::from_env().context("building reddit client")?);

    let harvester = Arc::new(Harvester::new(
        config.clone(),
        fetcher,
        posts.clone(),
        tasks.clone(),
        sessions,
    ));

    Ok(Wiring {
        config,
        harvester,
        posts,
        tasks,
    })
}

async fn cmd_run() -> Result<()> {
    let wiring = wire()?;
    let summary = wiring.harvester.run_daily().await?;

    if let Some(sender) = ReportSender::from_env()? {
        if let Err(e) = sender.send_daily_report(&summary).await {
            tracing::warn!(error = %e, "daily report email failed");
        }
    }

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn cmd_schedule() -> Result<()> {
    let wiring = wire()?;

    let metrics = Metrics::init(wiring.config.daily_target);
    let state = AppState {
        config: wiring.config.clone(),
        tasks: wiring.tasks,
        posts: wiring.posts,
    };
    let router = api::create_router(state).merge(metrics.router());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8080);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("binding port {port}"))?;
    tracing::info!(port, "status server listening");

    let reporter = ReportSender::from_env()?.map(Arc::new);
    let scheduler = spawn_daily_scheduler(wiring.harvester, reporter);
    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::warn!(error = %e, "status server exited");
        }
    });

    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    tracing::info!("shutdown signal received");
    scheduler.abort();
    server.abort();
    Ok(())
}

async fn cmd_status() -> Result<()> {
    let config = CollectionConfig::load_default().context("loading config")?;
    let store = D1Store::from_env().context("connecting to d1")?;

    let now = chrono::Utc::now();
    let date = config.collection_date(now);
    let task = TaskStore::get(&store, date).await?;
    let today_total = PostStore::count_today(&store, date).await?;

    println!("collection date: {date}");
    println!("stored today:    {today_total}/{}", config.daily_target);
    match task {
        Some(t) => println!(
            "task:            {} (actual {}, error {:?})",
            t.status, t.actual_count, t.error_message
        ),
        None => println!("task:            not created yet"),
    }
    println!("next run:        {}", next_collection_time(&config, now).to_rfc3339());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let verb = std::env::args().nth(1).unwrap_or_else(|| "run".to_string());
    match verb.as_str() {
        "run" => cmd_run().await,
        "schedule" => cmd_schedule().await,
        "status" => cmd_status().await,
        other => bail!("unknown command {other:?} (expected run | schedule | status)"),
    }
}
