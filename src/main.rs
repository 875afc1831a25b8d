use anyhow::Context;
use clap::Parser;
use chrono::{Local, Utc};
use fieldops::cache::{today, CacheKey, CacheStore, MemoryCacheStore};
use fieldops::cli::{CacheCommand, Cli, Commands, DashboardArgs};
use fieldops::config::{CacheBackend, Config};
use fieldops::datasources::{
    ApiClient, BatchRequest, FieldsClient, IrrigationClient, RecommendationQuery,
};
use fieldops::db::Database;
use fieldops::error::FieldOpsError;
use fieldops::logic::summary::index_by_field;
use fieldops::logic::{summarize, Dashboard, IrrigationService};
use fieldops::models::IrrigationRecommendation;
use fieldops::ui::report::{
    render_error, render_fields, DashboardReport, RecommendationReport, WeeklyReport,
};
use std::io::Write;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

type Service = IrrigationService<IrrigationClient, dyn CacheStore>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let mut cli = Cli::parse();
    init_logging(cli.verbose);

    if matches!(cli.command, Some(Commands::Init)) {
        Config::setup_interactive()?;
        return Ok(());
    }

    let config = if Config::exists(cli.config.as_ref()) {
        Config::load(cli.config.clone()).context("Failed to load configuration")?
    } else {
        eprintln!("No configuration found.");
        let (config, _path) = Config::setup_interactive()?;
        config
    };

    let api = ApiClient::new(&config.api, config.mode)?;
    let cache = open_cache(&cli, &config);
    let service: Service =
        IrrigationService::new(Arc::new(IrrigationClient::new(api.clone())), cache);

    let command = cli
        .command
        .take()
        .unwrap_or_else(|| Commands::Dashboard(DashboardArgs::default()));

    match command {
        Commands::Init => Ok(()),
        Commands::Check => run_check(&config, &api).await,
        Commands::Recommend(args) => {
            let query = RecommendationQuery {
                include_forecast: config.api.include_forecast && !args.no_forecast,
                forecast_days: args.days.unwrap_or(config.api.forecast_days),
            };
            let rec = if cli.refresh {
                service.refresh_recommendation(args.field_id, query).await
            } else {
                service.recommendation(args.field_id, query).await
            }
            .with_context(|| format!("Failed to fetch recommendation for field {}", args.field_id))?;

            RecommendationReport::new(&rec).render(&mut std::io::stdout().lock())?;
            Ok(())
        }
        Commands::Batch(args) => {
            let mut request = BatchRequest::new(args.field_ids);
            request.date = args.date;
            let requested = request.field_ids.clone();
            let recommendations = if cli.refresh {
                service.refresh_batch(request).await
            } else {
                service.batch(request).await
            }
            .context("Failed to fetch batch recommendations")?;
            warn_missing_fields(&requested, &recommendations);

            let dashboard = Dashboard {
                summary: summarize(&recommendations),
                recommendations,
            };
            DashboardReport::new(&dashboard).render(&mut std::io::stdout().lock())?;
            Ok(())
        }
        Commands::Weekly(args) => {
            let schedule = if cli.refresh {
                service
                    .refresh_weekly_schedule(args.field_id, args.start)
                    .await
            } else {
                service.weekly_schedule(args.field_id, args.start).await
            }
            .with_context(|| format!("Failed to fetch weekly schedule for field {}", args.field_id))?;

            WeeklyReport::new(&schedule).render(&mut std::io::stdout().lock())?;
            Ok(())
        }
        Commands::Dashboard(args) => run_dashboard(&cli, &config, &api, &service, args).await,
        Commands::Fields => {
            let fields = FieldsClient::new(api)
                .list_fields()
                .await
                .context("Failed to list fields")?;
            render_fields(&mut std::io::stdout().lock(), &fields)?;
            Ok(())
        }
        Commands::Cache(CacheCommand::Clear { field }) => {
            match field {
                Some(field_id) => {
                    let removed = service.invalidate_field(field_id)?;
                    println!("Removed {} cached entries for field {}", removed, field_id);
                }
                None => {
                    service.cache().clear()?;
                    println!("Cache cleared");
                }
            }
            Ok(())
        }
        Commands::Cache(CacheCommand::List) => {
            let mut keys = service.cache().keys()?;
            keys.sort_by_key(CacheKey::storage_key);
            for key in keys {
                let stale = service
                    .cache()
                    .get(&key)?
                    .map(|entry| entry.stale)
                    .unwrap_or(false);
                println!(
                    "{}  {}{}",
                    key,
                    service.load_state(&key),
                    if stale { " (stale)" } else { "" }
                );
            }
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Persistent SQLite cache unless disabled; falls back to memory when the
/// database cannot be opened.
fn open_cache(cli: &Cli, config: &Config) -> Arc<dyn CacheStore> {
    if cli.no_cache || config.cache.backend == CacheBackend::Memory {
        return Arc::new(MemoryCacheStore::new());
    }

    match Database::open(cli.data_dir.as_ref()) {
        Ok(db) => {
            tracing::debug!(path = %db.path().display(), "Using SQLite cache");
            prune_earlier_days(&db);
            Arc::new(db)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to open cache database, using memory cache");
            Arc::new(MemoryCacheStore::new())
        }
    }
}

/// Entries written before local midnight belong to an earlier day and are
/// never read again.
fn prune_earlier_days(db: &Database) {
    let Some(cutoff) = today()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| midnight.and_local_timezone(Local).earliest())
    else {
        return;
    };
    match db.prune_cache_entries_before(cutoff.with_timezone(&Utc)) {
        Ok(0) => {}
        Ok(removed) => tracing::debug!(removed, "Pruned cache entries from earlier days"),
        Err(e) => tracing::warn!(error = %e, "Failed to prune cache entries"),
    }
}

/// The backend may leave out fields it has no data for.
fn warn_missing_fields(requested: &[i64], recommendations: &[IrrigationRecommendation]) {
    let by_field = index_by_field(recommendations);
    let missing: Vec<i64> = requested
        .iter()
        .copied()
        .filter(|id| !by_field.contains_key(id))
        .collect();
    if !missing.is_empty() {
        tracing::warn!(?missing, "Backend returned no recommendation for some fields");
    }
}

async fn run_check(config: &Config, api: &ApiClient) -> anyhow::Result<()> {
    println!("Configuration OK ({:?} mode)", config.mode);
    println!("  Backend: {}", api.base_url());
    println!(
        "  Token:   {}",
        if config.api.bearer_token().is_some() {
            "configured"
        } else {
            "none"
        }
    );
    println!("  Cache:   {:?}", config.cache.backend);

    match api.test_connection().await {
        Ok(true) => println!("  Backend: reachable"),
        Ok(false) => println!("  Backend: responding with server errors"),
        Err(e) => {
            render_error(&mut std::io::stdout().lock(), "Backend", &e)?;
            anyhow::bail!("backend unreachable");
        }
    }
    Ok(())
}

async fn resolve_field_ids(
    args_ids: Vec<i64>,
    config: &Config,
    api: &ApiClient,
) -> anyhow::Result<Vec<i64>> {
    if !args_ids.is_empty() {
        return Ok(args_ids);
    }
    if !config.farm.field_ids.is_empty() {
        return Ok(config.farm.field_ids.clone());
    }

    let fields = FieldsClient::new(api.clone())
        .list_fields()
        .await
        .context("No field ids configured and the field list could not be fetched")?;
    Ok(fields.into_iter().map(|f| f.id).collect())
}

async fn run_dashboard(
    cli: &Cli,
    config: &Config,
    api: &ApiClient,
    service: &Service,
    args: DashboardArgs,
) -> anyhow::Result<()> {
    let field_ids = resolve_field_ids(args.field_ids, config, api).await?;
    if field_ids.is_empty() {
        println!("No fields to show. Add farm.field_ids to the config.");
        return Ok(());
    }

    let mut request = BatchRequest::new(field_ids);
    request.date = args.date;
    let requested = request.field_ids.clone();
    if cli.refresh {
        service.cache().mark_stale(&CacheKey::batch(&request))?;
    }

    // Ctrl-C drops the handle, which aborts the fetch before it touches the cache.
    let handle = service.spawn_batch(request);
    let recommendations = tokio::select! {
        result = handle => result,
        _ = tokio::signal::ctrl_c() => Err(FieldOpsError::Cancelled),
    }
    .context("Failed to load dashboard")?;
    warn_missing_fields(&requested, &recommendations);

    let dashboard = Dashboard {
        summary: summarize(&recommendations),
        recommendations,
    };
    let mut out = std::io::stdout().lock();
    DashboardReport::new(&dashboard)
        .with_farm_name(config.farm.name.as_deref())
        .render(&mut out)?;
    out.flush()?;
    Ok(())
}
