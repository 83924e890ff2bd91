use anyhow::{Context, Result, bail};
use chrono::Utc;
use feedline_lib::application::ports::offline_store::MutationQueue;
use feedline_lib::infrastructure::offline::{DEAD_LETTER_KEY, PersistedMutationQueue, QUEUE_KEY};
use feedline_lib::infrastructure::storage::open_store;
use feedline_lib::shared::config::StorageBackend;
use feedline_lib::{AppConfig, QueuedMutation};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tokio::runtime::Runtime;

#[derive(Debug, Clone)]
struct CliOptions {
    output: Option<PathBuf>,
    pretty: bool,
    backend: Option<StorageBackend>,
    data_dir: Option<String>,
    database_url: Option<String>,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct QueueReport {
    generated_at_ms: i64,
    backend: StorageBackend,
    queue_key: &'static str,
    dead_letter_key: &'static str,
    pending: Vec<QueuedMutation>,
    dead_letters: Vec<QueuedMutation>,
}

fn usage() -> &'static str {
    "Usage: offline_queue_inspect [--backend <sqlite|file>] [--data-dir <dir>] [--database-url <url>] [--output <path>] [--pretty]"
}

fn main() -> Result<()> {
    feedline_lib::init_logging();
    let args: Vec<String> = env::args().skip(1).collect();
    let options = parse_args(args)?;

    let mut config = AppConfig::from_env();
    if let Some(backend) = options.backend {
        config.storage.backend = backend;
    }
    if let Some(dir) = &options.data_dir {
        config.storage.data_dir = dir.clone();
        config.storage.database_url = format!("sqlite:{dir}/feedline.db");
    }
    if let Some(url) = &options.database_url {
        config.storage.database_url = url.clone();
    }
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;

    let rt = Runtime::new().context("Failed to create Tokio runtime")?;
    let report = rt.block_on(collect_report(&config))?;

    let payload = if options.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    emit_payload(options.output.as_deref(), &payload)
}

async fn collect_report(config: &AppConfig) -> Result<QueueReport> {
    let store = open_store(&config.storage)
        .await
        .with_context(|| format!("Failed to open {:?} store", config.storage.backend))?;
    let pending = PersistedMutationQueue::new(store.clone())
        .peek()
        .await
        .context("Failed to read offline write queue")?;
    let dead_letters = PersistedMutationQueue::with_key(store, DEAD_LETTER_KEY)
        .peek()
        .await
        .context("Failed to read dead letters")?;

    Ok(QueueReport {
        generated_at_ms: Utc::now().timestamp_millis(),
        backend: config.storage.backend,
        queue_key: QUEUE_KEY,
        dead_letter_key: DEAD_LETTER_KEY,
        pending,
        dead_letters,
    })
}

fn emit_payload(target: Option<&Path>, payload: &str) -> Result<()> {
    if let Some(path) = target {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, payload).with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Queue report written to {}", path.display());
    } else {
        println!("{payload}");
    }
    Ok(())
}

fn parse_args<I>(args: I) -> Result<CliOptions>
where
    I: IntoIterator<Item = String>,
{
    let mut options = CliOptions {
        output: None,
        pretty: false,
        backend: None,
        data_dir: None,
        database_url: None,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-o" | "--output" => {
                let path = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--output requires a path\n{}", usage()))?;
                options.output = Some(PathBuf::from(path));
            }
            "--pretty" => options.pretty = true,
            "--backend" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--backend requires a value\n{}", usage()))?;
                options.backend = Some(parse_backend(&value)?);
            }
            "--data-dir" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--data-dir requires a value\n{}", usage()))?;
                options.data_dir = Some(value);
            }
            "--database-url" => {
                let value = iter.next().ok_or_else(|| {
                    anyhow::anyhow!("--database-url requires a value\n{}", usage())
                })?;
                options.database_url = Some(value);
            }
            "-h" | "--help" => {
                println!("{}", usage());
                std::process::exit(0);
            }
            other => bail!("Unknown argument: {other}\n{}", usage()),
        }
    }

    Ok(options)
}

fn parse_backend(value: &str) -> Result<StorageBackend> {
    match value.to_ascii_lowercase().as_str() {
        "sqlite" => Ok(StorageBackend::Sqlite),
        "file" => Ok(StorageBackend::File),
        // メモリストアはプロセス外から読めない
        other => bail!("Unsupported backend: {other}. Expected 'sqlite' or 'file'."),
    }
}
