use clap::Parser;
use miette::{IntoDiagnostic, Result};
use payrec::application::creation::CreationService;
use payrec::application::query::QueryService;
use payrec::application::reconciler::Reconciler;
use payrec::config::EngineConfig;
use payrec::domain::payment::IdempotencyKey;
use payrec::domain::ports::{IdempotencyIndexRef, PaymentStoreRef};
use payrec::error::PaymentError;
use payrec::infrastructure::in_memory::{InMemoryIdempotencyIndex, InMemoryPaymentStore};
use payrec::interfaces::api::{PaymentResponse, WebhookPayload};
use payrec::interfaces::csv::summary_writer::SummaryWriter;
use payrec::interfaces::jsonl::replay_reader::{ReplayReader, ReplayRecord, WebhookRecord};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input replay stream: JSON lines of create/webhook records
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[cfg(feature = "storage-rocksdb")]
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Engine configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[cfg(feature = "storage-rocksdb")]
fn build_stores(cli: &Cli) -> payrec::error::Result<(PaymentStoreRef, IdempotencyIndexRef)> {
    if let Some(db_path) = &cli.db_path {
        let store = payrec::infrastructure::rocksdb::RocksDBStore::open(db_path)?;
        return Ok((Arc::new(store.clone()), Arc::new(store)));
    }
    Ok((
        Arc::new(InMemoryPaymentStore::new()),
        Arc::new(InMemoryIdempotencyIndex::new()),
    ))
}

#[cfg(not(feature = "storage-rocksdb"))]
fn build_stores(_cli: &Cli) -> payrec::error::Result<(PaymentStoreRef, IdempotencyIndexRef)> {
    Ok((
        Arc::new(InMemoryPaymentStore::new()),
        Arc::new(InMemoryIdempotencyIndex::new()),
    ))
}

/// Resolves a replay webhook record to the provider payload shape. Records
/// referencing the payment by `creation_key` go through the idempotency
/// index.
async fn resolve_webhook(
    record: WebhookRecord,
    index: &IdempotencyIndexRef,
) -> payrec::error::Result<WebhookPayload> {
    let payment_id = match (record.payment_id, record.creation_key) {
        (Some(id), _) => id,
        (None, Some(raw_key)) => {
            let key = IdempotencyKey::new(raw_key)?;
            index
                .get(&key, chrono::Utc::now())
                .await?
                .ok_or_else(|| PaymentError::NotFound(format!("creation key {key}")))?
                .to_string()
        }
        (None, None) => {
            return Err(PaymentError::ValidationError(
                "webhook record needs payment_id or creation_key".to_string(),
            ));
        }
    };
    Ok(WebhookPayload {
        payment_id,
        status: record.status,
        timestamp: record.timestamp,
        signature: record.signature,
        reason: record.reason,
    })
}

async fn apply_webhook(
    reconciler: &Reconciler,
    index: &IdempotencyIndexRef,
    record: WebhookRecord,
) -> payrec::error::Result<()> {
    let payload = resolve_webhook(record, index).await?;
    let event = payload.into_event()?;
    reconciler.apply(&event).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_toml_file(path).into_diagnostic()?,
        None => EngineConfig::default(),
    };

    let (payments, index) = build_stores(&cli).into_diagnostic()?;
    let creation = CreationService::new(payments.clone(), index.clone(), config.clone());
    let reconciler = Reconciler::new(payments.clone(), &config);
    let query = QueryService::new(payments);

    let file = File::open(&cli.input).into_diagnostic()?;
    for record in ReplayReader::new(file).records() {
        match record {
            Ok(ReplayRecord::Create(request)) => match request.validate(None) {
                Ok((draft, key)) => match creation.create(draft, key).await {
                    Ok((payment, is_new)) => {
                        let response =
                            PaymentResponse::from_payment(&payment, &config.portal_base_url);
                        info!(
                            payment_id = %response.payment_id,
                            status = %response.status,
                            is_new,
                            "creation processed"
                        );
                    }
                    Err(e) => warn!(error = %e, "creation failed"),
                },
                Err(e) => warn!(error = %e, "invalid creation request"),
            },
            Ok(ReplayRecord::Webhook(record)) => {
                if let Err(e) = apply_webhook(&reconciler, &index, record).await {
                    warn!(error = %e, "webhook rejected");
                }
            }
            Err(e) => warn!(error = %e, "skipping malformed replay line"),
        }
    }

    let stats = query.stats().await.into_diagnostic()?;
    info!(payments = stats.payments_count, "replay finished");

    let all = query.all().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = SummaryWriter::new(stdout.lock());
    writer.write_payments(all).into_diagnostic()?;

    Ok(())
}
