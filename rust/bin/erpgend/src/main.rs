//! `erpgend`: metadata-to-artifact generation service.
//!
//! Usage:
//!   erpgend [-c <config.toml>] serve [--listen <addr>]
//!   erpgend [-c <config.toml>] generate --target full --out out.zip person.xml project.xml
//!   erpgend [-c <config.toml>] fixtures [--snapshot ids.json] [--seed 7] person.xml
//!
//! A missing config file means defaults.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use axum::routing::get;
use axum::{Json, Router};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use erpgen_codegen::JobTarget;
use erpgen_core::{Module, ServiceConfig};
use erpgen_fixture::{FixturePlan, ReferenceSnapshot, Synthesizer};
use erpgen_ir::{ConstraintMap, MetadataDocument, ModelSpec};
use erpgen_job::engine::JobEngine;
use erpgen_job::worker::WorkerConfig;
use erpgen_job::{EngineConfig, FileSchemaStore, JobModule, JsonFileReferences};

/// Metadata-to-artifact generator.
#[derive(Parser, Debug)]
#[command(name = "erpgend", about = "ERP artifact generator")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(short = 'c', long = "config", default_value = "erpgend.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP job service.
    Serve {
        /// Listen address (overrides the config file).
        #[arg(long)]
        listen: Option<String>,
    },
    /// Generate one archive from metadata files, without the service.
    Generate {
        /// backend, frontend, unit_test or full.
        #[arg(long, default_value = "full")]
        target: JobTarget,
        /// Where to write the zip.
        #[arg(long, default_value = "artifacts.zip")]
        out: PathBuf,
        /// Fixture RNG seed (overrides the config file).
        #[arg(long)]
        seed: Option<u64>,
        /// Metadata documents, XML or JSON.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print the fixture suite of one metadata document as JSON.
    Fixtures {
        /// Reference snapshot (`[{model, ids, next_id}]`).
        #[arg(long)]
        snapshot: Option<PathBuf>,
        /// Fixture RNG seed (overrides the config file).
        #[arg(long)]
        seed: Option<u64>,
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ServiceConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    match cli.command {
        Command::Serve { listen } => {
            if let Some(listen) = listen {
                config.listen = listen;
            }
            serve(config).await
        }
        Command::Generate {
            target,
            out,
            seed,
            files,
        } => {
            if seed.is_some() {
                config.fixtures.seed = seed;
            }
            generate(config, target, &out, &files).await
        }
        Command::Fixtures {
            snapshot,
            seed,
            file,
        } => {
            if snapshot.is_some() {
                config.fixtures.snapshot_path = snapshot;
            }
            if seed.is_some() {
                config.fixtures.seed = seed;
            }
            fixtures(&config, &file)
        }
    }
}

/// Engine wired to the configured snapshot file and schema directory.
fn build_engine(config: &ServiceConfig) -> anyhow::Result<JobEngine> {
    let mut engine = JobEngine::new(EngineConfig::from_service(config));

    if let Some(path) = config.resolve_snapshot_path() {
        info!("Reference snapshot: {}", path.display());
        engine = engine.with_references(Arc::new(JsonFileReferences::new(path)));
    }

    if let Some(dir) = &config.data_dir {
        let store = FileSchemaStore::open(dir.join("schemas"))
            .with_context(|| format!("opening schema store under {}", dir.display()))?;
        engine = engine.with_schema_store(Arc::new(store));
    }

    Ok(engine)
}

// ---------------------------------------------------------------------------
// serve
// ---------------------------------------------------------------------------

async fn serve(config: ServiceConfig) -> anyhow::Result<()> {
    let engine = build_engine(&config)?;
    let job_module = JobModule::new(engine, WorkerConfig::from(&config.retention));
    info!("{} module initialized", job_module.name());

    let app = Router::new()
        .route("/health", get(health))
        .merge(job_module.routes());

    let listener = tokio::net::TcpListener::bind(&config.listen)
        .await
        .with_context(|| format!("binding {}", config.listen))?;
    info!("erpgend listening on {}", config.listen);
    axum::serve(listener, app).await?;

    job_module.shutdown();
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// generate
// ---------------------------------------------------------------------------

async fn generate(
    config: ServiceConfig,
    target: JobTarget,
    out: &Path,
    files: &[PathBuf],
) -> anyhow::Result<()> {
    let documents = files
        .iter()
        .map(|f| std::fs::read_to_string(f).with_context(|| format!("reading {}", f.display())))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let engine = build_engine(&config)?;
    let output = engine.generate(target, &documents).await?;

    for failure in &output.report.failed {
        warn!(model = %failure.model, "skipped: {}", failure.reason);
    }
    std::fs::write(out, &output.archive).with_context(|| format!("writing {}", out.display()))?;
    info!(
        generated = output.report.generated.len(),
        failed = output.report.failed.len(),
        artifacts = output.report.artifacts,
        "archive written to {}",
        out.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// fixtures
// ---------------------------------------------------------------------------

fn fixtures(config: &ServiceConfig, file: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let doc = MetadataDocument::parse(&text).with_context(|| format!("parsing {}", file.display()))?;
    let model = ModelSpec::from_document(&doc).with_context(|| format!("building {}", file.display()))?;

    let snapshot = match config.resolve_snapshot_path() {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str::<ReferenceSnapshot>(&raw)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => ReferenceSnapshot::new(),
    };

    let plan = FixturePlan {
        valid_cases: config.fixtures.valid_cases,
        invalid_cases: config.fixtures.invalid_cases,
        invalid_id_cases: config.fixtures.invalid_id_cases,
    };
    let constraints = ConstraintMap::derive(&model);
    let suite = Synthesizer::new(plan, config.fixtures.seed).synthesize(
        &model,
        &constraints,
        &snapshot.focus(&model.model_name),
    )?;

    println!("{}", serde_json::to_string_pretty(&suite)?);
    Ok(())
}
