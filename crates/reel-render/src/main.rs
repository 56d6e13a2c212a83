//! Assembly build binary.
//!
//! Usage: `reelforge <script.json> [tier] [output_dir]`
//!
//! Environment:
//! - `REGISTRY_PATH`: JSON asset registry to load (default: empty registry)
//! - `MASTER_AUDIO`: optional master narration track muxed over the clips
//! - `RENDER_*`: see [`RenderConfig::from_env`]

use std::path::PathBuf;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reel_models::{BudgetTier, Script};
use reel_plan::PlanError;
use reel_registry::{AssetRegistry, JsonFileRepository, RegistryRepository};
use reel_render::{AssemblyPipeline, RenderConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("reel=info".parse().expect("static directive"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    let mut args = std::env::args().skip(1);
    let script_path = args
        .next()
        .context("usage: reelforge <script.json> [tier] [output_dir]")?;
    let tier: BudgetTier = args
        .next()
        .unwrap_or_else(|| "medium".to_string())
        .parse()
        .map_err(PlanError::UnknownTier)?;
    let output_dir = PathBuf::from(args.next().unwrap_or_else(|| "./out".to_string()));

    let script_json = std::fs::read_to_string(&script_path)
        .with_context(|| format!("failed to read script {script_path}"))?;
    let script: Script = serde_json::from_str(&script_json).context("invalid script JSON")?;
    script.validate().context("invalid script")?;

    let registry = match std::env::var("REGISTRY_PATH") {
        Ok(path) => {
            let repository = JsonFileRepository::new(&path);
            repository
                .load()
                .with_context(|| format!("failed to load registry {path}"))?
        }
        Err(_) => AssetRegistry::new(),
    };

    let master_audio = std::env::var("MASTER_AUDIO").ok().map(PathBuf::from);

    let config = RenderConfig::from_env();
    info!("Render config: {:?}", config);

    let pipeline = AssemblyPipeline::new(config);
    let output = pipeline
        .build(&script, tier, &registry, master_audio.as_deref(), &output_dir)
        .await?;

    info!(
        media = %output.media_path.display(),
        manifest = %output.manifest_path.display(),
        rendered = output.rendered,
        cached = output.skipped,
        placeholders = output.placeholders,
        "Build finished"
    );
    Ok(())
}
