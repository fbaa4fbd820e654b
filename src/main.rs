//! QazSign recognizer CLI
//!
//! Serves the recognition endpoint, or runs single frames through a
//! persisted session from the command line.

use clap::{Parser, Subcommand};
use qazsign_recognizer::{
    config::{Config, RecognitionPreset},
    server::{run, ServerConfig},
    FeatureLayout, Recognizer, VERSION,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qazsign")]
#[command(version = VERSION)]
#[command(about = "Real-time sign-language word recognizer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP recognition server
    Serve {
        /// Address to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,

        /// Path to classifier weights (JSON)
        #[arg(long)]
        model: Option<PathBuf>,

        /// Deployment preset (streaming or persisted)
        #[arg(long)]
        preset: Option<String>,

        /// Confidence threshold, overrides the preset
        #[arg(long)]
        threshold: Option<f32>,

        /// Feature layout (hands or holistic)
        #[arg(long)]
        layout: Option<String>,

        /// Persist session windows under this directory
        #[arg(long)]
        sequences_dir: Option<PathBuf>,
    },

    /// Run one frame file through a persisted session and print the result
    PredictFile {
        /// Session to append to
        session_id: String,

        /// File containing the base64 frame
        frame_file: PathBuf,

        /// Path to classifier weights (JSON)
        #[arg(long)]
        model: Option<PathBuf>,

        /// Directory holding session windows
        #[arg(long)]
        sequences_dir: Option<PathBuf>,
    },

    /// List the label vocabulary
    Actions,

    /// Show configuration
    Config,
}

#[tokio::main]
async fn main() {
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            port,
            model,
            preset,
            threshold,
            layout,
            sequences_dir,
        } => {
            let mut config = load_config_strict();
            if let Some(name) = preset {
                match RecognitionPreset::from_name(&name) {
                    Some(preset) => config.apply_preset(preset),
                    None => fail(&format!("Unknown preset '{name}' (use streaming or persisted)")),
                }
            }
            if let Some(name) = layout {
                match FeatureLayout::from_name(&name) {
                    Some(layout) => config.layout = layout,
                    None => fail(&format!("Unknown layout '{name}' (use hands or holistic)")),
                }
            }
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(model) = model {
                config.model_path = model;
            }
            if let Some(threshold) = threshold {
                config.confidence_threshold = threshold;
            }
            if sequences_dir.is_some() {
                config.sequences_dir = sequences_dir;
            }

            if let Err(e) = cmd_serve(config).await {
                fail(&format!("{e:#}"));
            }
        }
        Commands::PredictFile {
            session_id,
            frame_file,
            model,
            sequences_dir,
        } => {
            let mut config = load_config_strict();
            config.apply_preset(RecognitionPreset::Persisted);
            if let Some(model) = model {
                config.model_path = model;
            }
            if sequences_dir.is_some() {
                config.sequences_dir = sequences_dir;
            }
            cmd_predict_file(config, &session_id, frame_file).await;
        }
        Commands::Actions => {
            cmd_actions();
        }
        Commands::Config => {
            cmd_config();
        }
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Configuration for commands that only display it.
fn load_config() -> Config {
    Config::load().unwrap_or_else(|e| {
        tracing::warn!("Could not load configuration, using defaults: {}", e);
        Config::default()
    })
}

/// Configuration for commands that recognize frames. A broken file is fatal.
fn load_config_strict() -> Config {
    Config::load().unwrap_or_else(|e| {
        fail(&format!(
            "Could not load configuration from {}: {e}",
            Config::config_path().display()
        ))
    })
}

fn fail(message: &str) -> ! {
    tracing::error!("{}", message);
    eprintln!("Error: {message}");
    std::process::exit(1);
}

async fn cmd_serve(config: Config) -> anyhow::Result<()> {
    tracing::info!("QazSign recognizer v{}", VERSION);

    config.ensure_directories()?;
    let recognizer = Arc::new(Recognizer::from_config(&config)?);

    let (addr, shutdown_tx) = run(ServerConfig::from_config(&config), recognizer).await?;
    tracing::info!("Serving on http://{}", addr);

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    let _ = shutdown_tx.send(());

    Ok(())
}

async fn cmd_predict_file(config: Config, session_id: &str, frame_file: PathBuf) {
    let outcome = async {
        let payload = tokio::fs::read_to_string(&frame_file)
            .await
            .map_err(|e| format!("Could not read {}: {e}", frame_file.display()))?;
        config.ensure_directories().map_err(|e| e.to_string())?;
        let recognizer = Recognizer::from_config(&config).map_err(|e| e.to_string())?;
        let result = recognizer
            .submit_image(session_id, payload)
            .await
            .map_err(|e| e.to_string())?;
        serde_json::to_value(&result).map_err(|e| e.to_string())
    }
    .await;

    match outcome {
        Ok(result) => println!("{result}"),
        Err(message) => {
            tracing::error!(session_id, "Prediction failed: {}", message);
            println!("{}", serde_json::json!({ "error": message }));
            std::process::exit(1);
        }
    }
}

fn cmd_actions() {
    let config = load_config();
    for (index, label) in config.labels.iter().enumerate() {
        println!("{index:>2}  {label}");
    }
}

fn cmd_config() {
    let config = load_config();
    println!("Configuration file: {}", Config::config_path().display());
    println!();
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{json}"),
        Err(e) => fail(&format!("Could not serialize configuration: {e}")),
    }
}
