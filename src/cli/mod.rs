//! Command-line interface.
//!
//! Every flag can also be supplied through the environment (or a `.env`
//! file), so container deployments only need to set variables.

mod serve;

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

use crate::config::Settings;
use crate::llama::KvCacheType;

pub use serve::{print_banner, run_server};

/// Which downstream pipeline the UI offers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Anonymization only
    Anonymizer,
    /// Information extraction only
    #[value(name = "informationextraction")]
    InformationExtraction,
    /// Let the user pick per run
    #[default]
    Choice,
}

impl Mode {
    /// Human-readable label for the UI.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Anonymizer => "Anonymizer",
            Self::InformationExtraction => "Information Extraction",
            Self::Choice => "Anonymizer / Information Extraction",
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "llm-anonymizer")]
#[command(about = "Web app for llama-cpp")]
#[command(version)]
pub struct Cli {
    /// Path where the models are stored which llama cpp can load.
    #[arg(long = "model_path", env = "MODEL_PATH", default_value = "models")]
    pub model_path: PathBuf,

    /// Path to the llama server executable.
    #[arg(long = "server_path", env = "SERVER_PATH", default_value = "", value_parser = clap::builder::TypedValueParser::map(clap::builder::OsStringValueParser::new(), PathBuf::from))]
    pub server_path: PathBuf,

    /// On which port the Web App should be available.
    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Host to bind to. Anything other than localhost requires a password.
    #[arg(long, env = "HOST", default_value = "localhost")]
    pub host: String,

    /// YAML config file (shared with the downstream pipeline)
    #[arg(long = "config_file", env = "CONFIG_FILE", default_value = "config.yml")]
    pub config_file: PathBuf,

    /// Number of layers llama.cpp offloads to the GPU
    #[arg(long = "n_gpu_layers", env = "N_GPU_LAYERS", default_value_t = 80)]
    pub n_gpu_layers: u32,

    /// Port of the llama.cpp server
    #[arg(long = "llamacpp_port", env = "LLAMACPP_PORT", default_value_t = 2929)]
    pub llamacpp_port: u16,

    /// Debug logging
    #[arg(long, env = "DEBUG")]
    pub debug: bool,

    /// Which mode to run
    #[arg(long, env = "MODE", value_enum, default_value_t = Mode::Choice)]
    pub mode: Mode,

    /// Parallel llama-cpp processing.
    #[arg(long = "enable_parallel", env = "ENABLE_PARALLEL")]
    pub enable_parallel: bool,

    /// Number of parallel slots for llama processing
    #[arg(long = "parallel_slots", env = "PARALLEL_SLOTS", default_value_t = 1)]
    pub parallel_slots: u32,

    /// Disable parallel preprocessing
    #[arg(long = "no_parallel_preprocessing", env = "NO_PARALLEL_PREPROCESSING")]
    pub no_parallel_preprocessing: bool,

    /// KV cache type
    #[arg(long = "kv_cache_type", env = "KV_CACHE_TYPE", value_enum, default_value_t = KvCacheType::Q8_0)]
    pub kv_cache_type: KvCacheType,

    /// Enable memory locking
    #[arg(
        long,
        env = "MLOCK",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value_t = true,
        default_missing_value = "true"
    )]
    pub mlock: bool,

    /// Set custom context size for llama cpp (-1 keeps the model default)
    #[arg(long = "context_size", env = "CONTEXT_SIZE", default_value_t = -1, allow_negative_numbers = true)]
    pub context_size: i64,

    /// Verbose llama cpp
    #[arg(long = "verbose_llama", env = "VERBOSE_LLAMA")]
    pub verbose_llama: bool,

    /// Disable password protection
    #[arg(long = "no_password", env = "NO_PASSWORD")]
    pub no_password: bool,

    /// Password for the web UI (overrides the config file)
    #[arg(long, env = "APP_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

/// Resolve settings and run the web server.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::from_cli(cli)?;
    run_server(settings).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_underscore_flags_parse() {
        let cli = Cli::try_parse_from([
            "llm-anonymizer",
            "--model_path",
            "/srv/models",
            "--port",
            "8080",
            "--host",
            "0.0.0.0",
            "--n_gpu_layers",
            "12",
            "--kv_cache_type",
            "iq4_nl",
            "--mode",
            "informationextraction",
            "--context_size",
            "-1",
            "--enable_parallel",
            "--parallel_slots",
            "4",
        ])
        .unwrap();

        assert_eq!(cli.model_path, PathBuf::from("/srv/models"));
        assert_eq!(cli.port, 8080);
        assert_eq!(cli.host, "0.0.0.0");
        assert_eq!(cli.n_gpu_layers, 12);
        assert_eq!(cli.kv_cache_type, KvCacheType::Iq4Nl);
        assert_eq!(cli.mode, Mode::InformationExtraction);
        assert_eq!(cli.context_size, -1);
        assert!(cli.enable_parallel);
        assert_eq!(cli.parallel_slots, 4);
    }

    #[test]
    fn test_mlock_accepts_explicit_value() {
        let cli = Cli::try_parse_from(["llm-anonymizer", "--mlock", "false"]).unwrap();
        assert!(!cli.mlock);

        let cli = Cli::try_parse_from(["llm-anonymizer", "--mlock"]).unwrap();
        assert!(cli.mlock);
    }

    #[test]
    fn test_rejects_unknown_kv_cache_type() {
        let result = Cli::try_parse_from(["llm-anonymizer", "--kv_cache_type", "q2_k"]);
        assert!(result.is_err());
    }
}
