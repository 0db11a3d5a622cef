//! Runtime configuration.
//!
//! Settings come from the command line (or matching environment variables)
//! layered over an optional YAML config file. The YAML file is shared with
//! the downstream LLM pipeline, so keys this crate does not know are ignored.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use rand::distributions::{Alphanumeric, DistString};
use serde::Deserialize;

use crate::cli::{Cli, Mode};
use crate::llama::{KvCacheType, LlamaSettings};

/// Default request body limit in megabytes.
pub const DEFAULT_UPLOAD_LIMIT_MB: usize = 512;

/// Length of the generated web UI password.
const GENERATED_PASSWORD_LEN: usize = 16;

/// Keys read from the YAML config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Password for the web UI when authentication is required.
    pub password: Option<String>,
    /// Maximum upload size in megabytes.
    pub upload_limit_mb: Option<usize>,
    /// Language passed to ocrmypdf (`-l`), e.g. `deu+eng`.
    pub ocr_language: Option<String>,
    /// Parent directory for per-job upload directories.
    pub work_dir: Option<PathBuf>,
}

impl FileConfig {
    /// Load the config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let contents =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("parsing {}", path.display()))
    }

    /// Parse config file contents. An empty document yields the defaults.
    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }
}

/// Fully resolved application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub debug: bool,
    pub mode: Mode,
    pub config_file: PathBuf,
    /// Whether the web UI sits behind HTTP basic auth.
    pub auth_required: bool,
    pub password: Option<String>,
    /// True when `password` was generated at startup.
    pub password_generated: bool,
    pub upload_limit_bytes: usize,
    /// Extract the files of a job concurrently.
    pub parallel_preprocessing: bool,
    pub ocr_language: Option<String>,
    pub work_dir: Option<PathBuf>,
    pub llama: LlamaSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5000,
            debug: false,
            mode: Mode::Choice,
            config_file: PathBuf::from("config.yml"),
            auth_required: false,
            password: None,
            password_generated: false,
            upload_limit_bytes: DEFAULT_UPLOAD_LIMIT_MB * 1024 * 1024,
            parallel_preprocessing: true,
            ocr_language: None,
            work_dir: None,
            llama: LlamaSettings::default(),
        }
    }
}

impl Settings {
    /// Resolve settings from parsed CLI arguments and the config file they name.
    pub fn from_cli(cli: Cli) -> anyhow::Result<Self> {
        let file = FileConfig::load(&cli.config_file)?;
        Self::resolve(cli, file)
    }

    /// Combine CLI arguments with an already loaded config file.
    pub fn resolve(cli: Cli, file: FileConfig) -> anyhow::Result<Self> {
        let auth_required = requires_auth(&cli.host, cli.no_password);

        let mut password = cli
            .password
            .or(file.password)
            .filter(|p| !p.is_empty());
        let mut password_generated = false;
        if auth_required && password.is_none() {
            password = Some(Alphanumeric.sample_string(&mut rand::thread_rng(), GENERATED_PASSWORD_LEN));
            password_generated = true;
            tracing::warn!("No password configured, generated a random one for this run");
        }

        let llama = LlamaSettings {
            model_path: absolute(&cli.model_path)?,
            server_path: absolute(&cli.server_path)?,
            port: cli.llamacpp_port,
            n_gpu_layers: cli.n_gpu_layers,
            parallel: cli.enable_parallel,
            parallel_slots: cli.parallel_slots,
            kv_cache_type: cli.kv_cache_type,
            mlock: cli.mlock,
            context_size: cli.context_size,
            verbose: cli.verbose_llama,
        };

        Ok(Self {
            host: cli.host,
            port: cli.port,
            debug: cli.debug,
            mode: cli.mode,
            config_file: cli.config_file,
            auth_required,
            password,
            password_generated,
            upload_limit_bytes: file.upload_limit_mb.unwrap_or(DEFAULT_UPLOAD_LIMIT_MB) * 1024 * 1024,
            parallel_preprocessing: !cli.no_parallel_preprocessing,
            ocr_language: file.ocr_language,
            work_dir: file.work_dir,
            llama,
        })
    }
}

impl Default for LlamaSettings {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models"),
            server_path: PathBuf::new(),
            port: 2929,
            n_gpu_layers: 80,
            parallel: false,
            parallel_slots: 1,
            kv_cache_type: KvCacheType::Q8_0,
            mlock: true,
            context_size: -1,
            verbose: false,
        }
    }
}

/// Anything not bound to localhost is password protected unless disabled.
pub fn requires_auth(host: &str, no_password: bool) -> bool {
    host != "localhost" && !no_password
}

/// Make a path absolute against the current working directory.
fn absolute(path: &Path) -> anyhow::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("resolving current directory")?;
    Ok(cwd.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(host: &str, args: &[&str]) -> Cli {
        let mut full = vec![
            "llm-anonymizer",
            "--host",
            host,
            "--model_path",
            "models",
            "--server_path",
            "/opt/llama/llama-server",
        ];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_requires_auth() {
        assert!(!requires_auth("localhost", false));
        assert!(requires_auth("0.0.0.0", false));
        assert!(!requires_auth("0.0.0.0", true));
    }

    #[test]
    fn test_relative_model_path_made_absolute() {
        let settings = Settings::resolve(cli("localhost", &[]), FileConfig::default()).unwrap();
        assert!(settings.llama.model_path.is_absolute());
        assert!(settings.llama.model_path.ends_with("models"));
        assert_eq!(
            settings.llama.server_path,
            PathBuf::from("/opt/llama/llama-server")
        );
    }

    #[test]
    fn test_generates_password_when_exposed() {
        let mut args = cli("0.0.0.0", &[]);
        args.password = Some("hunter2".to_string());
        let settings = Settings::resolve(args, FileConfig::default()).unwrap();
        assert!(settings.auth_required);
        assert_eq!(settings.password.as_deref(), Some("hunter2"));
        assert!(!settings.password_generated);

        let mut args = cli("0.0.0.0", &[]);
        args.password = None;
        let settings = Settings::resolve(args, FileConfig::default()).unwrap();
        assert!(settings.password_generated);
        assert_eq!(settings.password.unwrap().len(), GENERATED_PASSWORD_LEN);
    }

    #[test]
    fn test_cli_password_beats_config_file() {
        let file = FileConfig {
            password: Some("from-file".to_string()),
            ..Default::default()
        };
        let mut args = cli("0.0.0.0", &[]);
        args.password = Some("from-cli".to_string());
        let settings = Settings::resolve(args, file.clone()).unwrap();
        assert_eq!(settings.password.as_deref(), Some("from-cli"));

        let mut args = cli("0.0.0.0", &[]);
        args.password = None;
        let settings = Settings::resolve(args, file).unwrap();
        assert_eq!(settings.password.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_empty_password_is_replaced() {
        let file = FileConfig::parse("password: \"\"\n").unwrap();
        assert_eq!(file.password.as_deref(), Some(""));

        let mut args = cli("0.0.0.0", &[]);
        args.password = None;
        let settings = Settings::resolve(args, file).unwrap();
        assert!(settings.password_generated);
        assert_eq!(settings.password.unwrap().len(), GENERATED_PASSWORD_LEN);

        let mut args = cli("0.0.0.0", &[]);
        args.password = Some(String::new());
        let settings = Settings::resolve(args, FileConfig::default()).unwrap();
        assert!(settings.password_generated);
    }

    #[test]
    fn test_parse_file_config_ignores_unknown_keys() {
        let config = FileConfig::parse(
            "password: secret\nupload_limit_mb: 64\nocr_language: deu+eng\nllm:\n  temperature: 0.1\n",
        )
        .unwrap();
        assert_eq!(config.password.as_deref(), Some("secret"));
        assert_eq!(config.upload_limit_mb, Some(64));
        assert_eq!(config.ocr_language.as_deref(), Some("deu+eng"));
    }

    #[test]
    fn test_missing_config_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = FileConfig::load(&dir.path().join("absent.yml")).unwrap();
        assert!(config.password.is_none());
        assert!(config.work_dir.is_none());
    }

    #[test]
    fn test_upload_limit_from_file() {
        let file = FileConfig {
            upload_limit_mb: Some(2),
            ..Default::default()
        };
        let settings = Settings::resolve(cli("localhost", &["--no_parallel_preprocessing"]), file).unwrap();
        assert_eq!(settings.upload_limit_bytes, 2 * 1024 * 1024);
        assert!(!settings.parallel_preprocessing);
    }
}
