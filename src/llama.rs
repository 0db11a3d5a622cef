//! llama.cpp server configuration.
//!
//! The web front end does not talk to the model itself; it carries the
//! llama.cpp settings so the downstream pipeline can launch `llama-server`
//! with the flags the operator chose.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use tokio::process::Command;

/// KV cache quantisation accepted by llama.cpp (`-ctk` / `-ctv`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum KvCacheType {
    #[value(name = "q4_0")]
    Q4_0,
    #[default]
    #[value(name = "q8_0")]
    Q8_0,
    #[value(name = "f16")]
    F16,
    #[value(name = "f32")]
    F32,
    #[value(name = "q5_0")]
    Q5_0,
    #[value(name = "q5_1")]
    Q5_1,
    #[value(name = "q4_1")]
    Q4_1,
    #[value(name = "iq4_nl")]
    Iq4Nl,
}

impl KvCacheType {
    /// Name as llama.cpp spells it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Q4_0 => "q4_0",
            Self::Q8_0 => "q8_0",
            Self::F16 => "f16",
            Self::F32 => "f32",
            Self::Q5_0 => "q5_0",
            Self::Q5_1 => "q5_1",
            Self::Q4_1 => "q4_1",
            Self::Iq4Nl => "iq4_nl",
        }
    }
}

/// Settings passed through to the llama.cpp server.
#[derive(Debug, Clone)]
pub struct LlamaSettings {
    /// Directory holding `.gguf` model files.
    pub model_path: PathBuf,
    /// `llama-server` executable.
    pub server_path: PathBuf,
    pub port: u16,
    pub n_gpu_layers: u32,
    /// Serve several requests at once (`--parallel`).
    pub parallel: bool,
    pub parallel_slots: u32,
    pub kv_cache_type: KvCacheType,
    pub mlock: bool,
    /// Context size; values <= 0 keep the model default.
    pub context_size: i64,
    pub verbose: bool,
}

/// Describes how to launch a llama.cpp server.
pub struct LlamaServer {
    settings: LlamaSettings,
}

impl LlamaServer {
    pub fn new(settings: LlamaSettings) -> Self {
        Self { settings }
    }

    /// List `.gguf` model files in the model directory, sorted by name.
    pub fn available_models(&self) -> io::Result<Vec<PathBuf>> {
        let mut models: Vec<PathBuf> = fs::read_dir(&self.settings.model_path)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.is_file()
                    && p.extension()
                        .map(|ext| ext.eq_ignore_ascii_case("gguf"))
                        .unwrap_or(false)
            })
            .collect();
        models.sort();
        Ok(models)
    }

    /// Arguments for serving `model`.
    pub fn args(&self, model: &Path) -> Vec<String> {
        let s = &self.settings;
        let mut args = vec![
            "--model".to_string(),
            model.display().to_string(),
            "--host".to_string(),
            "127.0.0.1".to_string(),
            "--port".to_string(),
            s.port.to_string(),
            "-ngl".to_string(),
            s.n_gpu_layers.to_string(),
            "-ctk".to_string(),
            s.kv_cache_type.as_str().to_string(),
            "-ctv".to_string(),
            s.kv_cache_type.as_str().to_string(),
        ];

        if s.parallel {
            args.push("--parallel".to_string());
            args.push(s.parallel_slots.to_string());
            args.push("--cont-batching".to_string());
        }
        if s.mlock {
            args.push("--mlock".to_string());
        }
        if s.context_size > 0 {
            args.push("-c".to_string());
            args.push(s.context_size.to_string());
        }
        if s.verbose {
            args.push("--verbose".to_string());
        }
        args
    }

    /// Build the command that launches the server for `model`.
    pub fn command(&self, model: &Path) -> Command {
        let mut cmd = Command::new(&self.settings.server_path);
        cmd.args(self.args(model)).kill_on_drop(true);
        cmd
    }
}
