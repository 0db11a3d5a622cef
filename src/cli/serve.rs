//! Web server command.

use console::style;

use crate::config::Settings;
use crate::extract::TextExtractor;
use crate::llama::LlamaServer;

/// Log tool availability and the llama.cpp setup, then start the web server.
pub async fn run_server(settings: Settings) -> anyhow::Result<()> {
    for (tool, available) in TextExtractor::check_tools() {
        if available {
            tracing::debug!(tool = %tool, "External tool found");
        } else {
            tracing::warn!(
                tool = %tool,
                "External tool not found in PATH; PDF and image uploads will fail"
            );
        }
    }

    let llama = LlamaServer::new(settings.llama.clone());
    match llama.available_models() {
        Ok(models) => {
            tracing::info!(
                model_path = %settings.llama.model_path.display(),
                models = models.len(),
                "Found llama.cpp models"
            );
            if let Some(first) = models.first() {
                tracing::debug!(command = ?llama.command(first), "llama.cpp server invocation");
            }
        }
        Err(e) => tracing::warn!(
            model_path = %settings.llama.model_path.display(),
            error = %e,
            "Cannot list llama.cpp models"
        ),
    }

    print_banner(&settings);

    crate::server::serve(settings).await
}

/// Print the start banner.
pub fn print_banner(settings: &Settings) {
    println!(
        "{} Start Server on http://{}:{}",
        style("→").cyan(),
        settings.host,
        settings.port
    );
    if settings.host == "0.0.0.0" {
        println!(
            "  Please use http://localhost:{} to access the web app locally or the IP / hostname of your server to access the web app in your local network.",
            settings.port
        );
    }
    if settings.auth_required {
        println!("  {} Requires authentication", style("!").yellow());
        if settings.password_generated {
            if let Some(password) = &settings.password {
                println!(
                    "  Generated password: {}",
                    style(password).bold()
                );
            }
        }
    }
    println!("  Press Ctrl+C to stop");
}
