//! Tome application binary - composition root.
//!
//! Wires the crates into a single executable:
//! 1. Parse CLI arguments and resolve configuration
//! 2. Initialize tracing
//! 3. Build the HTTP backend client and the session controller
//! 4. Run a line-oriented loop that forwards triggers to the controller
//!    and prints its state snapshots
//!
//! The loop is deliberately thin: all orchestration decisions live in the
//! controller, which a richer presentation layer would observe the same way.

use std::io::Write as _;
use std::sync::Arc;

use clap::Parser;
use tokio::io::AsyncBufReadExt;

use tome_client::HttpBackend;
use tome_core::config::TomeConfig;
use tome_core::types::FileMeta;
use tome_session::{SessionController, ToastState};

mod cli;

use cli::CliArgs;

fn print_help() {
    println!("Ask a question, or use a command:");
    println!("  :upload <path> [path ...]   ingest one or more documents");
    println!("  :status                     backend health and session state");
    println!("  :help                       show this help");
    println!("  :quit                       exit");
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

async fn handle_question(controller: &SessionController, line: &str) {
    match controller.send(line).await {
        Ok(assistant) => {
            println!("{}", assistant.content);
            if !assistant.sources.is_empty() {
                println!("  sources: {}", assistant.sources.join(", "));
            }
            if let Some(confidence) = assistant.confidence {
                println!("  confidence: {:.2}", confidence);
            }
        }
        Err(e) => eprintln!("error: {}", e),
    }
}

async fn handle_upload(controller: &SessionController, rest: &str) {
    let mut files = Vec::new();
    for path in rest.split_whitespace() {
        match FileMeta::from_path(path) {
            Ok(file) => files.push(file),
            Err(e) => eprintln!("error: cannot read {}: {}", path, e),
        }
    }

    match files.len() {
        0 => eprintln!("usage: :upload <path> [path ...]"),
        1 => {
            // Single-file path drives the toast indicator.
            let file = &files[0];
            match controller.upload(file).await {
                Ok(receipt) => {
                    println!(
                        "uploaded {} ({} chunks, {} total)",
                        receipt.filename, receipt.chunks_added, receipt.total_chunks
                    );
                }
                Err(e) => eprintln!("error: {}", e),
            }
        }
        n => {
            controller.enqueue(files);
            match controller.process_batch().await {
                Ok(uploaded) => println!("uploaded {} of {} files", uploaded, n),
                Err(e) => {
                    let snapshot = controller.snapshot();
                    eprintln!("error: {}", e);
                    eprintln!(
                        "uploaded {} files; {} still pending",
                        snapshot.completed_uploads.len(),
                        snapshot.pending_uploads.len()
                    );
                }
            }
        }
    }
}

async fn handle_status(controller: &SessionController) {
    match controller.backend_health().await {
        Ok(health) => {
            println!(
                "backend: {} ({} files, {} chunks)",
                health.status,
                health.uploaded_files.len(),
                health.total_chunks
            );
        }
        Err(e) => eprintln!("backend unreachable: {}", e),
    }

    let snapshot = controller.snapshot();
    println!(
        "session: {} messages, {} pending uploads, {} completed",
        snapshot.messages.len(),
        snapshot.pending_uploads.len(),
        snapshot.completed_uploads.len()
    );
    if let ToastState::Succeeded(name) = snapshot.toast {
        println!("recently uploaded: {}", name);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = TomeConfig::load_or_default(&config_file);
    config.backend.base_url = args.resolve_backend_url(&config.backend.base_url);
    let log_level = args.resolve_log_level(&config.general.log_level);

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    tracing::info!("Starting Tome v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(backend = %config.backend.base_url, "Using document backend");

    // Controller over the HTTP backend.
    let backend = Arc::new(HttpBackend::from_config(&config.backend)?);
    let controller = SessionController::new(backend, &config);

    print_help();
    prompt();

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            prompt();
            continue;
        }

        if line == ":upload" {
            eprintln!("usage: :upload <path> [path ...]");
        } else if let Some(rest) = line.strip_prefix(":upload ") {
            handle_upload(&controller, rest).await;
        } else if line == ":status" {
            handle_status(&controller).await;
        } else if line == ":help" {
            print_help();
        } else if line == ":quit" || line == ":q" {
            break;
        } else {
            handle_question(&controller, line).await;
        }
        prompt();
    }

    Ok(())
}
