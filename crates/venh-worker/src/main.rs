//! Video enhancement worker binary.
//!
//! Reads one job document (JSON) from the file named on the command line,
//! or from stdin, and writes the job result to stdout.

use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::{error, info};

use venh_models::JobRequest;
use venh_worker::{init_tracing, JobHandler, PassthroughBackend, WorkerConfig};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting venh-worker");

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    let raw = match read_document(std::env::args().nth(1)).await {
        Ok(raw) => raw,
        Err(e) => {
            error!("Failed to read job document: {}", e);
            std::process::exit(1);
        }
    };
    let request: JobRequest = match serde_json::from_str(&raw) {
        Ok(request) => request,
        Err(e) => {
            error!("Job document is not valid JSON: {}", e);
            std::process::exit(1);
        }
    };

    let backend = Arc::new(PassthroughBackend::new(config.require_models));
    let handler = match JobHandler::new(config, backend) {
        Ok(handler) => handler,
        Err(e) => {
            error!("Failed to create job handler: {}", e);
            std::process::exit(1);
        }
    };

    let result = handler.handle(request).await;
    match serde_json::to_string(&result) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            error!("Failed to serialize job result: {}", e);
            std::process::exit(1);
        }
    }

    info!("venh-worker finished");
}

async fn read_document(path: Option<String>) -> std::io::Result<String> {
    match path {
        Some(path) if path != "-" => tokio::fs::read_to_string(path).await,
        _ => {
            let mut raw = String::new();
            tokio::io::stdin().read_to_string(&mut raw).await?;
            Ok(raw)
        }
    }
}
