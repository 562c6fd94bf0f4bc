use std::io::Read;

use spec_flow::SpecExtractor;

#[tokio::main]
async fn main() {
    // Initialize Telemetry
    tracing_subscriber::fmt()
        .with_env_filter("spec_flow=debug,info")
        .with_target(false)
        .json()
        .init();

    // * HTML comes from a file argument, or stdin when none is given
    let html = match std::env::args().nth(1) {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(error) => {
                tracing::error!(%error, path, "Failed to read input file");
                std::process::exit(1);
            }
        },
        None => {
            let mut buffer = String::new();
            if let Err(error) = std::io::stdin().read_to_string(&mut buffer) {
                tracing::error!(%error, "Failed to read stdin");
                std::process::exit(1);
            }
            buffer
        }
    };

    let extractor = SpecExtractor::new();
    match extractor.extract(&html).await {
        Ok(result) => {
            tracing::info!(
                tables = result.specifications.len(),
                warnings = result.warnings.len(),
                "Extraction complete"
            );
            println!(
                "{}",
                serde_json::to_string_pretty(&result.to_api_response())
                    .unwrap_or_else(|_| "{}".to_string())
            );
        }
        Err(error) => {
            tracing::error!(%error, "Extraction failed");
            std::process::exit(1);
        }
    }
}
