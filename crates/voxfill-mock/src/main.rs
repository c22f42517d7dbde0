//! Standalone mock inference server.
//!
//! Usage: cargo run -p voxfill-mock -- [--port <PORT>] [--model <MODEL>]
//!
//! MODEL is one of `solid` (default), `empty`, `stop:N` or `recolor:ID`.

use tokio::net::TcpListener;

use voxfill_mock::{serve, MockModel, DEFAULT_PORT};

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn parse_u16_arg(args: &[String], flag: &str) -> Option<u16> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .format_timestamp_millis()
    .init();

    let args: Vec<String> = std::env::args().collect();
    let port = parse_u16_arg(&args, "--port").unwrap_or(DEFAULT_PORT);
    let model = match parse_str_arg(&args, "--model").map(|m| m.parse::<MockModel>()) {
        None => MockModel::Solid,
        Some(Ok(model)) => model,
        Some(Err(e)) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let addr = format!("127.0.0.1:{}", port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            log::error!("Failed to bind mock server on {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    log::info!("Mock inference server ({:?}) listening on {}", model, addr);
    serve(listener, model).await;
}
