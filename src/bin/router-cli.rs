use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "router-cli")]
#[command(about = "Management CLI for the webhook router", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Admin API key, required for `reset` when the router has one configured.
    #[arg(short, long, env = "WEBHOOK_ROUTER_ADMIN_KEY")]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Overall health, backends, and request counts
    Status,
    /// Active strategy and per-backend state
    Balancer,
    /// Mark every backend healthy again
    Reset,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {key}"))?);
    }

    let request = match cli.command {
        Commands::Status => client.get(format!("{base}/health")),
        Commands::Balancer => client.get(format!("{base}/load-balancer")),
        Commands::Reset => client.post(format!("{base}/reset-health")),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: router returned status {status}");
        if let Ok(text) = res.text().await {
            eprintln!("Response: {text}");
        }
        return Err(format!("request failed with status {status}").into());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
