use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;

use health_tree::{CheckResult, Classification};

#[derive(Parser)]
#[command(name = "health-cli")]
#[command(about = "Query a health-tree endpoint", long_about = None)]
struct Cli {
    /// Base URL of the health routes.
    #[arg(short, long, default_value = "http://localhost:8080/health")]
    url: String,

    /// Bearer token, when the service requires one.
    #[arg(short, long)]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Invoke a check (dot-separated id, root when omitted) and classify it
    Check { id: Option<String> },
    /// Print the raw root response
    Raw,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", key))?);
    }

    match cli.command {
        Commands::Check { id } => {
            let url = match id.as_deref() {
                Some(id) if !id.is_empty() => format!("{}/{}", cli.url, id),
                _ => cli.url.clone(),
            };
            let res = client.get(url).headers(headers).send().await?;
            let classification = print_check(res).await?;
            println!("classification: {:?}", classification);
            if !matches!(classification, Classification::Healthy | Classification::NoChecks) {
                std::process::exit(1);
            }
        }
        Commands::Raw => {
            let res = client.get(&cli.url).headers(headers).send().await?;
            println!("{}", res.status());
            println!("{}", res.text().await?);
        }
    }

    Ok(())
}

async fn print_check(res: reqwest::Response) -> Result<Classification, Box<dyn std::error::Error>> {
    match res.status() {
        StatusCode::NO_CONTENT => Ok(Classification::NoChecks),
        StatusCode::NOT_FOUND => {
            eprintln!("{}", res.text().await?);
            Ok(Classification::NotFound)
        }
        StatusCode::FORBIDDEN => Err("health endpoint rejected the token".into()),
        _ => {
            let result: CheckResult = res.json().await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(result.classify())
        }
    }
}
