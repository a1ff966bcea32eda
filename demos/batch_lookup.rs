//! Check a list of domains concurrently and dump the report as JSON.
//!
//! Run with: cargo run --example batch_lookup -- "a.com, b.net c.org"
//! WHOIS_CONCURRENCY and WHOIS_BATCH_TIMEOUT_SECONDS tune the batch.

use domain_whois::{BatchResult, WhoisClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "domain_whois=info".into()),
        )
        .init();

    let list = std::env::args()
        .skip(1)
        .collect::<Vec<_>>()
        .join(" ");
    let list = if list.trim().is_empty() {
        "rust-lang.org, crates.io, docs.rs, rust-lang.org, not_a_domain".to_string()
    } else {
        list
    };

    let client = WhoisClient::new()?;
    let report = client.batch_query_domain_list(&list).await;

    for (input, result) in domain_whois::parse_domain_list(&list).iter().zip(report.per_input()) {
        match result {
            BatchResult::Record(record) if record.registered => {
                println!("{:<30} registered  {}", input, record.registrar.as_deref().unwrap_or("-"));
            }
            BatchResult::Record(_) => println!("{:<30} available", input),
            BatchResult::Error(info) => println!("{:<30} {:<11} {}", input, info.kind, info.message),
        }
    }

    println!("\n{}", serde_json::to_string_pretty(&report.summary)?);
    Ok(())
}
