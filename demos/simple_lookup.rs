//! Look up a few domains and print the normalized records.
//!
//! Run with: cargo run --example simple_lookup [domain...]

use domain_whois::{ErrorKind, WhoisClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "domain_whois=info".into()),
        )
        .init();

    let client = WhoisClient::new()?;

    let mut domains: Vec<String> = std::env::args().skip(1).collect();
    if domains.is_empty() {
        domains = vec![
            "rust-lang.org".into(),
            "github.com".into(),
            "surely-unregistered-name-4711.com".into(),
        ];
    }

    for domain in &domains {
        println!("\n{}\n{}", domain, "-".repeat(domain.len()));

        match client.query_domain(domain).await {
            Ok(record) if record.is_available() => {
                println!("  available (answered by {})", record.whois_server.as_deref().unwrap_or("?"));
            }
            Ok(record) => {
                println!("  registrar:    {}", record.registrar.as_deref().unwrap_or("unknown"));
                println!("  created:      {}", fmt_date(record.created_at));
                println!("  expires:      {}", fmt_date(record.expires_at));
                println!("  updated:      {}", fmt_date(record.updated_at));
                if let Some(days) = record.days_until_expiry() {
                    if record.is_expired() {
                        println!("  expired {} days ago", -days);
                    } else {
                        println!("  expires in {} days", days);
                    }
                }
                if !record.statuses.is_empty() {
                    println!("  statuses:     {}", record.statuses.join(", "));
                }
                for ns in &record.name_servers {
                    println!("  name server:  {}", ns);
                }
                println!("  whois server: {}", record.whois_server.as_deref().unwrap_or("?"));
            }
            Err(e) if e.kind() == ErrorKind::AmbiguousResponse => {
                println!("  could not interpret the response:");
                for line in e.raw_text().unwrap_or_default().lines().take(10) {
                    println!("    | {}", line);
                }
            }
            Err(e) => println!("  error ({}): {}", e.kind(), e),
        }
    }

    Ok(())
}

fn fmt_date(date: Option<chrono::NaiveDate>) -> String {
    date.map_or_else(|| "unknown".to_string(), |d| d.to_string())
}
