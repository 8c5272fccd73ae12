use std::sync::Arc;
use std::sync::atomic::Ordering;

use vacation_responder::auth;
use vacation_responder::config::ResponderConfig;
use vacation_responder::gateway::GmailGateway;
use vacation_responder::responder::Responder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ResponderConfig::from_env();

    eprintln!("📬 Vacation Responder v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Credentials: {}", config.credentials_path.display());
    eprintln!("   Token cache: {}", config.token_path.display());
    eprintln!(
        "   Reply label: {} (delay {}–{}s, idle {}s)\n",
        config.label_name,
        config.reply_delay_min_secs,
        config.reply_delay_max_secs,
        config.idle_delay.as_secs()
    );

    // Authorization must complete before the loop starts; a failure here
    // is fatal.
    let token = match auth::authorize(&config).await {
        Ok(token) => token,
        Err(e) => {
            eprintln!("Error: authorization failed: {e}");
            std::process::exit(1);
        }
    };

    let gateway = Arc::new(GmailGateway::new(token.access_token.clone()));
    let responder = Responder::new(config, gateway);

    // Ctrl-C sets the cancellation flag; the loop exits before its next
    // scheduled cycle and the process returns 0.
    let shutdown = responder.shutdown_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown requested; finishing current cycle");
            shutdown.store(true, Ordering::Relaxed);
        }
    });

    responder.run().await;
    Ok(())
}
