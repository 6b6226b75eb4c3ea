use launchspec::cli::{print_error, Cli};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("launchspec=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = Cli::run().await {
        print_error(&e.to_string());
        std::process::exit(1);
    }
}
