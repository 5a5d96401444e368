#[tokio::main]
async fn main() {
    if let Err(e) = ragchat::run().await {
        tracing::error!(error = %e, "ragchat exited with error");
        eprintln!("ragchat: {e}");
        std::process::exit(1);
    }
}
