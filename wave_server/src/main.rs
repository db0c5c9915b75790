#[tokio::main]
async fn main() {
    if let Err(e) = wave_server::frameworks::server::run_with_config().await {
        tracing::error!(error = %e, "wave server exited");
        std::process::exit(1);
    }
}
