use anyhow::Result;
use tracking_notify::cli::CliApp;

#[tokio::main]
async fn main() -> Result<()> {
    CliApp::run().await
}
