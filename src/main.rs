use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    omnitime::cli::run().await
}
