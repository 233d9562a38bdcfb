use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    uiquery_cli::cli::app::run().await
}
