use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    tether::run::run_agent().await
}
