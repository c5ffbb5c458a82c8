use anyhow::Result;
use chatbot::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
