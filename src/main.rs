use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    gepetto::run().await
}
