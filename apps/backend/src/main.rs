#[tokio::main]
async fn main() -> anyhow::Result<()> {
    srs_sentences_backend::run().await
}
