use cmdbot::{client::Client, config::Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Config::load().await?;
    let mut client = Client::new(cfg);

    let manifest = client.load_manifest().await?;
    client.load_events(&manifest)?;
    client.load_commands(&manifest)?;

    client.connect(None).await
}
