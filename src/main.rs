use traka::commands::Cli;

// All periodic work is interleaved on one thread; only network calls suspend.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    Cli::menu().await
}
