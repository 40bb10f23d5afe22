use std::{sync::Arc, time::Duration};

use constants::STARTUP_TIME;
use remote::QuoteSource;
use session::Sessions;
use store::QuoteStore;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct Data {
    store: Arc<Mutex<QuoteStore>>,
    sessions: Sessions,
    server: Arc<dyn QuoteSource>,
    sync_enabled: bool,
    sync_interval: Duration,
}

type Error = Box<dyn std::error::Error + Send + Sync>;
type Context<'a> = poise::Context<'a, Data, Error>;

mod commands;
mod config;
mod constants;
mod error;
mod init;
mod models;
mod remote;
mod session;
mod storage;
mod store;
mod sync;
mod telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let _ = &*STARTUP_TIME;

    let mut client = init::init().await?;

    client
        .start()
        .await
        .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when running client"))?;

    Ok(())
}
