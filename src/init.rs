use std::{str::FromStr, sync::Arc};

use poise::serenity_prelude::{self as serenity, *};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};
use tokio::sync::{broadcast, Mutex};
use tracing::Instrument;

use crate::{
    commands,
    config::Config,
    remote::{HttpQuoteServer, QuoteSource},
    session::Sessions,
    storage::{KeyValueStore, SqliteStore},
    store::{QuoteStore, StoreEvent},
    sync::{describe_event, spawn_sync_task},
    telemetry, Data,
};

async fn init_database(db_url: &str) -> anyhow::Result<Pool<Sqlite>> {
    tracing::info!("initializing database connection...");
    let opts = SqliteConnectOptions::from_str(db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);
    let db = SqlitePoolOptions::new()
        .max_connections(20)
        .connect_with(opts)
        .await?;

    tracing::info!("running migrations...");
    sqlx::migrate!("./migrations").run(&db).await?;
    tracing::info!("finished running migrations!");

    Ok(db)
}

async fn init_store(db: Pool<Sqlite>) -> anyhow::Result<Arc<Mutex<QuoteStore>>> {
    tracing::info!("loading quotes...");

    let storage: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::new(db));
    let store = QuoteStore::load(storage).await?;

    Ok(Arc::new(Mutex::new(store)))
}

async fn init_discord_client(token: &str, data: Data) -> anyhow::Result<Client> {
    let intents =
        serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::MESSAGE_CONTENT;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::help::help(),
                commands::status::status(),
                commands::quote::quote(),
            ],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some("q>".into()),
                ..Default::default()
            },
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands)
                    .await
                    .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when registering commands"))?;

                Ok(data)
            }.in_current_span())
        })
        .build();

    let client = ClientBuilder::new(token, intents)
        .framework(framework)
        .activity(serenity::ActivityData::custom("q>quote for a random quote"))
        .await?;

    Ok(client)
}

fn spawn_feed_notifier(
    http: Arc<Http>,
    channel_id: ChannelId,
    mut events: broadcast::Receiver<StoreEvent>,
) {
    tracing::info!("initialized quote feed notifier!");

    tokio::spawn(
        async move {
            loop {
                let event = match events.recv().await {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "quote feed notifier fell behind");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };

                let Some(content) = describe_event(&event) else {
                    continue;
                };

                let _ = channel_id
                    .send_message(http.as_ref(), CreateMessage::new().content(content))
                    .await
                    .inspect_err(
                        |e| tracing::error!(err = ?e, "an error occurred when sending message"),
                    );
            }
        }
        .in_current_span(),
    );
}

async fn spawn_background_tasks(client: &Client, data: &Data, config: &Config) {
    if let Some(channel_id) = config.feed_channel_id {
        let events = data.store.lock().await.subscribe();
        spawn_feed_notifier(client.http.clone(), channel_id, events);
    }

    if config.sync_enabled {
        spawn_sync_task(
            data.store.clone(),
            data.server.clone(),
            config.sync_interval,
        );
    } else {
        tracing::warn!("quote sync is disabled. local quotes will not be reconciled with the server.");
    }
}

pub async fn init() -> anyhow::Result<Client> {
    telemetry::init_telemetry().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!("initializing... please wait warmly.");

    let config = Config::from_env()?;

    let db = init_database(&config.database_url).await?;
    let store = init_store(db).await?;
    let server: Arc<dyn QuoteSource> = Arc::new(HttpQuoteServer::new(&config.quote_server_url)?);

    let data = Data {
        store,
        sessions: Sessions::default(),
        server,
        sync_enabled: config.sync_enabled,
        sync_interval: config.sync_interval,
    };

    let client = init_discord_client(&config.discord_token, data.clone()).await?;
    spawn_background_tasks(&client, &data, &config).await;

    tracing::info!("finished initializing!");
    Ok(client)
}
