use std::{sync::Arc, time::Duration};

use futures::StreamExt;
use tokio::{sync::Mutex, task::JoinHandle, time::MissedTickBehavior};
use tracing::Instrument;

use crate::{
    error::QuoteError,
    models::quotes::Quote,
    remote::QuoteSource,
    store::{QuoteStore, StoreEvent},
};

/// pulls the server's quotes and lets them replace the local ones. a failed fetch leaves the
/// store untouched.
#[tracing::instrument(skip_all)]
pub async fn sync_once(store: &Mutex<QuoteStore>, source: &dyn QuoteSource) -> Result<usize, QuoteError> {
    tracing::info!("started syncing quotes with server!");

    let remote = source.fetch_quotes().await.inspect_err(
        |e| tracing::error!(err = ?e, "an error occurred when fetching quotes, retrying next tick"),
    )?;

    let count = store
        .lock()
        .await
        .merge_from_remote(remote)
        .await
        .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when merging server quotes"))?;

    tracing::info!(count, "finished syncing quotes with server!");

    Ok(count)
}

/// runs [`sync_once`] on every tick of `period`, forever. the first tick fires immediately.
pub fn spawn_sync_task(
    store: Arc<Mutex<QuoteStore>>,
    source: Arc<dyn QuoteSource>,
    period: Duration,
) -> JoinHandle<()> {
    tracing::info!(period_secs = period.as_secs(), "initialized quote sync!");

    tokio::spawn(
        async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            let task = futures::stream::unfold(
                (interval, store, source),
                |(mut interval, store, source)| async move {
                    interval.tick().await;
                    let _ = sync_once(&store, source.as_ref()).await;

                    Some(((), (interval, store, source)))
                },
            );

            task.for_each(|_| async {}).await;
        }
        .in_current_span(),
    )
}

/// submits `quote` to the server without making the caller wait for it. failures are only
/// logged; the next sync overwrites local state anyway.
pub fn spawn_post_quote(source: Arc<dyn QuoteSource>, quote: Quote) -> JoinHandle<()> {
    tokio::spawn(
        async move {
            let _ = source.post_quote(&quote).await;
        }
        .in_current_span(),
    )
}

/// the message posted to the feed channel for an event, if it warrants one.
pub fn describe_event(event: &StoreEvent) -> Option<String> {
    match event {
        StoreEvent::Merged {
            count,
            changed: true,
        } => Some(format!(
            "quotes synced with server! now holding {count} quote(s)."
        )),
        StoreEvent::Merged { changed: false, .. }
        | StoreEvent::Imported { .. }
        | StoreEvent::Added(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::{
        models::quotes::ImportMode,
        storage::{KeyValueStore, MemoryStore},
    };

    fn network_error() -> QuoteError {
        let err = reqwest::Client::new()
            .get("not a url")
            .build()
            .unwrap_err();

        QuoteError::Network(err)
    }

    /// fails on every call up to `fail_first`, then serves `quotes`.
    struct FakeSource {
        quotes: Vec<Quote>,
        fail_first: usize,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn new(quotes: Vec<Quote>, fail_first: usize) -> Self {
            Self {
                quotes,
                fail_first,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl QuoteSource for FakeSource {
        async fn fetch_quotes(&self) -> Result<Vec<Quote>, QuoteError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);

            if call < self.fail_first {
                Err(network_error())
            } else {
                Ok(self.quotes.clone())
            }
        }

        async fn post_quote(&self, _quote: &Quote) -> Result<(), QuoteError> {
            Ok(())
        }
    }

    async fn store() -> Arc<Mutex<QuoteStore>> {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        Arc::new(Mutex::new(QuoteStore::load(storage).await.unwrap()))
    }

    fn server_quotes() -> Vec<Quote> {
        vec![Quote::new("one", "Server"), Quote::new("two", "Server")]
    }

    #[tokio::test]
    async fn sync_replaces_local_quotes() {
        let store = store().await;
        let source = FakeSource::new(server_quotes(), 0);

        let count = sync_once(&store, &source).await.unwrap();

        assert_eq!(count, 2);
        assert_eq!(store.lock().await.quotes(), server_quotes().as_slice());
    }

    #[tokio::test]
    async fn failed_sync_leaves_store_untouched() {
        let store = store().await;
        let before = store.lock().await.quotes().to_vec();
        let source = FakeSource::new(server_quotes(), 1);

        let result = sync_once(&store, &source).await;

        assert!(matches!(result, Err(QuoteError::Network(_))));
        assert_eq!(store.lock().await.quotes(), before.as_slice());
    }

    #[tokio::test(start_paused = true)]
    async fn sync_task_retries_on_next_tick() {
        let store = store().await;
        let source = Arc::new(FakeSource::new(server_quotes(), 1));

        let handle = spawn_sync_task(store.clone(), source.clone(), Duration::from_secs(10));

        tokio::time::sleep(Duration::from_secs(15)).await;

        assert!(source.calls.load(Ordering::SeqCst) >= 2);
        assert_eq!(store.lock().await.quotes(), server_quotes().as_slice());

        handle.abort();
    }

    /// accepts posts, or never answers them when `hang` is set.
    struct PostSink {
        hang: bool,
        posted: std::sync::Mutex<Vec<Quote>>,
    }

    #[async_trait]
    impl QuoteSource for PostSink {
        async fn fetch_quotes(&self) -> Result<Vec<Quote>, QuoteError> {
            Ok(vec![])
        }

        async fn post_quote(&self, quote: &Quote) -> Result<(), QuoteError> {
            if self.hang {
                std::future::pending::<()>().await;
            }

            self.posted.lock().unwrap().push(quote.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn posting_runs_in_the_background() {
        let sink = Arc::new(PostSink {
            hang: false,
            posted: Default::default(),
        });

        spawn_post_quote(sink.clone(), Quote::new("a", "b"))
            .await
            .unwrap();

        assert_eq!(*sink.posted.lock().unwrap(), vec![Quote::new("a", "b")]);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_server_does_not_block_the_caller() {
        let sink = Arc::new(PostSink {
            hang: true,
            posted: Default::default(),
        });

        let handle = spawn_post_quote(sink.clone(), Quote::new("a", "b"));
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert!(!handle.is_finished());
        assert!(sink.posted.lock().unwrap().is_empty());

        handle.abort();
    }

    #[test]
    fn only_changing_merges_are_announced() {
        assert!(describe_event(&StoreEvent::Merged {
            count: 3,
            changed: true
        })
        .unwrap()
        .contains("3 quote(s)"));
        assert_eq!(
            describe_event(&StoreEvent::Merged {
                count: 3,
                changed: false
            }),
            None
        );
        assert_eq!(
            describe_event(&StoreEvent::Imported {
                count: 1,
                mode: ImportMode::Append
            }),
            None
        );
        assert_eq!(describe_event(&StoreEvent::Added(Quote::new("a", "b"))), None);
    }
}
