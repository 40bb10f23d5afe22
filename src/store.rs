use std::sync::Arc;

use rand::seq::SliceRandom;
use tokio::sync::broadcast;

use crate::{
    constants::{DEFAULT_QUOTES, QUOTES_KEY, SELECTED_CATEGORY_KEY},
    error::QuoteError,
    models::quotes::{CategoryFilter, ImportMode, Quote},
    storage::{KeyValueStore, KeyValueStoreExt},
};

const EVENT_CAPACITY: usize = 16;

/// a mutation that happened to the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    Added(Quote),
    Imported { count: usize, mode: ImportMode },
    Merged { count: usize, changed: bool },
}

/// the quote collection, mirrored into durable storage after every mutation.
pub struct QuoteStore {
    quotes: Vec<Quote>,
    storage: Arc<dyn KeyValueStore>,
    events: broadcast::Sender<StoreEvent>,
}

impl QuoteStore {
    /// reads the persisted collection, falling back to the default quotes when the slot is empty
    /// or holds something that isn't a quote list.
    #[tracing::instrument(skip_all)]
    pub async fn load(storage: Arc<dyn KeyValueStore>) -> Result<Self, QuoteError> {
        let quotes = match storage.get_json::<Vec<Quote>>(QUOTES_KEY).await {
            Ok(Some(quotes)) => quotes,
            Ok(None) => {
                tracing::info!("no stored quotes found, starting from the default list.");
                DEFAULT_QUOTES.clone()
            }
            Err(QuoteError::Parse(e)) => {
                tracing::warn!(err = ?e, "stored quotes are malformed, starting from the default list.");
                DEFAULT_QUOTES.clone()
            }
            Err(e) => return Err(e),
        };

        tracing::info!(count = quotes.len(), "loaded quotes");

        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            quotes,
            storage,
            events,
        })
    }

    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// registers an observer for every later mutation.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// validates and appends `quote`, returning it as stored.
    pub async fn add(&mut self, quote: Quote) -> Result<Quote, QuoteError> {
        let quote = Quote::validated(&quote.text, &quote.category)?;

        let mut next = self.quotes.clone();
        next.push(quote.clone());
        self.commit(next).await?;

        tracing::info!(category = %quote.category, "added quote");
        self.notify(StoreEvent::Added(quote.clone()));

        Ok(quote)
    }

    /// the server always wins: the local collection becomes exactly `remote`.
    pub async fn merge_from_remote(&mut self, remote: Vec<Quote>) -> Result<usize, QuoteError> {
        let count = remote.len();
        let changed = self.quotes != remote;
        self.commit(remote).await?;

        tracing::info!(count, changed, "replaced local quotes with server quotes");
        self.notify(StoreEvent::Merged { count, changed });

        Ok(count)
    }

    pub fn filter_by_category(&self, filter: &CategoryFilter) -> Vec<&Quote> {
        self.quotes.iter().filter(|q| filter.matches(q)).collect()
    }

    /// unique categories, in the order they first appear.
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = Vec::new();

        for quote in &self.quotes {
            if !categories.contains(&quote.category.as_str()) {
                categories.push(&quote.category);
            }
        }

        categories
    }

    pub fn random(&self, filter: &CategoryFilter) -> Option<&Quote> {
        self.filter_by_category(filter)
            .choose(&mut rand::thread_rng())
            .copied()
    }

    pub fn export_snapshot(&self) -> Result<String, QuoteError> {
        Ok(serde_json::to_string_pretty(&self.quotes)?)
    }

    /// parses `raw` as a quote list and appends it or swaps it in. nothing changes on a parse
    /// failure. returns how many quotes were read.
    pub async fn import_snapshot(&mut self, raw: &str, mode: ImportMode) -> Result<usize, QuoteError> {
        let imported: Vec<Quote> = serde_json::from_str(raw)
            .inspect_err(|e| tracing::warn!(err = ?e, "an error occurred when parsing imported quotes"))?;
        let count = imported.len();

        let next = match mode {
            ImportMode::Append => {
                let mut next = self.quotes.clone();
                next.extend(imported);
                next
            }
            ImportMode::Replace => imported,
        };
        self.commit(next).await?;

        tracing::info!(count, ?mode, "imported quotes");
        self.notify(StoreEvent::Imported { count, mode });

        Ok(count)
    }

    pub async fn selected_category(&self) -> Result<CategoryFilter, QuoteError> {
        match self
            .storage
            .get_json::<CategoryFilter>(SELECTED_CATEGORY_KEY)
            .await
        {
            Ok(filter) => Ok(filter.unwrap_or_default()),
            Err(QuoteError::Parse(e)) => {
                tracing::warn!(err = ?e, "stored category filter is malformed, using all categories.");
                Ok(CategoryFilter::All)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn set_selected_category(&self, filter: &CategoryFilter) -> Result<(), QuoteError> {
        self.storage.set_json(SELECTED_CATEGORY_KEY, filter).await
    }

    async fn commit(&mut self, next: Vec<Quote>) -> Result<(), QuoteError> {
        self.storage.set_json(QUOTES_KEY, &next).await?;
        self.quotes = next;

        Ok(())
    }

    fn notify(&self, event: StoreEvent) {
        // no receivers is fine
        let _ = self.events.send(event);
    }
}
