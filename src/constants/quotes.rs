use std::sync::LazyLock;

use crate::models::quotes::Quote;

pub const QUOTES_KEY: &str = "quotes";
pub const SELECTED_CATEGORY_KEY: &str = "selectedCategory";
pub const LAST_VIEWED_KEY_PREFIX: &str = "lastViewedQuote";

/// value of the category filter that selects every quote.
pub const ALL_CATEGORIES: &str = "all";

/// category given to quotes pulled from the quote server.
pub const SERVER_CATEGORY: &str = "Server";

pub const DEFAULT_QUOTE_SERVER_URL: &str = "https://jsonplaceholder.typicode.com";
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_DATABASE_URL: &str = "sqlite://quotes.db";

pub const EXPORT_FILE_NAME: &str = "quotes.json";

pub static DEFAULT_QUOTES: LazyLock<Vec<Quote>> = LazyLock::new(|| {
    vec![
        Quote::new(
            "Life is what happens when you're busy making other plans.",
            "Life",
        ),
        Quote::new(
            "The way to get started is to quit talking and begin doing.",
            "Motivation",
        ),
        Quote::new(
            "Your time is limited, so don't waste it living someone else's life.",
            "Inspirational",
        ),
    ]
});
