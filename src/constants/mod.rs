use std::sync::LazyLock;

pub mod quotes;
pub mod version;

pub use quotes::*;

pub static POISE_VERSION: &str = "0.6.1";
pub static STARTUP_TIME: LazyLock<std::time::SystemTime> =
    LazyLock::new(std::time::SystemTime::now);
