use poise::serenity_prelude::{Attachment, CreateAttachment};

use crate::{
    constants::{ALL_CATEGORIES, EXPORT_FILE_NAME},
    error::QuoteError,
    models::quotes::{CategoryFilter, ImportMode, Quote},
    sync::{spawn_post_quote, sync_once},
    Context, Error,
};

/// discord rejects messages longer than this.
const MESSAGE_LIMIT: usize = 2000;

async fn reply(ctx: Context<'_>, content: impl Into<String>) -> Result<(), Error> {
    ctx.send(poise::CreateReply::default().content(content))
        .await
        .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when sending reply"))?;

    Ok(())
}

fn more_footer(count: usize) -> String {
    format!("... and {count} more.")
}

/// renders quotes one per line, cutting the list off before it outgrows a single message.
pub(crate) fn format_quote_list(quotes: &[&Quote], limit: usize) -> String {
    let mut out = String::new();

    for (idx, quote) in quotes.iter().enumerate() {
        let line = format!("{}. {}\n", idx + 1, quote);
        let remaining = quotes.len() - idx - 1;

        // room for the footer is only needed while more quotes could follow this line
        let reserved = if remaining > 0 {
            more_footer(remaining).len()
        } else {
            0
        };

        if out.len() + line.len() + reserved > limit {
            out.push_str(&more_footer(quotes.len() - idx));
            return out;
        }

        out.push_str(&line);
    }

    out
}

/// show a random quote, optionally from one category.
#[tracing::instrument(skip(ctx))]
#[poise::command(
    prefix_command,
    aliases("quotes"),
    subcommands(
        "add_quote",
        "list_quotes",
        "categories",
        "last_quote",
        "export_quotes",
        "import_quotes",
        "sync_quotes"
    )
)]
pub async fn quote(ctx: Context<'_>, #[rest] category: Option<String>) -> Result<(), Error> {
    let picked = {
        let store = ctx.data().store.lock().await;

        let filter = match category {
            Some(category) => CategoryFilter::from(category),
            None => store.selected_category().await?,
        };

        store.random(&filter).cloned().ok_or(filter)
    };

    let quote = match picked {
        Ok(quote) => quote,
        Err(filter) => return reply(ctx, format!("there are no quotes in {filter}.")).await,
    };

    ctx.data()
        .sessions
        .remember(ctx.author().id.get(), &quote)
        .await?;

    reply(ctx, quote.to_string()).await
}

/// add a new quote: `add <category> <text>`.
#[tracing::instrument(skip(ctx))]
#[poise::command(prefix_command, rename = "add")]
pub async fn add_quote(
    ctx: Context<'_>,
    category: Option<String>,
    #[rest] text: Option<String>,
) -> Result<(), Error> {
    let quote = Quote::new(text.unwrap_or_default(), category.unwrap_or_default());

    let result = ctx.data().store.lock().await.add(quote).await;

    match result {
        Ok(quote) => {
            reply(ctx, "quote added successfully!").await?;

            if ctx.data().sync_enabled {
                spawn_post_quote(ctx.data().server.clone(), quote);
            }

            Ok(())
        }
        Err(e @ QuoteError::Validation { .. }) => reply(ctx, e.to_string()).await,
        Err(e) => {
            tracing::error!(err = ?e, "an error occurred when adding quote");
            Err(e.into())
        }
    }
}

/// list quotes in a category and remember it as the selected one.
#[tracing::instrument(skip(ctx))]
#[poise::command(prefix_command, rename = "list")]
pub async fn list_quotes(ctx: Context<'_>, #[rest] category: Option<String>) -> Result<(), Error> {
    let filter = CategoryFilter::from(category.unwrap_or_else(|| ALL_CATEGORIES.to_string()));

    let content = {
        let store = ctx.data().store.lock().await;
        store.set_selected_category(&filter).await?;

        let quotes = store.filter_by_category(&filter);

        if quotes.is_empty() {
            format!("there are no quotes in {filter}.")
        } else {
            let header = format!("**{}** ({} quote(s))\n", filter, quotes.len());
            let list = format_quote_list(&quotes, MESSAGE_LIMIT.saturating_sub(header.len()));

            format!("{header}{list}")
        }
    };

    reply(ctx, content).await
}

/// list every category.
#[tracing::instrument(skip(ctx))]
#[poise::command(prefix_command)]
pub async fn categories(ctx: Context<'_>) -> Result<(), Error> {
    let content = {
        let store = ctx.data().store.lock().await;
        let selected = store.selected_category().await?;

        let mut content = format!("- {ALL_CATEGORIES}\n");
        for category in store.categories() {
            content.push_str(&format!("- {category}\n"));
        }
        content.push_str(&format!("currently selected: {selected}"));

        content
    };

    reply(ctx, content).await
}

/// show the last quote you viewed since the bot started.
#[tracing::instrument(skip(ctx))]
#[poise::command(prefix_command, rename = "last")]
pub async fn last_quote(ctx: Context<'_>) -> Result<(), Error> {
    match ctx.data().sessions.last_viewed(ctx.author().id.get()).await? {
        Some(quote) => reply(ctx, quote.to_string()).await,
        None => reply(ctx, "you haven't viewed any quote yet.").await,
    }
}

/// download every quote as a JSON file.
#[tracing::instrument(skip(ctx))]
#[poise::command(prefix_command, rename = "export")]
pub async fn export_quotes(ctx: Context<'_>) -> Result<(), Error> {
    let (snapshot, count) = {
        let store = ctx.data().store.lock().await;
        (store.export_snapshot()?, store.len())
    };

    ctx.send(
        poise::CreateReply::default()
            .content(format!("exported {count} quote(s)."))
            .attachment(CreateAttachment::bytes(snapshot.into_bytes(), EXPORT_FILE_NAME)),
    )
    .await
    .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when sending reply"))?;

    Ok(())
}

/// import quotes from an attached JSON file, appending by default.
#[tracing::instrument(skip(ctx, file), fields(file = %file.filename))]
#[poise::command(prefix_command, rename = "import")]
pub async fn import_quotes(
    ctx: Context<'_>,
    file: Attachment,
    mode: Option<ImportMode>,
) -> Result<(), Error> {
    let mode = mode.unwrap_or_default();

    let bytes = file
        .download()
        .await
        .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when downloading attachment"))?;

    let Ok(raw) = String::from_utf8(bytes) else {
        return reply(ctx, format!("\"{}\" is not a text file.", file.filename)).await;
    };

    let result = ctx
        .data()
        .store
        .lock()
        .await
        .import_snapshot(&raw, mode)
        .await;

    match result {
        Ok(count) => reply(ctx, format!("quotes imported successfully! ({count} read)")).await,
        Err(QuoteError::Parse(e)) => {
            reply(ctx, format!("couldn't read quotes from \"{}\": {e}", file.filename)).await
        }
        Err(e) => Err(e.into()),
    }
}

/// pull quotes from the server now. the server's copy replaces ours.
#[tracing::instrument(skip(ctx))]
#[poise::command(prefix_command, rename = "sync")]
pub async fn sync_quotes(ctx: Context<'_>) -> Result<(), Error> {
    match sync_once(&ctx.data().store, ctx.data().server.as_ref()).await {
        Ok(count) => reply(ctx, format!("quotes synced with server! ({count} quote(s))")).await,
        Err(e) => reply(ctx, format!("couldn't sync with server: {e}")).await,
    }
}
