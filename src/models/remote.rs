use serde::{Deserialize, Serialize};

use crate::{constants::SERVER_CATEGORY, models::quotes::Quote};

/// a post as listed by the mock quote server. only the title is kept; `userId`, `id` and `body`
/// are ignored.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RemotePost {
    pub title: String,
}

impl From<RemotePost> for Quote {
    fn from(post: RemotePost) -> Self {
        Quote::new(post.title, SERVER_CATEGORY)
    }
}

/// payload sent when submitting a new quote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRemotePost<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub user_id: i64,
}

impl<'a> From<&'a Quote> for NewRemotePost<'a> {
    fn from(quote: &'a Quote) -> Self {
        NewRemotePost {
            title: &quote.text,
            body: &quote.category,
            user_id: 1,
        }
    }
}
