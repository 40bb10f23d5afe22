use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};

use crate::{
    error::QuoteError,
    models::{
        quotes::Quote,
        remote::{NewRemotePost, RemotePost},
    },
};

/// somewhere quotes can be pulled from and pushed to.
#[async_trait]
pub trait QuoteSource: Send + Sync + 'static {
    async fn fetch_quotes(&self) -> Result<Vec<Quote>, QuoteError>;
    async fn post_quote(&self, quote: &Quote) -> Result<(), QuoteError>;
}

/// client for the mock quote server, which lists and accepts `/posts`.
#[derive(Clone)]
pub struct HttpQuoteServer {
    client: reqwest::Client,
    base_url: String,
}

impl HttpQuoteServer {
    pub fn new(base_url: &str) -> Result<Self, QuoteError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("quotebot/", env!("CARGO_PKG_VERSION"))),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn posts_url(&self) -> String {
        format!("{}/posts", self.base_url)
    }
}

#[async_trait]
impl QuoteSource for HttpQuoteServer {
    #[tracing::instrument(skip_all)]
    async fn fetch_quotes(&self) -> Result<Vec<Quote>, QuoteError> {
        let resp = self
            .client
            .get(self.posts_url())
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .inspect_err(
                |e| tracing::error!(err = ?e, "an error occurred when fetching quotes from server"),
            )?;

        let posts: Vec<RemotePost> = resp.json().await.inspect_err(
            |e| tracing::error!(err = ?e, "an error occurred when decoding server quotes"),
        )?;

        Ok(posts.into_iter().map(Quote::from).collect())
    }

    #[tracing::instrument(skip_all, fields(category = %quote.category))]
    async fn post_quote(&self, quote: &Quote) -> Result<(), QuoteError> {
        self.client
            .post(self.posts_url())
            .json(&NewRemotePost::from(quote))
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .inspect_err(
                |e| tracing::error!(err = ?e, "an error occurred when posting quote to server"),
            )?;

        tracing::info!("posted quote to server");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        task::JoinHandle,
    };

    use super::*;

    /// answers exactly one request with `status` and `body`, handing back the raw request.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];

            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);

                let Some(head_end) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
                    continue;
                };

                let head = String::from_utf8_lossy(&request[..head_end]).to_lowercase();
                let content_length = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|len| len.trim().parse::<usize>().ok())
                    .unwrap_or(0);

                if request.len() >= head_end + 4 + content_length {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;

            String::from_utf8_lossy(&request).into_owned()
        });

        (format!("http://{addr}"), handle)
    }

    fn server(base_url: &str) -> HttpQuoteServer {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        HttpQuoteServer::with_client(client, base_url)
    }

    fn request_body(request: &str) -> serde_json::Value {
        let (_, body) = request.split_once("\r\n\r\n").unwrap();
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn base_url_trailing_slash_is_ignored() {
        let server = HttpQuoteServer::new("https://example.com/api/").unwrap();

        assert_eq!(server.posts_url(), "https://example.com/api/posts");
    }

    #[tokio::test]
    async fn fetch_maps_posts_to_server_quotes() {
        let (url, handle) = serve_once(
            "200 OK",
            r#"[{"userId": 1, "id": 1, "title": "first", "body": "x"}, {"userId": 1, "id": 2, "title": "second", "body": "y"}]"#,
        )
        .await;

        let quotes = server(&url).fetch_quotes().await.unwrap();

        assert_eq!(
            quotes,
            vec![Quote::new("first", "Server"), Quote::new("second", "Server")]
        );
        assert!(handle.await.unwrap().starts_with("GET /posts "));
    }

    #[tokio::test]
    async fn fetch_turns_error_status_into_network_error() {
        let (url, handle) = serve_once("500 Internal Server Error", "{}").await;

        let result = server(&url).fetch_quotes().await;

        assert!(matches!(result, Err(QuoteError::Network(_))));
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn post_sends_title_body_and_user_id() {
        let (url, handle) = serve_once("201 Created", r#"{"id": 101}"#).await;

        server(&url)
            .post_quote(&Quote::new("stay hungry", "Motivation"))
            .await
            .unwrap();

        let request = handle.await.unwrap();
        assert!(request.starts_with("POST /posts "));
        assert_eq!(
            request_body(&request),
            serde_json::json!({"title": "stay hungry", "body": "Motivation", "userId": 1})
        );
    }

    #[tokio::test]
    async fn post_turns_error_status_into_network_error() {
        let (url, handle) = serve_once("503 Service Unavailable", "{}").await;

        let result = server(&url).post_quote(&Quote::new("a", "b")).await;

        assert!(matches!(result, Err(QuoteError::Network(_))));
        handle.await.unwrap();
    }
}
