use std::time::Duration;

use reqwest::{header as Header, Client, ClientBuilder, IntoUrl, RequestBuilder};

use crate::error::{Result, TranslatorError};

pub enum Method {
    GET,
    POST,
}

pub fn get_default_headers() -> Header::HeaderMap {
    let mut headers = Header::HeaderMap::new();
    headers.insert(
        Header::USER_AGENT,
        Header::HeaderValue::from_static(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        )),
    );
    headers.insert(
        Header::ACCEPT,
        Header::HeaderValue::from_static("application/json"),
    );
    headers
}

/// Outbound client shared by the token exchange and the sheet reader.
#[derive(Debug, Clone)]
pub struct ReqClient {
    client: Client,
}

impl ReqClient {
    pub fn new(custom_client: Option<&dyn Fn(ClientBuilder) -> ClientBuilder>) -> Result<Self> {
        let cli_builder = Client::builder()
            .default_headers(get_default_headers())
            .timeout(Duration::from_secs(30));

        let cli_builder = match custom_client {
            Some(f) => f(cli_builder),
            None => cli_builder,
        };

        let client = cli_builder.build().map_err(|e| {
            TranslatorError::Configuration(format!("cannot build HTTP client: {}", e))
        })?;
        Ok(ReqClient { client })
    }

    pub fn prepare<U: IntoUrl>(&self, method: Method, url: U) -> RequestBuilder {
        match method {
            Method::GET => self.client.get(url),
            Method::POST => self.client.post(url),
        }
    }
}
