use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::TranslatorConfig;
use crate::error::{Result, TranslatorError};
use crate::form;
use crate::normalize::{ScriptNormalizer, ZhconvNormalizer};
use crate::render;
use crate::source::MappingSource;

/// One HTTP-like invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub method: String,
    pub body: String,
    pub is_base64_encoded: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    method: Option<String>,
    request_context: Option<RequestContext>,
    body: Option<String>,
    #[serde(default)]
    is_base64_encoded: bool,
}

#[derive(Debug, Deserialize)]
struct RequestContext {
    http: Option<HttpContext>,
}

#[derive(Debug, Deserialize)]
struct HttpContext {
    method: String,
}

impl Event {
    pub fn new(method: impl Into<String>, body: impl Into<String>) -> Self {
        Event {
            method: method.into(),
            body: body.into(),
            is_base64_encoded: false,
        }
    }

    pub fn base64(mut self, is_base64_encoded: bool) -> Self {
        self.is_base64_encoded = is_base64_encoded;
        self
    }

    /// Parse a function-URL style event; a top-level `method` wins over
    /// `requestContext.http.method`.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawEvent = serde_json::from_str(json)
            .map_err(|e| TranslatorError::BadRequest(format!("malformed event: {}", e)))?;
        let method = raw
            .method
            .or_else(|| raw.request_context.and_then(|c| c.http).map(|h| h.method))
            .ok_or_else(|| TranslatorError::BadRequest("event has no HTTP method".into()))?;
        Ok(Event {
            method,
            body: raw.body.unwrap_or_default(),
            is_base64_encoded: raw.is_base64_encoded,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl Response {
    pub fn html(body: String) -> Self {
        Response {
            status_code: 200,
            headers: BTreeMap::from([("Content-Type".to_string(), "text/html; charset=utf-8".to_string())]),
            body,
        }
    }

    pub fn text(status_code: u16, body: impl Into<String>) -> Self {
        Response {
            status_code,
            headers: BTreeMap::from([("Content-Type".to_string(), "text/plain; charset=utf-8".to_string())]),
            body: body.into(),
        }
    }
}

impl From<TranslatorError> for Response {
    fn from(err: TranslatorError) -> Self {
        let status = err.status_code().as_u16();
        match err {
            TranslatorError::MethodNotAllowed(_) => {
                let mut resp = Response::text(status, "Method Not Allowed");
                resp.headers.insert("Allow".to_string(), "GET, POST".to_string());
                resp
            }
            other => Response::text(status, other.to_string()),
        }
    }
}

/// Dispatches events: GET shows the form, POST converts, anything else is 405.
///
/// Stateless between calls; mapping tables are fetched from `source` on
/// every POST.
pub struct Handler<S, N = ZhconvNormalizer> {
    config: TranslatorConfig,
    source: S,
    normalizer: N,
}

impl<S: MappingSource, N: ScriptNormalizer> Handler<S, N> {
    pub fn new(config: TranslatorConfig, source: S, normalizer: N) -> Self {
        Handler {
            config,
            source,
            normalizer,
        }
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn handle(&self, event: Event) -> Response {
        info!("{} starts ...", self.config.app_name);
        info!("HTTP method: {}", event.method);
        debug!("Event: {:?}", event);

        match self.dispatch(event).await {
            Ok(resp) => resp,
            Err(err) => {
                warn!("request failed: {}", err);
                Response::from(err)
            }
        }
    }

    async fn dispatch(&self, event: Event) -> Result<Response> {
        match event.method.as_str() {
            "GET" => Ok(Response::html(render::form_page(
                &self.config.app_name,
                self.config.form_action(),
                &self.config.form_field,
            ))),
            "POST" => {
                let input = form::input_text(&event.body, event.is_base64_encoded, &self.config.form_field)?;
                debug!("Decoded input text: {}", input);
                let converted = self.convert_text(&input).await?;
                debug!("Replaced outcome: {}", converted);
                Ok(Response::html(render::outcome_page(
                    &self.config.app_name,
                    self.config.form_action(),
                    &render::paragraphs(&input),
                    &render::paragraphs(&converted),
                )))
            }
            other => Err(TranslatorError::MethodNotAllowed(other.to_string())),
        }
    }

    /// Run the full pipeline over `text` with freshly fetched tables.
    pub async fn convert_text(&self, text: &str) -> Result<String> {
        if text.is_empty() {
            return Ok(String::new());
        }
        let pipeline = self.config.pipeline();
        let mut names = Vec::with_capacity(2);
        if pipeline.standardize_symbols {
            names.push(self.config.symbol_table.as_str());
        }
        names.push(self.config.mapping_table.as_str());

        let mut tables = self.source.fetch_tables(&names).await?;
        let translations = tables.pop().ok_or_else(|| {
            TranslatorError::Retrieval(format!("table '{}' was not returned", self.config.mapping_table))
        })?;
        let symbols = tables.pop();
        Ok(pipeline.run(text, &self.normalizer, symbols.as_ref(), &translations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_url_event_is_parsed() {
        let event = Event::from_json(
            r#"{
                "requestContext": {"http": {"method": "POST", "path": "/"}},
                "body": "aW5wdXRfdGV4dD0=",
                "isBase64Encoded": true
            }"#,
        )
        .unwrap();
        assert_eq!(event, Event::new("POST", "aW5wdXRfdGV4dD0=").base64(true));
    }

    #[test]
    fn flat_event_is_parsed() {
        let event = Event::from_json(r#"{"method": "GET"}"#).unwrap();
        assert_eq!(event, Event::new("GET", ""));
    }

    #[test]
    fn event_without_method_is_rejected() {
        let err = Event::from_json(r#"{"body": ""}"#).unwrap_err();
        assert!(matches!(err, TranslatorError::BadRequest(_)));
    }

    #[test]
    fn method_not_allowed_response() {
        let resp = Response::from(TranslatorError::MethodNotAllowed("PUT".into()));
        assert_eq!(resp.status_code, 405);
        assert_eq!(resp.body, "Method Not Allowed");
        assert_eq!(resp.headers["Allow"], "GET, POST");
    }

    #[test]
    fn response_serializes_in_lambda_shape() {
        let json = serde_json::to_value(Response::text(405, "Method Not Allowed")).unwrap();
        assert_eq!(json["statusCode"], 405);
        assert_eq!(json["body"], "Method Not Allowed");
        assert_eq!(json["headers"]["Content-Type"], "text/plain; charset=utf-8");
    }
}
