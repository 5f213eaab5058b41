// API client module: a small blocking HTTP client bound to the inventory
// service endpoints. One method per endpoint, one struct per resource.
// The client also carries the in-memory session token.

use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use reqwest::blocking::Client;
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Blocking client for the inventory API. Holds the reqwest client, the
/// base URL of the service and the bearer token once logged in.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

/// A product record as the server returns it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub quantity: i64,
}

/// Payload for creating a product. The server assigns the id.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    pub quantity: i64,
}

/// Login request payload.
#[derive(Serialize)]
pub struct AuthRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
struct AuthResponse {
    token: String,
}

#[derive(Serialize)]
struct QuantityChange {
    quantity: i64,
}

#[derive(Serialize)]
struct PriceChange {
    price: f64,
}

#[derive(Deserialize)]
struct MessageBody {
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct InventoryValueBody {
    inventory_value: f64,
}

/// Status and body of a completed exchange, before interpretation.
struct RawResponse {
    status: StatusCode,
    body: String,
}

impl RawResponse {
    /// Hand back the body if the status is one of `accepted`, otherwise
    /// turn the body into the matching server error.
    fn accept(self, accepted: &[StatusCode]) -> ApiResult<String> {
        if accepted.contains(&self.status) {
            Ok(self.body)
        } else {
            Err(ApiError::from_response(self.status, &self.body))
        }
    }
}

const PRODUCT_STATUSES: &[StatusCode] = &[StatusCode::OK, StatusCode::CREATED];
const OK_ONLY: &[StatusCode] = &[StatusCode::OK];

fn segment_count(url: &Url) -> usize {
    url.path_segments().map(|s| s.count()).unwrap_or(0)
}

fn decode<T: DeserializeOwned>(what: &'static str, body: &str) -> ApiResult<T> {
    serde_json::from_str(body).map_err(|source| ApiError::Decode { what, source })
}

/// Extract `message` from a body; `None` if absent, empty or not JSON.
fn message_of(body: &str) -> Option<String> {
    serde_json::from_str::<MessageBody>(body)
        .ok()
        .map(|b| b.message)
        .filter(|m| !m.is_empty())
}

impl ApiClient {
    /// Create a client for `base_url` with the given request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let base_url = Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(ApiClient {
            client,
            base_url,
            token: None,
        })
    }

    pub fn from_config(config: &Config) -> ApiResult<Self> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Store a token for subsequent authenticated requests.
    pub fn set_token(&mut self, token: &str) {
        self.token = Some(token.to_string());
    }

    /// Returns whether a token is present in the client.
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Drop the session token. Returns whether one was held.
    pub fn logout(&mut self) -> bool {
        let had_token = self.token.take().is_some();
        if had_token {
            info!("session token cleared");
        }
        had_token
    }

    fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `/api/products/{id}[/{action}]`, with the id as a single encoded segment.
    ///
    /// The url crate drops dot segments instead of encoding them, so an id
    /// that does not survive as exactly one segment is refused.
    fn product_endpoint(&self, id: &str, action: Option<&str>) -> ApiResult<Url> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ApiError::EmptyProductId);
        }
        let mut segments = vec!["api", "products", id];
        segments.extend(action);
        let url = self.endpoint(&segments)?;

        let collection = self.endpoint(&["api", "products"])?;
        let expected = segment_count(&collection) + segments.len() - 2;
        if segment_count(&url) != expected {
            return Err(ApiError::UnroutableProductId(id.to_string()));
        }
        Ok(url)
    }

    fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        payload: Option<&B>,
    ) -> ApiResult<RawResponse> {
        let mut req = self.client.request(method.clone(), url.clone());
        if let Some(payload) = payload {
            req = req.json(payload);
        }
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        debug!(%method, %url, "sending request");
        let res = req.send().map_err(|e| {
            debug!(%method, %url, error = %e, "request failed");
            e
        })?;
        let status = res.status();
        let body = res.text()?;
        debug!(%method, %url, status = status.as_u16(), "request completed");
        Ok(RawResponse { status, body })
    }

    fn send_empty(&self, method: Method, url: Url) -> ApiResult<RawResponse> {
        self.send::<()>(method, url, None)
    }

    /// POST /login and keep the returned token on success.
    pub fn login(&mut self, req: &AuthRequest) -> ApiResult<()> {
        let url = self.endpoint(&["login"])?;
        let body = self.send(Method::POST, url, Some(req))?.accept(OK_ONLY)?;
        let resp: AuthResponse = decode("login", &body)?;
        if resp.token.is_empty() {
            return Err(ApiError::Decode {
                what: "login",
                source: <serde_json::Error as serde::de::Error>::custom("empty token"),
            });
        }
        self.token = Some(resp.token);
        info!("logged in");
        Ok(())
    }

    pub fn add_product(&self, product: &NewProduct) -> ApiResult<Product> {
        let url = self.endpoint(&["api", "products"])?;
        let body = self
            .send(Method::POST, url, Some(product))?
            .accept(PRODUCT_STATUSES)?;
        decode("product", &body)
    }

    pub fn get_product(&self, id: &str) -> ApiResult<Product> {
        let url = self.product_endpoint(id, None)?;
        let body = self.send_empty(Method::GET, url)?.accept(PRODUCT_STATUSES)?;
        decode("product", &body)
    }

    pub fn list_products(&self) -> ApiResult<Vec<Product>> {
        let url = self.endpoint(&["api", "products"])?;
        let body = self.send_empty(Method::GET, url)?.accept(OK_ONLY)?;
        decode("product list", &body)
    }

    pub fn sell_product(&self, id: &str, quantity: i64) -> ApiResult<Product> {
        self.change_quantity(id, "sell", quantity)
    }

    pub fn restock_product(&self, id: &str, quantity: i64) -> ApiResult<Product> {
        self.change_quantity(id, "restock", quantity)
    }

    fn change_quantity(&self, id: &str, action: &str, quantity: i64) -> ApiResult<Product> {
        let url = self.product_endpoint(id, Some(action))?;
        let body = self
            .send(Method::PATCH, url, Some(&QuantityChange { quantity }))?
            .accept(PRODUCT_STATUSES)?;
        decode("product", &body)
    }

    /// PATCH the price. Returns the server's message, if it sent one.
    pub fn update_price(&self, id: &str, price: f64) -> ApiResult<Option<String>> {
        let url = self.product_endpoint(id, Some("price"))?;
        let body = self
            .send(Method::PATCH, url, Some(&PriceChange { price }))?
            .accept(OK_ONLY)?;
        Ok(message_of(&body))
    }

    /// DELETE the product. Returns the server's message, if it sent one.
    pub fn delete_product(&self, id: &str) -> ApiResult<Option<String>> {
        let url = self.product_endpoint(id, None)?;
        let body = self.send_empty(Method::DELETE, url)?.accept(OK_ONLY)?;
        Ok(message_of(&body))
    }

    /// Total value of all stock, as computed by the server.
    pub fn inventory_value(&self) -> ApiResult<f64> {
        let url = self.endpoint(&["api", "inventory", "value"])?;
        let body = self.send_empty(Method::GET, url)?.accept(OK_ONLY)?;
        let value: InventoryValueBody = decode("inventory value", &body)?;
        Ok(value.inventory_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn endpoint_joins_under_base_path() {
        let api = client("http://localhost:8080");
        assert_eq!(
            api.endpoint(&["api", "products"]).unwrap().as_str(),
            "http://localhost:8080/api/products"
        );

        let prefixed = client("http://example.com/inventory/");
        assert_eq!(
            prefixed.endpoint(&["login"]).unwrap().as_str(),
            "http://example.com/inventory/login"
        );
    }

    #[test]
    fn product_id_is_one_encoded_segment() {
        let api = client("http://localhost:8080");
        let url = api.product_endpoint("a/b c", Some("sell")).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/products/a%2Fb%20c/sell");
    }

    #[test]
    fn blank_product_id_is_rejected() {
        let api = client("http://localhost:8080");
        assert!(matches!(
            api.product_endpoint("   ", None),
            Err(ApiError::EmptyProductId)
        ));
    }

    #[test]
    fn dot_segment_ids_are_refused() {
        let api = client("http://localhost:8080");
        for id in [".", "..", " .. "] {
            assert!(
                matches!(api.product_endpoint(id, None), Err(ApiError::UnroutableProductId(_))),
                "{id:?} was accepted"
            );
            assert!(matches!(
                api.product_endpoint(id, Some("sell")),
                Err(ApiError::UnroutableProductId(_))
            ));
        }
        // Dots inside an id are ordinary characters.
        assert_eq!(
            api.product_endpoint("v1.2", Some("price")).unwrap().as_str(),
            "http://localhost:8080/api/products/v1.2/price"
        );
    }

    #[test]
    fn prefixed_base_keeps_id_checks() {
        let api = client("http://example.com/inventory/");
        assert_eq!(
            api.product_endpoint("p-1", None).unwrap().as_str(),
            "http://example.com/inventory/api/products/p-1"
        );
        assert!(api.product_endpoint("..", None).is_err());
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failed_request_still_logs_method_and_url() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        let api = client(&base);

        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .finish();
        let result = tracing::subscriber::with_default(subscriber, || api.list_products());
        assert!(matches!(result, Err(ApiError::Transport(_))));

        let text = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(text.contains("sending request"), "{text}");
        assert!(text.contains("request failed"), "{text}");
        assert!(text.contains("GET"), "{text}");
        assert!(text.contains(&format!("{base}/api/products")), "{text}");
    }

    #[test]
    fn non_base_url_is_rejected() {
        assert!(matches!(
            ApiClient::new("mailto:ops@example.com", Duration::from_secs(1)),
            Err(ApiError::InvalidUrl(_))
        ));
        assert!(matches!(
            ApiClient::new("not a url", Duration::from_secs(1)),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn message_requires_non_empty_json_field() {
        assert_eq!(message_of(r#"{"message":"gone"}"#), Some("gone".to_string()));
        assert_eq!(message_of(r#"{"message":""}"#), None);
        assert_eq!(message_of("deleted"), None);
    }

    #[test]
    fn logout_reports_whether_a_session_existed() {
        let mut api = client("http://localhost:8080");
        assert!(!api.logout());
        api.set_token("abc");
        assert!(api.has_token());
        assert!(api.logout());
        assert!(!api.has_token());
    }
}
