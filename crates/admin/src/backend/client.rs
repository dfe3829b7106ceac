//! HTTP client for the orders backend.

use std::sync::Arc;

use order_desk_core::{OrderId, Price, Role, SubjectId};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use super::types::{
    CallbackResponse, CustomerOrderGroup, ExternalUser, LoginUrl, ProductSummary, StaffUser,
};
use super::BackendError;

/// Header that makes tunnelling proxies skip their browser interstitial.
const SKIP_BROWSER_WARNING: &str = "ngrok-skip-browser-warning";

/// Header identifying the signed-in user to the backend.
const USER_ID: &str = "User-Id";

/// Orders backend REST client.
///
/// Cheap to clone. No request timeout is configured: a slow backend keeps the
/// page loading until the browser gives up, which drops the request.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    /// Normalized base URL, no trailing slash.
    base_url: String,
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

/// An image file to attach to a product.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Serialize)]
struct PriceBody {
    price: Price,
}

#[derive(Serialize)]
struct NotesBody<'a> {
    notes: &'a str,
}

#[derive(Serialize)]
struct ProductBody<'a> {
    product_name: &'a str,
}

#[derive(Serialize)]
struct CustomerBody<'a> {
    customer_name: Option<&'a str>,
}

/// Error body the backend sends with non-2xx statuses.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<serde_json::Value>,
}

impl BackendClient {
    /// Create a client for the backend at `base_url`.
    ///
    /// `base_url` is used as given; normalize it with
    /// [`crate::config::normalize_api_url`] first.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Client` if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(SKIP_BROWSER_WARNING),
            HeaderValue::from_static("true"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| BackendError::Client(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: base_url.into().trim_end_matches('/').to_string(),
            }),
        })
    }

    /// Calls made on behalf of `subject`.
    #[must_use]
    pub const fn for_subject<'a>(&'a self, subject: &'a SubjectId) -> SubjectClient<'a> {
        SubjectClient {
            backend: self,
            subject,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    fn url_with_query(&self, path: &str, pairs: &[(&str, &str)]) -> Result<Url, BackendError> {
        let mut url =
            Url::parse(&self.url(path)).map_err(|e| BackendError::Client(e.to_string()))?;
        url.query_pairs_mut().extend_pairs(pairs);
        Ok(url)
    }

    /// Check that the backend answers at all. Any HTTP status counts.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Transport` if no response arrives.
    pub async fn ping(&self) -> Result<(), BackendError> {
        self.inner
            .client
            .get(self.url("/"))
            .send()
            .await
            .map(drop)
            .map_err(|e| BackendError::transport("Backend unreachable", &e))
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Fetch the provider authorization URL.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the request fails or the body has no `auth_url`.
    #[instrument(skip(self))]
    pub async fn login_url(&self) -> Result<String, BackendError> {
        const CONTEXT: &str = "Failed to start login";

        let request = self.inner.client.get(self.url("/api/login"));
        let body: LoginUrl = send_json(CONTEXT, request).await?;
        Ok(body.auth_url)
    }

    /// Exchange a one-time authorization code for a session.
    ///
    /// The body is decoded regardless of status: the backend reports a
    /// rejected code as `{"error": ...}` with a 4xx status.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the request fails or the body is not JSON.
    #[instrument(skip(self, code, role), fields(role = %role))]
    pub async fn exchange_code(
        &self,
        code: &str,
        role: Role,
    ) -> Result<CallbackResponse, BackendError> {
        const CONTEXT: &str = "Failed to complete login. Please try again.";

        let url = self.url_with_query("/api/callback", &[("code", code), ("role", role.as_str())])?;
        let response = self
            .inner
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BackendError::transport(CONTEXT, &e))?;

        let status = response.status();
        let body = response
            .json::<CallbackResponse>()
            .await
            .map_err(|e| BackendError::decode(CONTEXT, &e))?;

        tracing::debug!(
            status = status.as_u16(),
            has_token = body.access_token.is_some(),
            "Code exchange answered"
        );
        Ok(body)
    }
}

/// Backend calls carrying the `User-Id` header.
///
/// One method per endpoint. Mutations return `()`; their response bodies are
/// ignored because every page re-fetches after a change.
#[derive(Debug, Clone, Copy)]
pub struct SubjectClient<'a> {
    backend: &'a BackendClient,
    subject: &'a SubjectId,
}

impl SubjectClient<'_> {
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.backend
            .inner
            .client
            .request(method, self.backend.url(path))
            .header(USER_ID, self.subject.as_str())
    }

    // =========================================================================
    // Order summary
    // =========================================================================

    /// Product summaries of orders at the pickup stage.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on transport failure, error status, or bad body.
    #[instrument(skip(self), fields(subject = %self.subject))]
    pub async fn order_summaries(&self) -> Result<Vec<ProductSummary>, BackendError> {
        send_json(
            "Failed to fetch order summaries",
            self.request(Method::GET, "/api/order-summaries"),
        )
        .await
    }

    /// Set the unit price of every pickup order of a product.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on transport failure or error status.
    #[instrument(
        skip(self, product, price),
        fields(subject = %self.subject, product = %product, price = %price)
    )]
    pub async fn set_product_price(&self, product: &str, price: Price) -> Result<(), BackendError> {
        let path = format!("/api/order-summaries/{}/price", urlencoding::encode(product));
        send(
            "Failed to update price",
            self.request(Method::PUT, &path).json(&PriceBody { price }),
        )
        .await
    }

    /// Attach an image to a product.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on transport failure or error status.
    #[instrument(
        skip(self, product, image),
        fields(subject = %self.subject, product = %product, file = %image.file_name, bytes = image.bytes.len())
    )]
    pub async fn upload_product_image(
        &self,
        product: &str,
        image: ImageUpload,
    ) -> Result<(), BackendError> {
        const CONTEXT: &str = "Failed to upload image";

        let part = reqwest::multipart::Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.content_type)
            .map_err(|e| BackendError::Client(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("image", part);

        let path = format!("/api/order-summaries/{}/image", urlencoding::encode(product));
        send(CONTEXT, self.request(Method::PUT, &path).multipart(form)).await
    }

    /// Move every pickup order of a product to preparing.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on transport failure or error status.
    #[instrument(skip(self, product), fields(subject = %self.subject, product = %product))]
    pub async fn move_to_preparing(&self, product: &str) -> Result<(), BackendError> {
        send(
            "Failed to move orders to preparing",
            self.request(Method::POST, "/api/orders/move-to-preparing")
                .json(&ProductBody {
                    product_name: product,
                }),
        )
        .await
    }

    // =========================================================================
    // Preparing
    // =========================================================================

    /// Orders being prepared, grouped by customer.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on transport failure, error status, or bad body.
    #[instrument(skip(self), fields(subject = %self.subject))]
    pub async fn preparing_orders(&self) -> Result<Vec<CustomerOrderGroup>, BackendError> {
        send_json(
            "Failed to fetch preparing orders",
            self.request(Method::GET, "/api/orders/preparing"),
        )
        .await
    }

    /// Mark an order as prepared, moving it to billing.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on transport failure or error status.
    #[instrument(skip(self, order), fields(subject = %self.subject, order_id = %order))]
    pub async fn move_to_billing(&self, order: &OrderId) -> Result<(), BackendError> {
        let path = format!("/api/orders/{}/move-to-billing", urlencoding::encode(order.as_str()));
        send(
            "Failed to move order to billing",
            self.request(Method::POST, &path),
        )
        .await
    }

    /// Replace an order's preparation notes.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on transport failure or error status.
    #[instrument(skip(self, order, notes), fields(subject = %self.subject, order_id = %order))]
    pub async fn set_preparation_notes(
        &self,
        order: &OrderId,
        notes: &str,
    ) -> Result<(), BackendError> {
        let path = format!("/api/orders/{}/preparation-notes", urlencoding::encode(order.as_str()));
        send(
            "Failed to update notes",
            self.request(Method::PUT, &path).json(&NotesBody { notes }),
        )
        .await
    }

    // =========================================================================
    // Billing and history
    // =========================================================================

    /// Prepared orders awaiting payment, grouped by customer.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on transport failure, error status, or bad body.
    #[instrument(skip(self), fields(subject = %self.subject))]
    pub async fn billing_orders(&self) -> Result<Vec<CustomerOrderGroup>, BackendError> {
        send_json(
            "Failed to fetch billing orders",
            self.request(Method::GET, "/api/orders/billing"),
        )
        .await
    }

    /// Mark every billing order of a customer as paid.
    ///
    /// `None` targets the orders without a customer name.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on transport failure or error status.
    #[instrument(skip(self, customer), fields(subject = %self.subject, customer = ?customer))]
    pub async fn mark_all_paid(&self, customer: Option<&str>) -> Result<(), BackendError> {
        send(
            "Failed to mark orders as paid",
            self.request(Method::POST, "/api/orders/mark-all-paid")
                .json(&CustomerBody {
                    customer_name: customer,
                }),
        )
        .await
    }

    /// Replace an order's billing notes.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on transport failure or error status.
    #[instrument(skip(self, order, notes), fields(subject = %self.subject, order_id = %order))]
    pub async fn set_billing_notes(&self, order: &OrderId, notes: &str) -> Result<(), BackendError> {
        let path = format!("/api/orders/{}/billing-notes", urlencoding::encode(order.as_str()));
        send(
            "Failed to update notes",
            self.request(Method::PUT, &path).json(&NotesBody { notes }),
        )
        .await
    }

    /// Set the unit price of a single order.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on transport failure or error status.
    #[instrument(skip(self, order, price), fields(subject = %self.subject, order_id = %order, price = %price))]
    pub async fn update_order_price(&self, order: &OrderId, price: Price) -> Result<(), BackendError> {
        let path = format!("/api/orders/{}/update-price", urlencoding::encode(order.as_str()));
        send(
            "Failed to update price",
            self.request(Method::PUT, &path).json(&PriceBody { price }),
        )
        .await
    }

    /// Completed orders, grouped by customer.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on transport failure, error status, or bad body.
    #[instrument(skip(self), fields(subject = %self.subject))]
    pub async fn history_orders(&self) -> Result<Vec<CustomerOrderGroup>, BackendError> {
        send_json(
            "Failed to fetch history orders",
            self.request(Method::GET, "/api/orders/history"),
        )
        .await
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Dashboard accounts.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on transport failure, error status, or bad body.
    #[instrument(skip(self), fields(subject = %self.subject))]
    pub async fn staff_users(&self) -> Result<Vec<StaffUser>, BackendError> {
        send_json("Failed to fetch users", self.request(Method::GET, "/api/users")).await
    }

    /// Search provider accounts by name.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on transport failure, error status, or bad body.
    #[instrument(skip(self), fields(subject = %self.subject))]
    pub async fn search_external_users(&self, query: &str) -> Result<Vec<ExternalUser>, BackendError> {
        const CONTEXT: &str = "Failed to search Facebook users";

        let url = self
            .backend
            .url_with_query("/api/users/facebook-search", &[("q", query)])?;
        let request = self
            .backend
            .inner
            .client
            .get(url)
            .header(USER_ID, self.subject.as_str());
        send_json(CONTEXT, request).await
    }

    /// Grant dashboard access to a provider account.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on transport failure or error status.
    #[instrument(skip(self, user), fields(subject = %self.subject, user_id = %user.facebook_id))]
    pub async fn import_external_user(&self, user: &ExternalUser) -> Result<(), BackendError> {
        send(
            "Failed to add staff",
            self.request(Method::POST, "/api/users/import-facebook")
                .json(user),
        )
        .await
    }

    /// Remove a dashboard account.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on transport failure or error status.
    #[instrument(skip(self, user), fields(subject = %self.subject, user_id = %user))]
    pub async fn delete_staff_user(&self, user: &SubjectId) -> Result<(), BackendError> {
        let path = format!("/api/users/{}", urlencoding::encode(user.as_str()));
        send("Failed to delete user", self.request(Method::DELETE, &path)).await
    }
}

// =============================================================================
// Response handling
// =============================================================================

/// Send a request and require a 2xx status.
async fn send(context: &'static str, request: RequestBuilder) -> Result<(), BackendError> {
    let response = request
        .send()
        .await
        .map_err(|e| BackendError::transport(context, &e))?;
    check_status(context, response).await.map(drop)
}

/// Send a request, require a 2xx status, and decode the JSON body.
async fn send_json<T: DeserializeOwned>(
    context: &'static str,
    request: RequestBuilder,
) -> Result<T, BackendError> {
    let response = request
        .send()
        .await
        .map_err(|e| BackendError::transport(context, &e))?;
    check_status(context, response)
        .await?
        .json::<T>()
        .await
        .map_err(|e| BackendError::decode(context, &e))
}

async fn check_status(context: &'static str, response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let detail = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.error)
        .map(|error| match error {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
        .unwrap_or_default();

    tracing::warn!(status = status.as_u16(), detail = %detail, "{context}");
    Err(BackendError::Status {
        context,
        status: status.as_u16(),
        detail,
    })
}
