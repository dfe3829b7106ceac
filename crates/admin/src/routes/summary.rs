//! Order summary tab: per-product aggregates of pickup orders.

use askama::Template;
use axum::{
    Form,
    extract::{Multipart, Query, State},
    response::{Html, Redirect},
};
use order_desk_core::{Price, Tab, format_money};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::{ImageUpload, ProductSummary};
use crate::components::flash::{self, FieldError};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{RequireSession, ensure_tab};
use crate::state::AppState;

use super::render;
use super::views::{ImagePreview, ImageView, PriceDialog, ShellView, with_query};

const PAGE: &str = "/summary";

/// Product card view.
#[derive(Debug, Clone)]
pub struct ProductCardView {
    pub product_name: String,
    pub colors: Vec<(String, i64)>,
    pub total_quantity: i64,
    /// Formatted price, or `None` when not set.
    pub price: Option<String>,
    pub image: Option<ImageView>,
    pub price_href: String,
}

impl From<&ProductSummary> for ProductCardView {
    fn from(summary: &ProductSummary) -> Self {
        Self {
            product_name: summary.product_name.clone(),
            colors: summary
                .color_breakdown
                .iter()
                .map(|(color, qty)| (color.clone(), *qty))
                .collect(),
            total_quantity: summary.total_quantity,
            price: summary.price.map(format_money),
            image: summary
                .image_url
                .as_deref()
                .map(|url| ImageView::new(PAGE, url)),
            price_href: with_query(PAGE, "price_for", &summary.product_name),
        }
    }
}

/// Order summary page template.
#[derive(Template)]
#[template(path = "summary.html")]
pub struct SummaryTemplate {
    pub shell: ShellView,
    pub error: Option<String>,
    pub products: Vec<ProductCardView>,
    pub price_dialog: Option<PriceDialog>,
    pub preview: Option<ImagePreview>,
}

/// Dialog state carried in the query string.
#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    pub price_for: Option<String>,
    pub image: Option<String>,
}

/// Product form input.
#[derive(Debug, Deserialize)]
pub struct ProductInput {
    pub product_name: String,
}

/// Price form input.
#[derive(Debug, Deserialize)]
pub struct ProductPriceInput {
    pub product_name: String,
    pub price: String,
}

/// Order summary page handler.
#[instrument(skip(current, state, session))]
pub async fn index(
    RequireSession(current): RequireSession,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<SummaryQuery>,
) -> Result<Html<String>, AppError> {
    ensure_tab(&current, Tab::Summary)?;

    let flash_error = flash::take_error(&session).await;
    let field_error = flash::take_field_error(&session).await;

    let (summaries, error) = match state
        .backend()
        .for_subject(&current.subject_id)
        .order_summaries()
        .await
    {
        Ok(summaries) => (summaries, flash_error),
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch order summaries");
            (Vec::new(), Some(e.user_message().to_string()))
        }
    };

    let price_dialog = query.price_for.map(|product| {
        let current_price = summaries
            .iter()
            .find(|s| s.product_name == product)
            .and_then(|s| s.price);
        let (draft, error) = match field_error.filter(|f| f.target == product) {
            Some(f) => (f.draft, Some(f.message)),
            None => (current_price.map(|p| p.to_string()).unwrap_or_default(), None),
        };
        PriceDialog {
            title: format!("Set Price for {product}"),
            action: format!("{PAGE}/price"),
            product_name: Some(product),
            draft,
            error,
            close_href: PAGE.to_string(),
        }
    });

    let template = SummaryTemplate {
        shell: ShellView::new(&current, Tab::Summary),
        error,
        products: summaries.iter().map(ProductCardView::from).collect(),
        price_dialog,
        preview: ImagePreview::new(PAGE, query.image),
    };

    Ok(render(&template))
}

/// Move every pickup order of a product to preparing.
#[instrument(skip(current, state, session, input), fields(product = %input.product_name))]
pub async fn move_to_preparing(
    RequireSession(current): RequireSession,
    State(state): State<AppState>,
    session: Session,
    Form(input): Form<ProductInput>,
) -> Result<Redirect, AppError> {
    ensure_tab(&current, Tab::Summary)?;

    if let Err(e) = state
        .backend()
        .for_subject(&current.subject_id)
        .move_to_preparing(&input.product_name)
        .await
    {
        tracing::error!(error = %e, "Failed to move orders to preparing");
        flash::push_error(&session, e.user_message()).await;
    }

    Ok(Redirect::to(PAGE))
}

/// Set the price of a product.
///
/// An invalid draft re-opens the dialog with the draft and an inline error,
/// without calling the backend.
#[instrument(skip(current, state, session, input), fields(product = %input.product_name))]
pub async fn set_price(
    RequireSession(current): RequireSession,
    State(state): State<AppState>,
    session: Session,
    Form(input): Form<ProductPriceInput>,
) -> Result<Redirect, AppError> {
    ensure_tab(&current, Tab::Summary)?;

    let price = match Price::parse(&input.price) {
        Ok(price) => price,
        Err(e) => {
            tracing::debug!(draft = %input.price, "Rejected price draft");
            flash::push_field_error(
                &session,
                &FieldError {
                    target: input.product_name.clone(),
                    draft: input.price,
                    message: e.to_string(),
                },
            )
            .await;
            return Ok(Redirect::to(&with_query(
                PAGE,
                "price_for",
                &input.product_name,
            )));
        }
    };

    if let Err(e) = state
        .backend()
        .for_subject(&current.subject_id)
        .set_product_price(&input.product_name, price)
        .await
    {
        tracing::error!(error = %e, "Failed to update price");
        flash::push_error(&session, e.user_message()).await;
    }

    Ok(Redirect::to(PAGE))
}

/// Upload a product image (multipart: `product_name`, `image`).
#[instrument(skip_all)]
pub async fn upload_image(
    RequireSession(current): RequireSession,
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<Redirect, AppError> {
    ensure_tab(&current, Tab::Summary)?;

    let (product_name, image) = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(reason) => {
            tracing::warn!(reason = %reason, "Rejected image upload");
            flash::push_error(&session, &format!("Failed to upload image: {reason}")).await;
            return Ok(Redirect::to(PAGE));
        }
    };

    if let Err(e) = state
        .backend()
        .for_subject(&current.subject_id)
        .upload_product_image(&product_name, image)
        .await
    {
        tracing::error!(error = %e, product = %product_name, "Failed to upload image");
        flash::push_error(&session, &format!("Failed to upload image: {}", e.detail())).await;
    }

    Ok(Redirect::to(PAGE))
}

/// Pull the product name and the image file out of the form.
async fn read_upload(mut multipart: Multipart) -> Result<(String, ImageUpload), String> {
    let mut product_name = None;
    let mut image = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| e.body_text())? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "product_name" => {
                product_name = Some(field.text().await.map_err(|e| e.body_text())?);
            }
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(|e| e.body_text())?;
                image = Some(ImageUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    let product_name = product_name
        .filter(|p| !p.is_empty())
        .ok_or_else(|| "No product selected".to_string())?;
    let image = image
        .filter(|i| !i.bytes.is_empty() && !i.file_name.is_empty())
        .ok_or_else(|| "No file selected".to_string())?;

    Ok((product_name, image))
}
