//! Order placement endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use checkout::{Cart, CartLine, Customer};
use common::{Money, OrderId, ProductId};
use serde::{Deserialize, Serialize};
use store::{MAX_LINE_QUANTITY, Store};

use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub user: UserRequest,
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
    pub total_amount: f64,
    pub shipping_address: String,
    #[serde(default)]
    pub promo_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserRequest {
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub telegram: Option<String>,
    #[serde(default)]
    pub instagram: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: i64,
    pub size: String,
    pub quantity: i64,
    pub price: f64,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct OrderCreatedResponse {
    pub message: &'static str,
    pub order_id: OrderId,
}

// -- Validation --

/// Empty strings from form fields mean "not given".
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn is_email_shaped(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty() && !domain.is_empty() && !email.contains(char::is_whitespace)
        }
        _ => false,
    }
}

fn amount(value: f64, field: &str) -> Result<Money, String> {
    Money::from_major(value)
        .filter(|m| value.is_finite() && !m.is_negative())
        .ok_or_else(|| format!("{field} must be a non-negative amount"))
}

impl CreateOrderRequest {
    /// Checks the request and converts it into a cart. Prices are taken as sent.
    pub fn into_cart(self) -> Result<Cart, String> {
        let full_name = self.user.full_name.trim();
        if full_name.is_empty() {
            return Err("user.full_name is required".to_string());
        }
        let email = self.user.email.trim();
        if !is_email_shaped(email) {
            return Err("user.email must be a valid email address".to_string());
        }
        if self.items.is_empty() {
            return Err("items must contain at least one item".to_string());
        }
        let shipping_address = self.shipping_address.trim();
        if shipping_address.is_empty() {
            return Err("shipping_address is required".to_string());
        }

        let customer = Customer {
            full_name: full_name.to_string(),
            email: email.to_string(),
            phone: non_empty(self.user.phone),
            telegram: non_empty(self.user.telegram),
            instagram: non_empty(self.user.instagram),
            address: non_empty(self.user.address),
        };

        let mut cart = Cart::new(customer, shipping_address);
        for (i, item) in self.items.into_iter().enumerate() {
            if item.product_id <= 0 {
                return Err(format!("items[{i}].product_id must be positive"));
            }
            if item.size.trim().is_empty() {
                return Err(format!("items[{i}].size is required"));
            }
            let quantity = u32::try_from(item.quantity)
                .ok()
                .filter(|q| (1..=MAX_LINE_QUANTITY).contains(q))
                .ok_or_else(|| {
                    format!("items[{i}].quantity must be between 1 and {MAX_LINE_QUANTITY}")
                })?;
            let price = amount(item.price, &format!("items[{i}].price"))?;
            cart = cart.with_line(CartLine::new(
                ProductId::new(item.product_id),
                item.size.trim(),
                quantity,
                price,
            ));
        }

        if cart.line_total().is_none() {
            return Err("order amounts exceed the supported range".to_string());
        }

        let cart = cart.with_declared_total(amount(self.total_amount, "total_amount")?);
        Ok(match non_empty(self.promo_code) {
            Some(code) => cart.with_promo_code(code),
            None => cart,
        })
    }
}

// -- Handlers --

/// POST /api/orders: place an order for the cart in the request body.
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderCreatedResponse>), ApiError> {
    let Json(request) = payload.map_err(|e| invalid_request(e.body_text()))?;
    let cart = request.into_cart().map_err(invalid_request)?;

    let order = state.placer.place_order(cart).await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderCreatedResponse {
            message: "Order created successfully",
            order_id: order.id,
        }),
    ))
}

fn invalid_request(message: String) -> ApiError {
    metrics::counter!("orders_rejected_total", "reason" => "invalid_request").increment(1);
    tracing::debug!(%message, "order request rejected");
    ApiError::BadRequest(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(items: serde_json::Value) -> CreateOrderRequest {
        serde_json::from_value(serde_json::json!({
            "user": {
                "full_name": "Ann",
                "email": "ann@example.com",
                "phone": "",
                "telegram": "@ann"
            },
            "items": items,
            "total_amount": 3780.0,
            "shipping_address": "Kyiv, Nova Poshta #12",
            "promo_code": ""
        }))
        .unwrap()
    }

    #[test]
    fn valid_request_becomes_cart() {
        let cart = request(serde_json::json!([
            { "product_id": 1, "size": "M", "quantity": 2, "price": 1890.0 }
        ]))
        .into_cart()
        .unwrap();

        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].quantity, 2);
        assert_eq!(cart.lines[0].unit_price, Money::from_minor(189_000));
        assert_eq!(cart.declared_total, Money::from_minor(378_000));
        assert_eq!(cart.customer.phone, None);
        assert_eq!(cart.customer.telegram.as_deref(), Some("@ann"));
        assert_eq!(cart.promo_code, None);
    }

    #[test]
    fn empty_items_are_rejected() {
        let err = request(serde_json::json!([])).into_cart().unwrap_err();
        assert!(err.contains("at least one item"));
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let err = request(serde_json::json!([
            { "product_id": 1, "size": "M", "quantity": 0, "price": 1.0 }
        ]))
        .into_cart()
        .unwrap_err();
        assert!(err.contains("quantity"));
    }

    #[test]
    fn quantity_beyond_column_range_is_rejected() {
        let err = request(serde_json::json!([
            { "product_id": 1, "size": "M", "quantity": 3_000_000_000_i64, "price": 1.0 }
        ]))
        .into_cart()
        .unwrap_err();
        assert!(err.contains("quantity"));
    }

    #[test]
    fn oversized_price_times_quantity_is_rejected() {
        let err = request(serde_json::json!([
            { "product_id": 1, "size": "M", "quantity": 1000, "price": 1.0e16 }
        ]))
        .into_cart()
        .unwrap_err();
        assert!(err.contains("supported range"));
    }

    #[test]
    fn negative_price_is_rejected() {
        let err = request(serde_json::json!([
            { "product_id": 1, "size": "M", "quantity": 1, "price": -5.0 }
        ]))
        .into_cart()
        .unwrap_err();
        assert!(err.contains("price"));
    }

    #[test]
    fn unknown_size_passes_validation() {
        let cart = request(serde_json::json!([
            { "product_id": 1, "size": "XXXL", "quantity": 1, "price": 1.0 }
        ]))
        .into_cart()
        .unwrap();
        assert_eq!(cart.lines[0].size, "XXXL");
    }

    #[test]
    fn email_shape() {
        assert!(is_email_shaped("a@b.c"));
        assert!(!is_email_shaped("ab.c"));
        assert!(!is_email_shaped("@b.c"));
        assert!(!is_email_shaped("a@"));
        assert!(!is_email_shaped("a@b@c"));
        assert!(!is_email_shaped("a b@c"));
    }
}
