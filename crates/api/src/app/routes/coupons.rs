use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    routing::post,
};
use chrono::Utc;

use storefront_core::CouponId;
use storefront_coupons::Coupon;
use storefront_pricing::{DiscountKind, DiscountRule};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::UserContext;

pub fn router() -> Router {
    Router::new()
        .route("/coupons", post(create_coupon).get(list_coupons))
        .route("/coupons/redeem", post(redeem_coupon))
        .route("/coupons/:id/deactivate", post(deactivate_coupon))
}

pub async fn redeem_coupon(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Json(body): Json<dto::RedeemCouponRequest>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&user, "coupons.redeem") {
        return resp;
    }

    match services
        .redemption
        .redeem(user.user_id(), &body.code, body.order_amount, Utc::now())
        .await
    {
        Ok(quote) => errors::envelope_ok(StatusCode::OK, "coupon redeemed", &quote),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_coupon(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Json(body): Json<dto::CreateCouponRequest>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&user, "coupons.manage") {
        return resp;
    }

    let kind = match body.discount_kind.as_str() {
        "percentage" => DiscountKind::Percentage,
        "fixed" => DiscountKind::Fixed,
        _ => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_input",
                "discount_kind must be 'percentage' or 'fixed'",
            );
        }
    };
    let rule = DiscountRule {
        kind,
        value: body.discount_value,
        max_discount: body.max_discount,
    };

    let coupon = match Coupon::new(
        body.code,
        body.title,
        rule,
        body.min_purchase,
        body.valid_from,
        body.valid_to,
        body.max_uses,
    ) {
        Ok(c) => c,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.coupons.insert(&coupon).await {
        Ok(()) => errors::envelope_ok(StatusCode::CREATED, "coupon created", &coupon),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_coupons(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&user, "coupons.manage") {
        return resp;
    }

    match services.coupons.list().await {
        Ok(coupons) => errors::envelope_ok(StatusCode::OK, "coupons listed", &coupons),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn deactivate_coupon(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&user, "coupons.manage") {
        return resp;
    }
    let id: CouponId = match errors::parse_id(&id, "coupon") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let mut coupon = match services.coupons.get(id).await {
        Ok(Some(c)) => c,
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "coupon not found");
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    coupon.is_active = false;
    match services.coupons.update(&coupon).await {
        Ok(()) => errors::envelope_ok(StatusCode::OK, "coupon deactivated", &coupon),
        Err(e) => errors::store_error_to_response(e),
    }
}
