use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::model::CreditTransaction;
use crate::server::error::{require_user, ApiError, ApiResult};
use crate::server::handlers::UserQuery;
use crate::server::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditsResponse {
    pub user_id: String,
    pub balance: f64,
    pub transactions: Vec<CreditTransaction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemRequest {
    pub user_id: Option<String>,
    pub code: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemResponse {
    pub balance: f64,
    pub transaction: CreditTransaction,
}

#[tracing::instrument(skip(state))]
pub async fn credits_handler(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<CreditsResponse>> {
    let user_id = require_user(query.user_id.as_deref())?;
    let ledger = &state.context.ledger;
    let balance = ledger.balance(&user_id).await?;
    let transactions = ledger.transactions(&user_id).await?;
    Ok(Json(CreditsResponse {
        user_id,
        balance,
        transactions,
    }))
}

#[tracing::instrument(skip(state, request))]
pub async fn redeem_handler(
    State(state): State<AppState>,
    Json(request): Json<RedeemRequest>,
) -> ApiResult<Json<RedeemResponse>> {
    let user_id = require_user(request.user_id.as_deref())?;
    let code = request
        .code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::bad_request("Voucher code is required"))?;

    let transaction = state.context.ledger.redeem_voucher(&user_id, code).await?;
    tracing::info!(user_id = %user_id, amount = transaction.amount, "Voucher redeemed");
    Ok(Json(RedeemResponse {
        balance: transaction.balance_after,
        transaction,
    }))
}
