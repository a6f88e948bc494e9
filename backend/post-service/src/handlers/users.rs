/// Account and relation mirroring endpoints
use actix_web::{web, HttpResponse};

use super::AppState;
use crate::domain::{Account, Relation};
use crate::error::ServiceResult;

pub async fn create_account(
    state: web::Data<AppState>,
    account: web::Json<Account>,
) -> ServiceResult<HttpResponse> {
    let stored = state.accounts.create_account(account.into_inner()).await?;
    Ok(HttpResponse::Created().json(stored))
}

pub async fn update_account(
    state: web::Data<AppState>,
    account: web::Json<Account>,
) -> ServiceResult<HttpResponse> {
    state.accounts.update_account(account.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn create_relation(
    state: web::Data<AppState>,
    relation: web::Json<Relation>,
) -> ServiceResult<HttpResponse> {
    let stored = state.accounts.create_relation(relation.into_inner()).await?;
    Ok(HttpResponse::Created().json(stored))
}

pub async fn update_relation(
    state: web::Data<AppState>,
    relation: web::Json<Relation>,
) -> ServiceResult<HttpResponse> {
    state.accounts.update_relation(relation.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn delete_relation(
    state: web::Data<AppState>,
    relation: web::Json<Relation>,
) -> ServiceResult<HttpResponse> {
    state.accounts.delete_relation(relation.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
