/// Read endpoints: home feed, profile, tag and reaction lookups, single post
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use super::AppState;
use crate::domain::PostRelationType;
use crate::error::ServiceResult;
use crate::middleware::{MaybeViewer, ViewerId};

#[derive(Debug, Deserialize)]
pub struct TagQuery {
    #[serde(default)]
    pub username: String,
}

pub async fn get_feed(state: web::Data<AppState>, viewer: ViewerId) -> ServiceResult<HttpResponse> {
    let posts = state.feed.build_feed(viewer.0).await?;
    Ok(HttpResponse::Ok().json(posts))
}

pub async fn for_user(
    state: web::Data<AppState>,
    viewer: MaybeViewer,
    author_id: web::Path<Uuid>,
) -> ServiceResult<HttpResponse> {
    let posts = state
        .lookup
        .filter_by_author(viewer.0, author_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(posts))
}

pub async fn tagged(
    state: web::Data<AppState>,
    viewer: MaybeViewer,
    query: web::Query<TagQuery>,
) -> ServiceResult<HttpResponse> {
    let posts = state.lookup.filter_by_tag(viewer.0, &query.username).await?;
    Ok(HttpResponse::Ok().json(posts))
}

pub async fn by_post_relation(
    state: web::Data<AppState>,
    viewer: ViewerId,
    kind: web::Path<String>,
) -> ServiceResult<HttpResponse> {
    let kind: PostRelationType = kind.parse()?;
    let posts = state.lookup.posts_by_relation(viewer.0, kind).await?;
    Ok(HttpResponse::Ok().json(posts))
}

pub async fn get_post(
    state: web::Data<AppState>,
    viewer: MaybeViewer,
    post_id: web::Path<Uuid>,
) -> ServiceResult<HttpResponse> {
    let details = state.lookup.get_post(viewer.0, post_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(details))
}
