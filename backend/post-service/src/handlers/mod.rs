/// HTTP handlers for post-service
///
/// Routes live under `/api/posts`. Static segments are registered ahead of the
/// `{id}` catch-alls so `/ping`, `/tagged` and friends are never parsed as ids.
pub mod feed;
pub mod posts;
pub mod users;

use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::clients::Clients;
use crate::metrics::serve_metrics;
use crate::repository::Stores;
use crate::services::{
    AccountService, FeedService, LookupService, PostService, PromotionService, ReactionService,
};

/// Services shared by every worker.
#[derive(Clone)]
pub struct AppState {
    pub feed: FeedService,
    pub lookup: LookupService,
    pub posts: PostService,
    pub promotions: PromotionService,
    pub reactions: ReactionService,
    pub accounts: AccountService,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(stores: &Stores, clients: &Clients, max_upload_bytes: usize) -> Self {
        Self {
            feed: FeedService::new(stores),
            lookup: LookupService::new(stores),
            posts: PostService::new(stores, clients),
            promotions: PromotionService::new(stores.posts.clone(), clients.scheduler.clone()),
            reactions: ReactionService::new(stores),
            accounts: AccountService::new(stores),
            max_upload_bytes,
        }
    }
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok", "service": "post-service" }))
}

async fn ping() -> HttpResponse {
    HttpResponse::Ok().body("pong")
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/metrics", web::get().to(serve_metrics))
        .service(
            web::scope("/api/posts")
                .service(
                    web::resource("")
                        .route(web::get().to(feed::get_feed))
                        .route(web::post().to(posts::create_post)),
                )
                .route("/ping", web::get().to(ping))
                .route("/tagged", web::get().to(feed::tagged))
                .route("/forUser/{id}", web::get().to(feed::for_user))
                .route("/byPostRelation/{kind}", web::get().to(feed::by_post_relation))
                .route("/promote", web::post().to(posts::promote))
                .route("/comment/{id}", web::post().to(posts::add_comment))
                .route("/remove/{id}", web::post().to(posts::remove_post))
                .service(
                    web::resource("/user")
                        .route(web::post().to(users::create_account))
                        .route(web::put().to(users::update_account)),
                )
                .service(
                    web::resource("/relation")
                        .route(web::post().to(users::create_relation))
                        .route(web::put().to(users::update_relation)),
                )
                .route("/relation/delete", web::post().to(users::delete_relation))
                .route(
                    "/{reaction:like|dislike|save}/{id}",
                    web::post().to(posts::react),
                )
                .route(
                    "/{reaction:like|dislike|save}/{id}/delete",
                    web::post().to(posts::unreact),
                )
                .route("/{id}", web::get().to(feed::get_post)),
        );
}
