/// Promotion scheduling and activation
///
/// A post becomes a campaign in two steps: at creation the requested dates are handed
/// to the external scheduler, and when a date arrives the scheduler calls back into
/// `activate`, which flips the post into a live campaign.
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::clients::PromotionScheduler;
use crate::domain::PostPromotion;
use crate::error::ServiceResult;
use crate::metrics::{NOTIFIER_FAILURES_TOTAL, PROMOTIONS_ACTIVATED_TOTAL};
use crate::repository::PostStore;

/// Outcome of an activation batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActivationReport {
    pub activated: Vec<Uuid>,
    pub missing: Vec<Uuid>,
}

#[derive(Clone)]
pub struct PromotionService {
    posts: Arc<dyn PostStore>,
    scheduler: Arc<dyn PromotionScheduler>,
}

impl PromotionService {
    pub fn new(posts: Arc<dyn PostStore>, scheduler: Arc<dyn PromotionScheduler>) -> Self {
        Self { posts, scheduler }
    }

    /// Forward one promotion per date to the scheduler. Nothing is sent for an empty
    /// list, and a scheduler failure is logged rather than returned.
    pub async fn schedule(&self, post_id: Uuid, dates: &[DateTime<Utc>]) -> Vec<PostPromotion> {
        let promotions: Vec<PostPromotion> = dates
            .iter()
            .map(|&date| PostPromotion { post_id, date })
            .collect();
        if promotions.is_empty() {
            return promotions;
        }

        if let Err(e) = self.scheduler.notify_promotions_scheduled(&promotions).await {
            NOTIFIER_FAILURES_TOTAL.with_label_values(&["agent"]).inc();
            warn!(%post_id, error = %e, "Failed to hand promotions to scheduler");
        }
        promotions
    }

    /// Turn each referenced post into a live campaign exposed from now on.
    /// Unknown post ids are skipped without failing the rest of the batch.
    pub async fn activate(&self, post_ids: &[Uuid]) -> ServiceResult<ActivationReport> {
        let now = Utc::now();
        let results = join_all(
            post_ids
                .iter()
                .map(|&id| async move { (id, self.posts.activate_campaign(id, now).await) }),
        )
        .await;

        let mut report = ActivationReport::default();
        for (post_id, result) in results {
            if result? {
                PROMOTIONS_ACTIVATED_TOTAL
                    .with_label_values(&["activated"])
                    .inc();
                report.activated.push(post_id);
            } else {
                PROMOTIONS_ACTIVATED_TOTAL.with_label_values(&["missing"]).inc();
                warn!(%post_id, "Promotion references a post that does not exist; skipping");
                report.missing.push(post_id);
            }
        }

        info!(
            activated = report.activated.len(),
            missing = report.missing.len(),
            "Promotion batch processed"
        );
        Ok(report)
    }
}
