/// Write endpoints: create, comment, remove, reactions, promotion activation
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;

use super::AppState;
use crate::domain::{PostPromotion, PostRelationType, TargetingWindow};
use crate::error::{ServiceError, ServiceResult};
use crate::middleware::ViewerId;
use crate::services::{CreatePost, ImageUpload};

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct PromoteRequest {
    pub promotions: Vec<PostPromotion>,
}

/// Raw create-post form: text fields by name plus the image part.
#[derive(Debug, Default)]
pub struct PostForm {
    fields: HashMap<String, String>,
    image: Option<ImageUpload>,
}

impl PostForm {
    #[cfg(test)]
    fn with_field(mut self, name: &str, value: &str) -> Self {
        self.fields.insert(name.to_string(), value.to_string());
        self
    }

    #[cfg(test)]
    fn with_image(mut self, file_name: &str, bytes: Vec<u8>) -> Self {
        self.image = Some(ImageUpload {
            file_name: file_name.to_string(),
            bytes,
        });
        self
    }

    async fn read(mut payload: Multipart, max_bytes: usize) -> ServiceResult<Self> {
        let mut form = PostForm::default();

        while let Some(mut field) = payload.try_next().await.map_err(malformed)? {
            let name = field.name().to_string();
            let file_name = field
                .content_disposition()
                .get_filename()
                .map(str::to_string);

            let mut bytes = Vec::new();
            while let Some(chunk) = field.try_next().await.map_err(malformed)? {
                if bytes.len() + chunk.len() > max_bytes {
                    return Err(ServiceError::InvalidArgument(format!(
                        "field {} exceeds {} bytes",
                        name, max_bytes
                    )));
                }
                bytes.extend_from_slice(&chunk);
            }

            if name == "image" {
                form.image = Some(ImageUpload {
                    file_name: file_name.unwrap_or_else(|| "image".to_string()),
                    bytes,
                });
            } else {
                let value = String::from_utf8(bytes).map_err(|_| {
                    ServiceError::InvalidArgument(format!("field {} is not UTF-8", name))
                })?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    fn json_list<T: DeserializeOwned>(&self, name: &str) -> ServiceResult<Vec<T>> {
        match self.field(name) {
            Some(raw) => serde_json::from_str(raw).map_err(|e| {
                ServiceError::InvalidArgument(format!("{} must be a JSON array: {}", name, e))
            }),
            None => Ok(Vec::new()),
        }
    }

    /// Validate the form. Targeting fields are coerced leniently; everything else
    /// that is present must parse.
    pub fn into_command(self) -> ServiceResult<CreatePost> {
        let exposure_date = self
            .field("exposureDate")
            .map(|raw| {
                DateTime::parse_from_rfc3339(raw.trim())
                    .map(|d| d.with_timezone(&Utc))
                    .map_err(|_| {
                        ServiceError::InvalidArgument("exposureDate must be RFC 3339".to_string())
                    })
            })
            .transpose()?;

        let targeting = TargetingWindow::lenient(
            self.field("genderFilter"),
            self.field("ageFilterLow"),
            self.field("ageFilterHigh"),
        );
        let tag_ids: Vec<Uuid> = self.json_list("tags")?;
        let campaign_dates: Vec<DateTime<Utc>> = self.json_list("campaignDates")?;
        let hidden = self
            .field("hidden")
            .map_or(false, |v| v.trim().eq_ignore_ascii_case("true"));
        let description = self.field("description").unwrap_or_default().to_string();

        let image = self
            .image
            .ok_or_else(|| ServiceError::InvalidArgument("image is required".to_string()))?;

        Ok(CreatePost {
            description,
            hidden,
            exposure_date,
            targeting,
            tag_ids,
            campaign_dates,
            image,
        })
    }
}

fn malformed(e: actix_multipart::MultipartError) -> ServiceError {
    ServiceError::InvalidArgument(format!("malformed multipart body: {}", e))
}

fn reaction_kind(name: &str) -> ServiceResult<PostRelationType> {
    match name {
        "like" => Ok(PostRelationType::Like),
        "dislike" => Ok(PostRelationType::Dislike),
        "save" => Ok(PostRelationType::Save),
        other => Err(ServiceError::InvalidArgument(format!(
            "unknown reaction: {}",
            other
        ))),
    }
}

pub async fn create_post(
    state: web::Data<AppState>,
    viewer: ViewerId,
    payload: Multipart,
) -> ServiceResult<HttpResponse> {
    let form = PostForm::read(payload, state.max_upload_bytes).await?;
    let view = state.posts.create_post(viewer.0, form.into_command()?).await?;
    Ok(HttpResponse::Created().json(view))
}

pub async fn add_comment(
    state: web::Data<AppState>,
    viewer: ViewerId,
    post_id: web::Path<Uuid>,
    body: web::Json<CommentRequest>,
) -> ServiceResult<HttpResponse> {
    let comment = state
        .posts
        .add_comment(viewer.0, post_id.into_inner(), body.into_inner().content)
        .await?;
    Ok(HttpResponse::Created().json(comment))
}

pub async fn remove_post(
    state: web::Data<AppState>,
    post_id: web::Path<Uuid>,
) -> ServiceResult<HttpResponse> {
    state.posts.remove_post(post_id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn react(
    state: web::Data<AppState>,
    viewer: ViewerId,
    path: web::Path<(String, Uuid)>,
) -> ServiceResult<HttpResponse> {
    let (reaction, post_id) = path.into_inner();
    let relation = state
        .reactions
        .react(viewer.0, post_id, reaction_kind(&reaction)?)
        .await?;
    Ok(HttpResponse::Ok().json(relation))
}

pub async fn unreact(
    state: web::Data<AppState>,
    viewer: ViewerId,
    path: web::Path<(String, Uuid)>,
) -> ServiceResult<HttpResponse> {
    let (reaction, post_id) = path.into_inner();
    state
        .reactions
        .unreact(viewer.0, post_id, reaction_kind(&reaction)?)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Callback from the promotion scheduler once campaign dates come due.
pub async fn promote(
    state: web::Data<AppState>,
    body: web::Json<PromoteRequest>,
) -> ServiceResult<HttpResponse> {
    let ids: Vec<Uuid> = body.promotions.iter().map(|p| p.post_id).collect();
    let report = state.promotions.activate(&ids).await?;
    Ok(HttpResponse::Ok().json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Gender, AGE_FILTER_MAX};

    fn base_form() -> PostForm {
        PostForm::default()
            .with_field("description", "sunset")
            .with_image("sunset.jpg", vec![0xFF, 0xD8])
    }

    #[test]
    fn minimal_form_uses_defaults() {
        let cmd = base_form().into_command().unwrap();
        assert_eq!(cmd.description, "sunset");
        assert!(!cmd.hidden);
        assert!(cmd.exposure_date.is_none());
        assert_eq!(cmd.targeting, TargetingWindow::default());
        assert!(cmd.tag_ids.is_empty());
        assert!(cmd.campaign_dates.is_empty());
        assert_eq!(cmd.image.file_name, "sunset.jpg");
    }

    #[test]
    fn targeting_fields_are_coerced_independently() {
        let cmd = base_form()
            .with_field("genderFilter", "1")
            .with_field("ageFilterLow", "18")
            .with_field("ageFilterHigh", "not-a-number")
            .into_command()
            .unwrap();
        assert_eq!(cmd.targeting.gender, Gender::Male);
        assert_eq!(cmd.targeting.age_low, 18);
        assert_eq!(cmd.targeting.age_high, AGE_FILTER_MAX);
    }

    #[test]
    fn json_lists_are_parsed() {
        let tag = Uuid::new_v4();
        let cmd = base_form()
            .with_field("tags", &format!("[\"{}\"]", tag))
            .with_field("campaignDates", "[\"2021-07-01T00:00:00Z\"]")
            .with_field("hidden", "true")
            .with_field("exposureDate", "2021-06-01T12:00:00+02:00")
            .into_command()
            .unwrap();
        assert_eq!(cmd.tag_ids, vec![tag]);
        assert_eq!(cmd.campaign_dates.len(), 1);
        assert!(cmd.hidden);
        assert_eq!(
            cmd.exposure_date.unwrap().to_rfc3339(),
            "2021-06-01T10:00:00+00:00"
        );
    }

    #[test]
    fn missing_image_or_bad_tags_are_rejected() {
        let err = PostForm::default()
            .with_field("description", "x")
            .into_command()
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(_)));

        let err = base_form()
            .with_field("tags", "not json")
            .into_command()
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(_)));
    }

    #[test]
    fn reaction_names_map_to_kinds() {
        assert_eq!(reaction_kind("dislike").unwrap(), PostRelationType::Dislike);
        assert!(reaction_kind("share").is_err());
    }
}
