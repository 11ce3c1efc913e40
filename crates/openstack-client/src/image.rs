//! Image (Glance) client

use crate::context::RequestContext;
use crate::error::OpenStackError;
use crate::models::Image;
use crate::openstack_trait::ImageClientTrait;
use crate::session::Session;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

#[derive(Deserialize)]
struct ImageList {
    #[serde(default)]
    images: Vec<Image>,
}

/// Picks the single image from a name lookup.
pub(crate) fn unique_image(identifier: &str, mut images: Vec<Image>) -> Result<Image, OpenStackError> {
    match images.len() {
        0 => Err(OpenStackError::NotFound(format!("image {}", identifier))),
        1 => Ok(images.remove(0)),
        n => Err(OpenStackError::Conflict(format!("{} images named {}", n, identifier))),
    }
}

/// Glance client
#[derive(Debug, Clone)]
pub struct ImageClient {
    session: Arc<Session>,
    endpoint: String,
}

impl ImageClient {
    /// Create a new image client
    ///
    /// # Arguments
    /// * `endpoint` - Glance endpoint (e.g., "https://glance:9292")
    pub fn new(session: Arc<Session>, endpoint: impl Into<String>) -> Self {
        Self {
            session,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait::async_trait]
impl ImageClientTrait for ImageClient {
    async fn resolve_image(&self, context: &RequestContext, identifier: &str) -> Result<Image, OpenStackError> {
        if Uuid::parse_str(identifier).is_ok() {
            let url = Session::build_url(&self.endpoint, &format!("v2/images/{}", identifier));
            return self.session.get(context, &url).await;
        }

        let url = Session::build_url(
            &self.endpoint,
            &format!("v2/images?name={}", urlencoding::encode(identifier)),
        );
        let list: ImageList = self.session.get(context, &url).await?;
        debug!("Image name {} matched {} images", identifier, list.images.len());
        unique_image(identifier, list.images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(id: &str) -> Image {
        Image {
            id: id.into(),
            name: Some("ubuntu-jammy".into()),
            status: Some("active".into()),
        }
    }

    #[test]
    fn test_unique_image() {
        assert_eq!(unique_image("ubuntu-jammy", vec![image("i1")]).unwrap().id, "i1");
        assert!(matches!(unique_image("ubuntu-jammy", vec![]), Err(OpenStackError::NotFound(_))));
        assert!(matches!(
            unique_image("ubuntu-jammy", vec![image("i1"), image("i2")]),
            Err(OpenStackError::Conflict(_))
        ));
    }

    #[test]
    fn test_image_list_parses() {
        let list: ImageList = serde_json::from_str(
            r#"{"images": [{"id": "i1", "name": "ubuntu-jammy", "status": "active", "visibility": "public"}], "first": "/v2/images"}"#,
        )
        .unwrap();
        assert_eq!(list.images.len(), 1);
    }
}
