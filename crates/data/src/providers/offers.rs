//! HTTP client for the offer catalog service.

use super::{OfferDirectory, UpstreamError};
use async_trait::async_trait;
use copool_domain::{OfferId, OfferSnapshot, UserId};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

/// Offer directory backed by the catalog service's REST endpoint.
#[derive(Clone)]
pub struct HttpOfferDirectory {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct OfferDoc {
    id: Uuid,
    minimum_quota: u32,
    maximum_quota: u32,
    seller_id: Uuid,
    name: String,
    #[serde(default)]
    images: Vec<String>,
}

impl HttpOfferDirectory {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl OfferDirectory for HttpOfferDirectory {
    async fn get_offer(&self, offer_id: OfferId) -> Result<Option<OfferSnapshot>, UpstreamError> {
        let url = format!("{}/offers/{}", self.base_url, offer_id);
        let response = self.client.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let doc: OfferDoc = response.error_for_status()?.json().await?;

        Ok(Some(OfferSnapshot {
            offer_id: OfferId(doc.id),
            minimum_quota: doc.minimum_quota,
            maximum_quota: doc.maximum_quota,
            seller_id: UserId(doc.seller_id),
            name: doc.name,
            image: doc.images.into_iter().next().unwrap_or_default(),
        }))
    }
}
