//! App settings.

use passage_core::AppId;

use crate::client::ApiClient;
use crate::error::Result;
use crate::types::{AppInfo, AppResponse};

/// Operations on a Passage app.
#[derive(Debug, Clone)]
pub struct Apps {
    client: ApiClient,
}

impl Apps {
    /// Create the resource on top of `client`.
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Fetch the settings of `app_id`.
    ///
    /// # Errors
    ///
    /// Returns an `ApiError` if the request fails or the API rejects it.
    pub async fn get(&self, app_id: &AppId) -> Result<AppInfo> {
        let response: AppResponse = self.client.get(&format!("apps/{app_id}"), &[]).await?;
        Ok(response.app)
    }
}
