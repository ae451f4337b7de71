//! Magic link creation.

use passage_core::AppId;
use reqwest::Method;

use crate::client::ApiClient;
use crate::error::Result;
use crate::types::{CreateMagicLinkArgs, MagicLink, MagicLinkResponse};

/// Magic links of one app.
#[derive(Debug, Clone)]
pub struct MagicLinks {
    client: ApiClient,
    app_id: AppId,
}

impl MagicLinks {
    /// Create the resource for `app_id` on top of `client`.
    #[must_use]
    pub fn new(client: ApiClient, app_id: AppId) -> Self {
        Self { client, app_id }
    }

    /// Create a magic link, delivering it if `args.send` is set.
    ///
    /// # Errors
    ///
    /// Returns an `ApiError` if the request fails or the API rejects it.
    pub async fn create(&self, args: &CreateMagicLinkArgs) -> Result<MagicLink> {
        let path = format!("apps/{}/magic-links", self.app_id);
        let response: MagicLinkResponse = self.client.send_json(Method::POST, &path, args).await?;
        tracing::debug!(app_id = %self.app_id, link_id = %response.magic_link.id, "Created magic link");
        Ok(response.magic_link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MagicLinkChannel, MagicLinkType};
    use crate::ApiConfig;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn create_posts_args() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/apps/app123/magic-links"))
            .and(body_json(json!({
                "email": "user@example.com",
                "channel": "email",
                "send": true,
                "type": "login",
                "ttl": 15
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "magic_link": {
                    "id": "ml1",
                    "url": "https://example.com/login?psg_magic_link=abc",
                    "secret": "abc",
                    "activated": false,
                    "app_id": "app123",
                    "identifier": "user@example.com",
                    "type": "login",
                    "redirect_url": "/",
                    "ttl": 15
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = ApiConfig::new(Some("key".to_string()));
        config.base_url = server.uri();
        let links = MagicLinks::new(ApiClient::new(&config).unwrap(), "app123".parse().unwrap());

        let link = links
            .create(&CreateMagicLinkArgs {
                email: Some("user@example.com".to_string()),
                channel: Some(MagicLinkChannel::Email),
                send: true,
                ttl: Some(15),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(link.id, "ml1");
        assert_eq!(link.link_type, MagicLinkType::Login);
        assert_eq!(link.ttl, 15);
        assert!(link.user_id.is_empty());
    }
}
