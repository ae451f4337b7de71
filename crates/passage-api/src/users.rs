//! User management.
//!
//! All operations are scoped to the app the [`Users`] handle was created for.

use passage_core::{AppId, DeviceId, UserId};
use reqwest::Method;

use crate::client::ApiClient;
use crate::error::{PassageError, Result};
use crate::types::{
    CreateUserArgs, DevicesResponse, UpdateUserArgs, User, UserResponse, UsersResponse,
    WebAuthnDevice,
};

/// Users of one app.
#[derive(Debug, Clone)]
pub struct Users {
    client: ApiClient,
    app_id: AppId,
}

impl Users {
    /// Create the resource for `app_id` on top of `client`.
    #[must_use]
    pub fn new(client: ApiClient, app_id: AppId) -> Self {
        Self { client, app_id }
    }

    fn user_path(&self, user_id: &UserId) -> String {
        format!("apps/{}/users/{user_id}", self.app_id)
    }

    /// Fetch a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an `ApiError` if the request fails or the API rejects it.
    pub async fn get(&self, user_id: &UserId) -> Result<User> {
        let response: UserResponse = self.client.get(&self.user_path(user_id), &[]).await?;
        Ok(response.user)
    }

    /// Fetch a user by email address or phone number.
    ///
    /// Identifiers are matched case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns a `user_not_found` Passage error with status 404 if no user has
    /// the identifier, or an `ApiError` if a request fails.
    pub async fn get_by_identifier(&self, identifier: &str) -> Result<User> {
        let identifier = identifier.to_lowercase();
        let path = format!("apps/{}/users", self.app_id);
        let response: UsersResponse = self
            .client
            .get(&path, &[("limit", "1"), ("identifier", identifier.as_str())])
            .await?;

        let Some(summary) = response.users.into_iter().next() else {
            return Err(PassageError {
                message: "Could not find user with that identifier.".to_string(),
                error_code: "user_not_found".to_string(),
                status_code: 404,
            }
            .into());
        };

        self.get(&summary.id).await
    }

    /// Create a user.
    ///
    /// # Errors
    ///
    /// Returns an `ApiError` if the request fails or the API rejects it.
    pub async fn create(&self, args: &CreateUserArgs) -> Result<User> {
        let path = format!("apps/{}/users", self.app_id);
        let response: UserResponse = self.client.send_json(Method::POST, &path, args).await?;
        tracing::info!(app_id = %self.app_id, user_id = %response.user.id, "Created user");
        Ok(response.user)
    }

    /// Update the attributes set in `args`.
    ///
    /// # Errors
    ///
    /// Returns an `ApiError` if the request fails or the API rejects it.
    pub async fn update(&self, user_id: &UserId, args: &UpdateUserArgs) -> Result<User> {
        let response: UserResponse = self
            .client
            .send_json(Method::PATCH, &self.user_path(user_id), args)
            .await?;
        Ok(response.user)
    }

    /// Activate a user.
    ///
    /// # Errors
    ///
    /// Returns an `ApiError` if the request fails or the API rejects it.
    pub async fn activate(&self, user_id: &UserId) -> Result<User> {
        let path = format!("{}/activate", self.user_path(user_id));
        let response: UserResponse = self.client.send_empty(Method::PATCH, &path).await?;
        tracing::info!(app_id = %self.app_id, user_id = %user_id, "Activated user");
        Ok(response.user)
    }

    /// Deactivate a user. Deactivated users cannot log in.
    ///
    /// # Errors
    ///
    /// Returns an `ApiError` if the request fails or the API rejects it.
    pub async fn deactivate(&self, user_id: &UserId) -> Result<User> {
        let path = format!("{}/deactivate", self.user_path(user_id));
        let response: UserResponse = self.client.send_empty(Method::PATCH, &path).await?;
        tracing::info!(app_id = %self.app_id, user_id = %user_id, "Deactivated user");
        Ok(response.user)
    }

    /// Delete a user.
    ///
    /// # Errors
    ///
    /// Returns an `ApiError` if the request fails or the API rejects it.
    pub async fn delete(&self, user_id: &UserId) -> Result<()> {
        self.client.delete(&self.user_path(user_id)).await?;
        tracing::info!(app_id = %self.app_id, user_id = %user_id, "Deleted user");
        Ok(())
    }

    /// List a user's registered passkeys.
    ///
    /// # Errors
    ///
    /// Returns an `ApiError` if the request fails or the API rejects it.
    pub async fn list_devices(&self, user_id: &UserId) -> Result<Vec<WebAuthnDevice>> {
        let path = format!("{}/devices", self.user_path(user_id));
        let response: DevicesResponse = self.client.get(&path, &[]).await?;
        Ok(response.devices)
    }

    /// Revoke one of a user's passkeys.
    ///
    /// # Errors
    ///
    /// Returns an `ApiError` if the request fails or the API rejects it.
    pub async fn revoke_device(&self, user_id: &UserId, device_id: &DeviceId) -> Result<()> {
        let path = format!("{}/devices/{device_id}", self.user_path(user_id));
        self.client.delete(&path).await?;
        tracing::info!(user_id = %user_id, device_id = %device_id, "Revoked device");
        Ok(())
    }

    /// Revoke all of a user's refresh tokens, signing them out everywhere.
    ///
    /// # Errors
    ///
    /// Returns an `ApiError` if the request fails or the API rejects it.
    pub async fn revoke_refresh_tokens(&self, user_id: &UserId) -> Result<()> {
        let path = format!("{}/tokens", self.user_path(user_id));
        self.client.delete(&path).await?;
        tracing::info!(user_id = %user_id, "Revoked refresh tokens");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::types::UserStatus;
    use crate::ApiConfig;
    use serde_json::{json, Value};
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const USERS_PATH: &str = "/apps/app123/users";

    fn users(server: &MockServer) -> Users {
        let mut config = ApiConfig::new(Some("key".to_string()));
        config.base_url = server.uri();
        Users::new(ApiClient::new(&config).unwrap(), "app123".parse().unwrap())
    }

    fn user_json(id: &str, email: &str, status: &str) -> Value {
        json!({
            "user": {
                "id": id,
                "email": email,
                "phone": "",
                "status": status,
                "email_verified": true,
                "created_at": "2024-01-02T03:04:05Z",
                "user_metadata": { "example1": "123" }
            }
        })
    }

    fn uid(s: &str) -> UserId {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn get_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/apps/app123/users/u1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(user_json("u1", "a@example.com", "active")),
            )
            .mount(&server)
            .await;

        let user = users(&server).get(&uid("u1")).await.unwrap();
        assert_eq!(user.email, "a@example.com");
        assert_eq!(user.status, UserStatus::Active);
        assert_eq!(user.user_metadata.unwrap()["example1"], "123");
    }

    #[tokio::test]
    async fn get_missing_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "code": "user_not_found",
                "error": "User not found"
            })))
            .mount(&server)
            .await;

        let err = users(&server).get(&uid("missing")).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(
            err.to_string(),
            "PassageError - message: User not found, errorCode: user_not_found, statusCode: 404"
        );
    }

    #[tokio::test]
    async fn gateway_error_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let err = users(&server).get(&uid("u1")).await.unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedStatus { status: 502, .. }));
    }

    #[tokio::test]
    async fn get_by_identifier_lowercases_and_fetches_full_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(USERS_PATH))
            .and(query_param("limit", "1"))
            .and(query_param("identifier", "user@example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "users": [{ "id": "u1", "email": "user@example.com", "status": "active" }]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/apps/app123/users/u1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(user_json("u1", "user@example.com", "active")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let user = users(&server)
            .get_by_identifier("User@Example.COM")
            .await
            .unwrap();
        assert_eq!(user.id.as_str(), "u1");
    }

    #[tokio::test]
    async fn get_by_unknown_identifier() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(USERS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "users": [] })))
            .mount(&server)
            .await;

        let err = users(&server)
            .get_by_identifier("nobody@example.com")
            .await
            .unwrap_err();
        let ApiError::Passage(err) = err else {
            panic!("expected a Passage error, got {err:?}");
        };
        assert_eq!(err.error_code, "user_not_found");
        assert_eq!(err.message, "Could not find user with that identifier.");
        assert_eq!(err.status_code, 404);
    }

    #[tokio::test]
    async fn create_and_update() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(USERS_PATH))
            .and(body_json(json!({ "email": "new@example.com" })))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(user_json("u2", "new@example.com", "pending")),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/apps/app123/users/u2"))
            .and(body_json(json!({ "user_metadata": { "example1": "456" } })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(user_json("u2", "new@example.com", "active")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let users = users(&server);
        let created = users
            .create(&CreateUserArgs {
                email: Some("new@example.com".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(created.status, UserStatus::Pending);

        let updated = users
            .update(
                &created.id,
                &UpdateUserArgs {
                    user_metadata: Some(json!({ "example1": "456" })),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, UserStatus::Active);
    }

    #[tokio::test]
    async fn activate_and_deactivate() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/apps/app123/users/u1/activate"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(user_json("u1", "a@example.com", "active")),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/apps/app123/users/u1/deactivate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(user_json("u1", "a@example.com", "inactive")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let users = users(&server);
        assert_eq!(
            users.activate(&uid("u1")).await.unwrap().status,
            UserStatus::Active
        );
        assert_eq!(
            users.deactivate(&uid("u1")).await.unwrap().status,
            UserStatus::Inactive
        );
    }

    #[tokio::test]
    async fn devices() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/apps/app123/users/u1/devices"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "devices": [{
                    "id": "d1",
                    "friendly_name": "Chrome on Mac",
                    "type": "passkey",
                    "usage_count": 3
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/apps/app123/users/u1/devices/d1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let users = users(&server);
        let devices = users.list_devices(&uid("u1")).await.unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].friendly_name, "Chrome on Mac");
        assert_eq!(devices[0].usage_count, 3);

        users
            .revoke_device(&uid("u1"), &devices[0].id)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn delete_and_revoke_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/apps/app123/users/u1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/apps/app123/users/u1/tokens"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let users = users(&server);
        users.delete(&uid("u1")).await.unwrap();
        users.revoke_refresh_tokens(&uid("u1")).await.unwrap();
    }
}
