//! Passage SDK.
//!
//! A [`Passage`] client validates session tokens issued to one Passage app and
//! manages that app's users through the management API.
//!
//! Construction fetches the app's JWKS before returning, so a client that
//! exists can validate tokens without a cold start. Each client owns its key
//! cache; there is no process-wide state.
//!
//! # Example
//!
//! ```no_run
//! use passage::{Passage, PassageConfig};
//!
//! # async fn example() -> Result<(), passage::Error> {
//! let config = PassageConfig::new("KZ520QJSiFRLvbBvraaAgYuf", Some("api-key".to_string()));
//! let passage = Passage::new(config).await?;
//!
//! let user_id = passage.auth().validate_jwt("eyJhbGciOiJSUzI1NiIsImtpZCI6...").await?;
//! let user = passage.user().get(&user_id).await?;
//! println!("{} <{}>", user.id, user.email);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::sync::Arc;

use passage_api::{ApiClient, Apps, MagicLinks, Users};
use passage_auth::{JwksValidator, TokenValidator};
use tokio::task::JoinHandle;

pub mod auth;
pub mod config;
pub mod error;

pub use auth::Auth;
pub use config::PassageConfig;
pub use error::{Error, Result};

pub use passage_api::{
    ApiError, AppInfo, CreateMagicLinkArgs, CreateUserArgs, ErrorKind, MagicLink, MagicLinkChannel,
    MagicLinkType, PassageError, UpdateUserArgs, User, UserStatus, WebAuthnDevice,
    DEFAULT_API_BASE_URL,
};
pub use passage_auth::{
    AuthError, AuthStrategy, ValidatedClaims, AUTH_COOKIE_NAME, DEFAULT_AUTH_BASE_URL,
};
pub use passage_core::{AppId, DeviceId, UserId};

/// A Passage client bound to one app.
#[derive(Debug)]
pub struct Passage {
    app_id: AppId,
    auth: Auth,
    users: Users,
    apps: Apps,
    refresh_task: Option<JoinHandle<()>>,
}

impl Passage {
    /// Create a client and fetch the app's JWKS.
    ///
    /// # Errors
    ///
    /// Returns `Config` for a missing or malformed app ID or API base URL,
    /// and `Auth` with `FetchFailed` if the JWKS cannot be fetched. No client
    /// is returned on error.
    pub async fn new(config: PassageConfig) -> Result<Self> {
        let app_id = config.parsed_app_id()?;
        let auth_config = config.auth_config(app_id.clone());

        let validator = JwksValidator::connect(&auth_config).await?;
        let refresh_task = match auth_config.jwks_refresh_interval() {
            Some(interval) => Some(
                validator
                    .cache()
                    .spawn_periodic_refresh(validator.jwks_url(), interval)?,
            ),
            None => None,
        };

        let mut passage = Self::with_validator(&config, app_id, Arc::new(validator))?;
        passage.refresh_task = refresh_task;

        tracing::info!(app_id = %passage.app_id, "Passage client ready");
        Ok(passage)
    }

    /// Create a client that validates tokens with `validator`.
    ///
    /// No JWKS is fetched; the validator is used as given.
    ///
    /// # Errors
    ///
    /// Returns `Config` for a missing or malformed app ID or API base URL.
    pub fn with_validator(
        config: &PassageConfig,
        app_id: AppId,
        validator: Arc<dyn TokenValidator>,
    ) -> Result<Self> {
        let client = ApiClient::new(&config.api_config()).map_err(|e| match e {
            ApiError::InvalidConfig(msg) => Error::Config(msg),
            other => Error::Api(other),
        })?;

        let auth = Auth::new(
            app_id.clone(),
            config.auth_strategy,
            validator,
            MagicLinks::new(client.clone(), app_id.clone()),
        );

        Ok(Self {
            users: Users::new(client.clone(), app_id.clone()),
            apps: Apps::new(client),
            app_id,
            auth,
            refresh_task: None,
        })
    }

    /// The app this client is bound to.
    #[must_use]
    pub const fn app_id(&self) -> &AppId {
        &self.app_id
    }

    /// Token validation and magic links.
    #[must_use]
    pub const fn auth(&self) -> &Auth {
        &self.auth
    }

    /// User management for this app.
    #[must_use]
    pub const fn user(&self) -> &Users {
        &self.users
    }

    /// App settings.
    #[must_use]
    pub const fn app(&self) -> &Apps {
        &self.apps
    }

    /// Fetch the settings of this client's app.
    ///
    /// # Errors
    ///
    /// Returns `Error::Api` if the request fails or the API rejects it.
    pub async fn get_app(&self) -> Result<AppInfo> {
        Ok(self.apps.get(&self.app_id).await?)
    }
}

impl Drop for Passage {
    fn drop(&mut self) {
        if let Some(task) = self.refresh_task.take() {
            task.abort();
        }
    }
}
