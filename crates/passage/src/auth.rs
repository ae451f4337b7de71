//! Session token validation and magic links.

use std::fmt;
use std::sync::Arc;

use passage_api::{CreateMagicLinkArgs, MagicLink, MagicLinks};
use passage_auth::{authenticate_request, AuthStrategy, TokenValidator, ValidatedClaims};
use passage_core::{AppId, UserId};
use reqwest::header::HeaderMap;

use crate::error::Result;

/// Authentication operations of a [`Passage`](crate::Passage) client.
#[derive(Clone)]
pub struct Auth {
    app_id: AppId,
    strategy: AuthStrategy,
    validator: Arc<dyn TokenValidator>,
    magic_links: MagicLinks,
}

impl Auth {
    pub(crate) fn new(
        app_id: AppId,
        strategy: AuthStrategy,
        validator: Arc<dyn TokenValidator>,
        magic_links: MagicLinks,
    ) -> Self {
        Self {
            app_id,
            strategy,
            validator,
            magic_links,
        }
    }

    /// Validate a session token and return the user it was issued to.
    ///
    /// # Errors
    ///
    /// Returns `Error::Auth` if the token is invalid, expired, issued for
    /// another app, or signed by a key the JWKS does not publish.
    pub async fn validate_jwt(&self, token: &str) -> Result<UserId> {
        Ok(self.validate_claims(token).await?.user_id)
    }

    /// Validate a session token and return all of its checked claims.
    ///
    /// # Errors
    ///
    /// Same as [`Auth::validate_jwt`].
    pub async fn validate_claims(&self, token: &str) -> Result<ValidatedClaims> {
        Ok(self.validator.validate(token, self.app_id.as_str()).await?)
    }

    /// Authenticate an incoming request by its headers.
    ///
    /// The token is read from the bearer header, the `psg_auth_token` cookie,
    /// or both, depending on the configured strategy.
    ///
    /// # Errors
    ///
    /// Returns `Error::Auth` with `MissingToken` if there is no token, or any
    /// validation error.
    pub async fn authenticate_request(&self, headers: &HeaderMap) -> Result<UserId> {
        let claims = authenticate_request(
            self.validator.as_ref(),
            headers,
            self.strategy,
            self.app_id.as_str(),
        )
        .await?;
        Ok(claims.user_id)
    }

    /// Create a magic link for this app.
    ///
    /// # Errors
    ///
    /// Returns `Error::Api` if the request fails or the API rejects it.
    pub async fn create_magic_link(&self, args: &CreateMagicLinkArgs) -> Result<MagicLink> {
        Ok(self.magic_links.create(args).await?)
    }

    /// Where tokens are looked for in requests.
    #[must_use]
    pub const fn strategy(&self) -> AuthStrategy {
        self.strategy
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auth")
            .field("app_id", &self.app_id)
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}
