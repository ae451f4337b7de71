//! Request and response types for the management API.

use chrono::{DateTime, Utc};
use passage_core::{AppId, DeviceId, UserId};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// The user can log in.
    Active,
    /// The user has been deactivated.
    Inactive,
    /// The user has not completed registration.
    Pending,
    /// A status this client does not know about.
    #[serde(other)]
    Unknown,
}

/// A Passage user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// User ID.
    pub id: UserId,
    /// Email address, empty if none.
    #[serde(default)]
    pub email: String,
    /// Phone number in E.164 format, empty if none.
    #[serde(default)]
    pub phone: String,
    /// Account status.
    pub status: UserStatus,
    /// Whether the email address has been verified.
    #[serde(default)]
    pub email_verified: bool,
    /// Whether the phone number has been verified.
    #[serde(default)]
    pub phone_verified: bool,
    /// When the user was created.
    pub created_at: Option<DateTime<Utc>>,
    /// When the user was last updated.
    pub updated_at: Option<DateTime<Utc>>,
    /// When the user last logged in.
    pub last_login_at: Option<DateTime<Utc>>,
    /// Number of successful logins.
    #[serde(default)]
    pub login_count: u64,
    /// App-defined metadata.
    #[serde(default)]
    pub user_metadata: Option<serde_json::Value>,
    /// Whether the user has a registered passkey.
    #[serde(default)]
    pub webauthn: bool,
    /// Registered passkeys.
    #[serde(default)]
    pub webauthn_devices: Vec<WebAuthnDevice>,
    /// Recent authentication events.
    #[serde(default)]
    pub recent_events: Vec<UserEvent>,
}

/// An authentication event recorded for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEvent {
    /// Event ID.
    pub id: String,
    /// Event type (e.g., `login`).
    #[serde(rename = "type", default)]
    pub event_type: String,
    /// When the event happened.
    pub created_at: Option<DateTime<Utc>>,
    /// IP address the event came from.
    #[serde(default)]
    pub ip_addr: String,
    /// Client user agent.
    #[serde(default)]
    pub user_agent: String,
}

/// A registered passkey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebAuthnDevice {
    /// Device ID.
    pub id: DeviceId,
    /// Name shown to the user.
    #[serde(default)]
    pub friendly_name: String,
    /// WebAuthn credential ID.
    #[serde(default)]
    pub cred_id: String,
    /// Authenticator type (e.g., `passkey`).
    #[serde(rename = "type", default)]
    pub device_type: String,
    /// Number of times the device has been used.
    #[serde(default)]
    pub usage_count: u64,
    /// When the device was registered.
    pub created_at: Option<DateTime<Utc>>,
    /// When the device was last updated.
    pub updated_at: Option<DateTime<Utc>>,
    /// When the device was last used to log in.
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Abbreviated user returned by list endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// User ID.
    pub id: UserId,
    /// Email address, empty if none.
    #[serde(default)]
    pub email: String,
    /// Phone number, empty if none.
    #[serde(default)]
    pub phone: String,
    /// Account status.
    pub status: UserStatus,
}

/// Settings of a Passage app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    /// App ID.
    pub id: AppId,
    /// Display name.
    pub name: String,
    /// Origin the app authenticates on.
    #[serde(default)]
    pub auth_origin: String,
    /// Where users land after logging in.
    #[serde(default)]
    pub redirect_url: String,
    /// Path of the login page.
    #[serde(default)]
    pub login_url: String,
    /// Identifier types users may register with (`email`, `phone`, `both`).
    #[serde(default)]
    pub allowed_identifier: String,
    /// Whether email addresses must be verified before login.
    #[serde(default)]
    pub require_email_verification: bool,
    /// Session length in seconds.
    #[serde(default)]
    pub session_timeout_length: u64,
    /// When the app was created.
    pub created_at: Option<DateTime<Utc>>,
}

/// What a magic link does when followed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MagicLinkType {
    /// Log the user in.
    #[default]
    Login,
    /// Verify the user's email or phone.
    VerifyIdentifier,
}

/// How a magic link is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MagicLinkChannel {
    /// By email.
    Email,
    /// By SMS.
    Phone,
}

/// Arguments for creating a magic link.
///
/// Target exactly one of `email`, `phone` or `user_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreateMagicLinkArgs {
    /// Email address to send to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Phone number to send to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Existing user to create the link for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    /// Delivery channel, required when `send` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<MagicLinkChannel>,
    /// Whether Passage delivers the link.
    pub send: bool,
    /// Link type.
    #[serde(rename = "type")]
    pub link_type: MagicLinkType,
    /// Path appended to the app origin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub magic_path: Option<String>,
    /// Where the user lands after the link is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    /// Language of the delivered message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Lifetime of the link in minutes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
}

/// A created magic link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagicLink {
    /// Link ID.
    pub id: String,
    /// Full URL of the link.
    pub url: String,
    /// Secret embedded in the link.
    #[serde(default)]
    pub secret: String,
    /// Whether the link has been used.
    #[serde(default)]
    pub activated: bool,
    /// Target user, empty if the link was created for a new identifier.
    #[serde(default)]
    pub user_id: String,
    /// App the link belongs to.
    pub app_id: AppId,
    /// Email or phone the link was created for.
    #[serde(default)]
    pub identifier: String,
    /// Link type.
    #[serde(rename = "type")]
    pub link_type: MagicLinkType,
    /// Where the user lands after the link is used.
    #[serde(default)]
    pub redirect_url: String,
    /// Lifetime of the link in minutes.
    #[serde(default)]
    pub ttl: u32,
}

/// Arguments for creating a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreateUserArgs {
    /// Email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Phone number in E.164 format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// App-defined metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_metadata: Option<serde_json::Value>,
}

/// Attributes to change on a user. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateUserArgs {
    /// New email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// New phone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Replacement metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_metadata: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserResponse {
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UsersResponse {
    pub users: Vec<UserSummary>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DevicesResponse {
    pub devices: Vec<WebAuthnDevice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AppResponse {
    pub app: AppInfo,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MagicLinkResponse {
    pub magic_link: MagicLink,
}
