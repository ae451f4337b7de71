//! Core types for the Passage SDK.
//!
//! This crate provides the identifiers shared by the authentication and
//! management crates:
//!
//! - **`AppId`**: the Passage application a token or request belongs to
//! - **`UserId`**: a Passage user, as carried in the JWT `sub` claim
//! - **`DeviceId`**: a registered `WebAuthn` device of a user
//!
//! # Example
//!
//! ```
//! use passage_core::{AppId, UserId};
//!
//! let app_id: AppId = "KZ520QJSiFRLvbBvraaAgYuf".parse().unwrap();
//! let user_id: UserId = "jAOBfYtZNoxVdFGjUwQB".parse().unwrap();
//!
//! assert_eq!(app_id.as_str(), "KZ520QJSiFRLvbBvraaAgYuf");
//! assert_eq!(user_id.to_string(), "jAOBfYtZNoxVdFGjUwQB");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ids;

pub use ids::{AppId, DeviceId, IdError, UserId};
