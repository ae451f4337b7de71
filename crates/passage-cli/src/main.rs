//! Passage CLI - validate session tokens and manage users from a terminal.
//!
//! This is the entry point for the `passage-cli` binary. Results are printed to
//! stdout as JSON; logs go to stderr.

use anyhow::Context;
use clap::{Parser, Subcommand};
use passage::{
    CreateMagicLinkArgs, CreateUserArgs, DeviceId, MagicLinkChannel, MagicLinkType, Passage,
    PassageConfig, UpdateUserArgs, UserId, DEFAULT_API_BASE_URL, DEFAULT_AUTH_BASE_URL,
};
use serde::Serialize;

/// Passage CLI - validate session tokens and manage users.
#[derive(Parser, Debug)]
#[command(name = "passage-cli")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Passage app ID.
    #[arg(long, env = "PASSAGE_APP_ID")]
    app_id: String,

    /// API key for management commands.
    #[arg(long, env = "PASSAGE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Management API URL.
    #[arg(long, env = "PASSAGE_API_URL", default_value = DEFAULT_API_BASE_URL)]
    api_url: String,

    /// Authentication service URL.
    #[arg(long, env = "PASSAGE_AUTH_URL", default_value = DEFAULT_AUTH_BASE_URL)]
    auth_url: String,

    /// Enable debug logging.
    #[arg(long, default_value = "false")]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a session token and print its claims.
    Validate {
        /// The session token.
        token: String,
    },

    /// Print the app's settings.
    App,

    /// Manage users.
    #[command(subcommand)]
    User(UserCommand),

    /// Create a magic link.
    MagicLink {
        /// Email address to create the link for.
        #[arg(long, conflicts_with_all = ["phone", "user_id"])]
        email: Option<String>,

        /// Phone number to create the link for.
        #[arg(long, conflicts_with = "user_id")]
        phone: Option<String>,

        /// Existing user to create the link for.
        #[arg(long)]
        user_id: Option<UserId>,

        /// Have Passage deliver the link by email or SMS.
        #[arg(long)]
        send: bool,

        /// Create an identifier verification link instead of a login link.
        #[arg(long)]
        verify: bool,

        /// Where the user lands after the link is used.
        #[arg(long)]
        redirect_url: Option<String>,

        /// Lifetime of the link in minutes.
        #[arg(long)]
        ttl: Option<u32>,
    },
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Fetch a user by ID.
    Get {
        /// User ID.
        user_id: UserId,
    },

    /// Fetch a user by email address or phone number.
    Find {
        /// Email address or phone number.
        identifier: String,
    },

    /// Create a user.
    Create {
        /// Email address.
        #[arg(long)]
        email: Option<String>,

        /// Phone number in E.164 format.
        #[arg(long)]
        phone: Option<String>,

        /// Metadata as a JSON object.
        #[arg(long)]
        metadata: Option<String>,
    },

    /// Update a user's attributes.
    Update {
        /// User ID.
        user_id: UserId,

        /// New email address.
        #[arg(long)]
        email: Option<String>,

        /// New phone number.
        #[arg(long)]
        phone: Option<String>,

        /// Replacement metadata as a JSON object.
        #[arg(long)]
        metadata: Option<String>,
    },

    /// Activate a user.
    Activate {
        /// User ID.
        user_id: UserId,
    },

    /// Deactivate a user.
    Deactivate {
        /// User ID.
        user_id: UserId,
    },

    /// Delete a user.
    Delete {
        /// User ID.
        user_id: UserId,
    },

    /// List a user's passkeys.
    Devices {
        /// User ID.
        user_id: UserId,
    },

    /// Revoke one of a user's passkeys.
    RevokeDevice {
        /// User ID.
        user_id: UserId,

        /// Device ID.
        device_id: DeviceId,
    },

    /// Sign a user out everywhere by revoking their refresh tokens.
    RevokeTokens {
        /// User ID.
        user_id: UserId,
    },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_metadata(metadata: Option<String>) -> anyhow::Result<Option<serde_json::Value>> {
    metadata
        .map(|raw| serde_json::from_str(&raw).context("--metadata must be valid JSON"))
        .transpose()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.debug {
        "passage=debug,passage_auth=debug,passage_api=debug,warn"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = PassageConfig::new(args.app_id, args.api_key);
    config.api_base_url = args.api_url;
    config.auth_base_url = args.auth_url;

    let passage = Passage::new(config)
        .await
        .context("failed to initialize Passage client")?;

    run(&passage, args.command).await
}

async fn run(passage: &Passage, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Validate { token } => {
            let claims = passage.auth().validate_claims(&token).await?;
            print_json(&serde_json::json!({
                "user_id": claims.user_id,
                "audience": claims.audience,
                "expires_at": claims.expires_at,
                "not_before": claims.not_before,
                "issued_at": claims.issued_at,
            }))
        }
        Command::App => print_json(&passage.get_app().await?),
        Command::User(command) => run_user(passage, command).await,
        Command::MagicLink {
            email,
            phone,
            user_id,
            send,
            verify,
            redirect_url,
            ttl,
        } => {
            let channel = if email.is_some() {
                Some(MagicLinkChannel::Email)
            } else if phone.is_some() {
                Some(MagicLinkChannel::Phone)
            } else {
                None
            };
            let args = CreateMagicLinkArgs {
                email,
                phone,
                user_id,
                channel,
                send,
                link_type: if verify {
                    MagicLinkType::VerifyIdentifier
                } else {
                    MagicLinkType::Login
                },
                redirect_url,
                ttl,
                ..Default::default()
            };
            print_json(&passage.auth().create_magic_link(&args).await?)
        }
    }
}

async fn run_user(passage: &Passage, command: UserCommand) -> anyhow::Result<()> {
    let users = passage.user();
    match command {
        UserCommand::Get { user_id } => print_json(&users.get(&user_id).await?),
        UserCommand::Find { identifier } => {
            print_json(&users.get_by_identifier(&identifier).await?)
        }
        UserCommand::Create {
            email,
            phone,
            metadata,
        } => {
            let args = CreateUserArgs {
                email,
                phone,
                user_metadata: parse_metadata(metadata)?,
            };
            print_json(&users.create(&args).await?)
        }
        UserCommand::Update {
            user_id,
            email,
            phone,
            metadata,
        } => {
            let args = UpdateUserArgs {
                email,
                phone,
                user_metadata: parse_metadata(metadata)?,
            };
            print_json(&users.update(&user_id, &args).await?)
        }
        UserCommand::Activate { user_id } => print_json(&users.activate(&user_id).await?),
        UserCommand::Deactivate { user_id } => print_json(&users.deactivate(&user_id).await?),
        UserCommand::Delete { user_id } => {
            users.delete(&user_id).await?;
            eprintln!("Deleted user {user_id}");
            Ok(())
        }
        UserCommand::Devices { user_id } => print_json(&users.list_devices(&user_id).await?),
        UserCommand::RevokeDevice { user_id, device_id } => {
            users.revoke_device(&user_id, &device_id).await?;
            eprintln!("Revoked device {device_id} of user {user_id}");
            Ok(())
        }
        UserCommand::RevokeTokens { user_id } => {
            users.revoke_refresh_tokens(&user_id).await?;
            eprintln!("Revoked refresh tokens of user {user_id}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_user_subcommand() {
        let args = Args::try_parse_from([
            "passage-cli",
            "--app-id",
            "app123",
            "user",
            "revoke-device",
            "u1",
            "d1",
        ])
        .unwrap();
        assert!(matches!(
            args.command,
            Command::User(UserCommand::RevokeDevice { .. })
        ));
        assert_eq!(args.api_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn rejects_malformed_user_id() {
        assert!(Args::try_parse_from(["passage-cli", "--app-id", "app123", "user", "get", "a/b"]).is_err());
    }

    #[test]
    fn magic_link_targets_conflict() {
        assert!(Args::try_parse_from([
            "passage-cli",
            "--app-id",
            "app123",
            "magic-link",
            "--email",
            "a@example.com",
            "--phone",
            "+15005550006",
        ])
        .is_err());
    }

    #[test]
    fn metadata_must_be_json() {
        assert!(parse_metadata(Some("{\"a\": 1}".to_string())).unwrap().is_some());
        assert!(parse_metadata(Some("not json".to_string())).is_err());
        assert!(parse_metadata(None).unwrap().is_none());
    }
}
