//! Runs one CLI command against the configured user service

use std::process::ExitCode;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::{
    Command, PasswordArgs, RegisterArgs, ReputationArgs, RevokeArgs, UpdateArgs, VerifyArgs,
};
use crate::config::AppConfig;
use crate::domain::{Outcome, UserFilter};
use crate::infrastructure::logging;
use crate::infrastructure::user::{
    AdjustReputationRequest, ChangePasswordRequest, RegisterUserRequest,
    RevokeVerificationRequest, UpdateUserRequest, VerifyUserRequest,
};

/// Run a command, print its outcome and map it to the process exit code
pub async fn run(command: Command) -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    let (config, load_error) = config_or_default(AppConfig::load());
    logging::init_logging(&config.logging);

    if let Some(error) = load_error {
        warn!(error = %error, "Failed to load configuration, falling back to defaults");
    }

    let service = crate::create_user_service(&config).await?;

    let report = match command {
        Command::Register(args) => render(service.register(register_request(args)).await?),
        Command::Update(args) => render(service.update(update_request(args)).await?),
        Command::Get(args) => render(service.get_by_id(args.id, args.details).await?),
        Command::Find(args) => render(service.get_by_email(&args.email).await?),
        Command::List(args) => {
            let filter = UserFilter {
                account_type: args.account_type,
                is_verified: args.verified,
                min_reputation_score: args.min_reputation,
            };
            render(service.get_all(&filter).await?)
        }
        Command::Verify(args) => render(service.verify_user(verify_request(args)).await?),
        Command::Revoke(args) => {
            render(service.revoke_verification(revoke_request(args)).await?)
        }
        Command::Reputation(args) => {
            render(service.adjust_reputation(reputation_request(args)).await?)
        }
        Command::Password(args) => {
            render(service.change_password(password_request(args)).await?)
        }
    };

    println!("{}", serde_json::to_string_pretty(&report.body)?);
    info!(success = report.success, "Command finished");

    Ok(if report.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Logging depends on the configuration, so a load error is handed back to be
/// reported once the subscriber is installed.
fn config_or_default(
    result: Result<AppConfig, config::ConfigError>,
) -> (AppConfig, Option<config::ConfigError>) {
    match result {
        Ok(config) => (config, None),
        Err(error) => (AppConfig::default(), Some(error)),
    }
}

struct Report {
    success: bool,
    body: Value,
}

fn render<T: Serialize>(outcome: Outcome<T>) -> Report {
    let success = outcome.is_success();

    let body = match outcome {
        Outcome::Value(value) => json!({ "success": true, "value": value }),
        Outcome::Done => json!({ "success": true }),
        Outcome::Failed(failure) => json!({
            "success": false,
            "kind": failure.kind(),
            "errors": failure.messages(),
        }),
    };

    Report { success, body }
}

fn register_request(args: RegisterArgs) -> RegisterUserRequest {
    let confirm_password = args
        .confirm_password
        .unwrap_or_else(|| args.password.clone());

    RegisterUserRequest::new(
        args.email,
        args.password,
        confirm_password,
        args.first_name,
        args.last_name,
        args.account_type,
    )
}

fn update_request(args: UpdateArgs) -> UpdateUserRequest {
    UpdateUserRequest {
        user_id: args.id,
        first_name: args.first_name,
        last_name: args.last_name,
        bio: profile_field(args.bio, args.clear_bio),
        location: profile_field(args.location, args.clear_location),
        avatar_url: profile_field(args.avatar_url, args.clear_avatar_url),
    }
}

fn profile_field(value: Option<String>, clear: bool) -> Option<Option<String>> {
    if clear { Some(None) } else { value.map(Some) }
}

fn verify_request(args: VerifyArgs) -> VerifyUserRequest {
    VerifyUserRequest {
        user_id: args.id,
        method: args.method,
        notes: args.notes,
    }
}

fn revoke_request(args: RevokeArgs) -> RevokeVerificationRequest {
    RevokeVerificationRequest {
        user_id: args.id,
        reason: args.reason,
    }
}

fn reputation_request(args: ReputationArgs) -> AdjustReputationRequest {
    AdjustReputationRequest {
        user_id: args.id,
        points: args.points,
    }
}

fn password_request(args: PasswordArgs) -> ChangePasswordRequest {
    let confirm_password = args
        .confirm_password
        .unwrap_or_else(|| args.new_password.clone());

    ChangePasswordRequest {
        user_id: args.id,
        current_password: args.current_password,
        new_password: args.new_password,
        confirm_password,
    }
}
