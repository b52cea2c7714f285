//! User CLI subcommands: register users and change their plan.

use anyhow::{Context, Result};
use clap::Subcommand;
use console::style;

use ella_types::user::{Plan, UserProfile};

use crate::state::Storage;

#[derive(Subcommand)]
pub enum UserCommand {
    /// Register a user and print their bearer token.
    Create {
        /// Identity-provider user id.
        clerk_id: String,

        #[arg(long, default_value = "")]
        name: String,

        #[arg(long, default_value = "")]
        email: String,

        /// Subscription plan (free or pro).
        #[arg(long, default_value = "free")]
        plan: Plan,
    },

    /// Change a user's plan.
    Plan {
        clerk_id: String,

        /// New plan (free or pro).
        plan: Plan,
    },
}

pub async fn handle_user_command(cmd: UserCommand, storage: &Storage, json: bool) -> Result<()> {
    match cmd {
        UserCommand::Create {
            clerk_id,
            name,
            email,
            plan,
        } => create_user(storage, &clerk_id, name, email, plan, json).await,
        UserCommand::Plan { clerk_id, plan } => set_plan(storage, &clerk_id, plan, json).await,
    }
}

/// The token is shown exactly once; only its hash is stored.
async fn create_user(
    storage: &Storage,
    clerk_id: &str,
    name: String,
    email: String,
    plan: Plan,
    json: bool,
) -> Result<()> {
    let profile = UserProfile {
        name,
        email,
        ..UserProfile::default()
    };
    let issued = storage
        .user_service()
        .register(clerk_id, profile, plan)
        .await
        .with_context(|| format!("Failed to register '{clerk_id}'"))?;

    if json {
        let result = serde_json::json!({
            "user": issued.user,
            "token": issued.token,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!();
        println!(
            "  {} Registered {} on the {} plan",
            style("ok").green(),
            style(&issued.user.clerk_id).cyan(),
            style(issued.user.plan).bold(),
        );
        println!();
        println!("  Bearer token (save this, it won't be shown again):");
        println!();
        println!("  {}", style(&issued.token).yellow().bold());
        println!();
    }

    Ok(())
}

async fn set_plan(storage: &Storage, clerk_id: &str, plan: Plan, json: bool) -> Result<()> {
    let user = storage
        .user_service()
        .set_plan(clerk_id, plan)
        .await
        .with_context(|| format!("Failed to update '{clerk_id}'"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
    } else {
        println!();
        println!(
            "  {} {} is now on the {} plan",
            style("ok").green(),
            style(&user.clerk_id).cyan(),
            style(user.plan).bold(),
        );
        println!();
    }

    Ok(())
}
