//! Auth command - stored credentials.

use anyhow::Result;
use clap::{Args, Subcommand};

use evexia_session::AuthStore;

use super::Context;

/// Arguments for the auth command.
#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Store a token issued by the Evexia API
    Login {
        /// Access token
        #[arg(long, env = "EVEXIA_TOKEN")]
        token: String,

        /// Signed-in identity (usually the user JSON returned at sign-in)
        #[arg(long)]
        user: Option<String>,
    },

    /// Show whether credentials are stored
    Status,

    /// Clear stored credentials
    Logout,
}

/// Run the auth command.
pub async fn run(args: AuthArgs, ctx: &Context) -> Result<()> {
    match args.command {
        AuthCommand::Login { token, user } => cmd_login(&token, user.as_deref(), ctx),
        AuthCommand::Status => cmd_status(ctx),
        AuthCommand::Logout => cmd_logout(ctx),
    }
}

fn auth_store(ctx: &Context) -> Result<AuthStore> {
    Ok(AuthStore::new(ctx.open_storage()?))
}

fn cmd_login(token: &str, user: Option<&str>, ctx: &Context) -> Result<()> {
    if token.trim().is_empty() {
        anyhow::bail!("Token must not be empty");
    }
    auth_store(ctx)?.login(token, user)?;
    println!("Signed in.");
    Ok(())
}

fn cmd_status(ctx: &Context) -> Result<()> {
    let auth = auth_store(ctx)?;
    let authenticated = auth.is_authenticated();
    let user = auth.user()?;

    if ctx.json_output {
        let value = serde_json::json!({
            "authenticated": authenticated,
            "user": user,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    if authenticated {
        match user {
            Some(user) => println!("Signed in as {}", user),
            None => println!("Signed in"),
        }
    } else {
        println!("Not signed in");
    }
    Ok(())
}

fn cmd_logout(ctx: &Context) -> Result<()> {
    auth_store(ctx)?.logout()?;
    println!("Signed out.");
    Ok(())
}
