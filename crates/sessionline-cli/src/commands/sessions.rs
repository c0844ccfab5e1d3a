use clap::Subcommand;
use sessionline_auth::SessionManager;

use crate::pout;

#[derive(Debug, Subcommand)]
pub enum SessionsCommands {
    /// List live session handles for a user
    List {
        #[arg(long)]
        user: String,
    },
    /// Revoke one or more sessions by handle
    Revoke {
        #[arg(required = true)]
        session_handles: Vec<String>,
    },
    /// Revoke every session of a user
    RevokeAll {
        #[arg(long)]
        user: String,
    },
}

pub async fn cmd_sessions(
    manager: &SessionManager,
    command: SessionsCommands,
    json: bool,
) -> anyhow::Result<()> {
    match command {
        SessionsCommands::List { user } => {
            let handles = manager.list_session_handles_for_user(&user).await?;
            let text = if handles.is_empty() {
                format!("No sessions for {user}")
            } else {
                handles.join("\n")
            };
            pout(json, serde_json::json!({"user_id":user,"session_handles":handles}), &text)
        }
        SessionsCommands::Revoke { session_handles } => {
            let revoked = manager.revoke_multiple_sessions(&session_handles).await?;
            let text = format!("Revoked {} of {} sessions", revoked.len(), session_handles.len());
            pout(json, serde_json::json!({"revoked":revoked}), &text)
        }
        SessionsCommands::RevokeAll { user } => {
            let revoked = manager.revoke_all_sessions_for_user(&user).await?;
            let text = format!("Revoked {} sessions for {user}", revoked.len());
            pout(json, serde_json::json!({"user_id":user,"revoked":revoked}), &text)
        }
    }
}
