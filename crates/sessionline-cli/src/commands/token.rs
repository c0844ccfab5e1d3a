use clap::Subcommand;
use sessionline_auth::{SessionManager, TrustInputs, evaluate_trust, verify_access_token};

use crate::pout;

#[derive(Debug, Subcommand)]
pub enum TokenCommands {
    /// Verify an access token with the current signing key and show its claims
    Inspect {
        access_token: String,
        /// Anti-CSRF token the client would send alongside
        #[arg(long)]
        anti_csrf: Option<String>,
    },
}

pub async fn cmd_token(
    manager: &SessionManager,
    command: TokenCommands,
    json: bool,
) -> anyhow::Result<()> {
    match command {
        TokenCommands::Inspect {
            access_token,
            anti_csrf,
        } => {
            let info = manager.handshake().await?;
            let claims = match verify_access_token(&access_token, &info.signing_public_key, false) {
                Ok(claims) => claims,
                Err(e) => {
                    return pout(
                        json,
                        serde_json::json!({"valid":false,"error":e.to_string()}),
                        &format!("Token not valid locally: {e}"),
                    );
                }
            };

            let remote_reason = evaluate_trust(&TrustInputs {
                claims: &claims,
                anti_csrf_enabled: info.anti_csrf_enabled,
                blacklisting_enabled: info.access_token_blacklisting_enabled,
                do_anti_csrf_check: anti_csrf.is_some(),
                supplied_anti_csrf: anti_csrf.as_deref(),
            });
            let decision = match remote_reason {
                None => "accepted locally".to_string(),
                Some(reason) => format!("needs core ({reason:?})"),
            };
            let text = format!(
                "session {} user {}\nexpires {} ms\n{decision}",
                claims.session_handle, claims.user_id, claims.expiry_time
            );
            pout(
                json,
                serde_json::json!({"valid":true,"claims":claims,"decision":decision}),
                &text,
            )
        }
    }
}
