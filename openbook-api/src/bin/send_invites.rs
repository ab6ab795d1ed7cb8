//! Sends invitation emails for populated invite records.
//!
//! `--failed true` (or `True`) limits the sweep to invites whose email was
//! never confirmed sent; anything else sweeps every invite. Per-record
//! transport failures go to stderr; the final line on stdout reports success
//! regardless.

use openbook_api::init::{InitError, install_tracing, load_config};
use openbook_api::mailer::{self, SmtpInviteTransport};
use openbook_db::client::DbClient;
use std::io;

fn failed_only_from_args(mut args: impl Iterator<Item = String>) -> bool {
    while let Some(arg) = args.next() {
        if arg == "--failed" {
            return matches!(args.next().as_deref(), Some("true" | "True"));
        }
        if let Some(value) = arg.strip_prefix("--failed=") {
            return value == "true" || value == "True";
        }
    }
    false
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let config = load_config()?;
    let failed_only = failed_only_from_args(std::env::args().skip(1));

    let db_client = DbClient::connect(config.clone()).await?;
    let transport = SmtpInviteTransport::from_config(&config)?;

    let invites = db_client.list_invites(failed_only).await?;
    let sent = mailer::sweep_invites(&invites, &transport, &mut io::stdout(), &mut io::stderr())?;

    for invite_id in sent {
        db_client.mark_invite_sent(invite_id).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::failed_only_from_args;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter()
            .map(|&arg| arg.to_owned())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn failed_flag_parsing() {
        assert!(failed_only_from_args(args(&["--failed", "true"])));
        assert!(failed_only_from_args(args(&["--failed", "True"])));
        assert!(failed_only_from_args(args(&["--failed=true"])));
        assert!(!failed_only_from_args(args(&["--failed", "false"])));
        assert!(!failed_only_from_args(args(&["--failed"])));
        assert!(!failed_only_from_args(args(&[])));
    }
}
