//! Invitation email sweep.
//!
//! Iterates persisted invites and attempts exactly one send per record with
//! an email address. A transport failure is reported on the error stream and
//! the sweep moves on; there is no retry or backoff. The final success line
//! on the output stream is unconditional: the command has always reported
//! overall success even when individual sends failed.

use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use openbook_common::config::OpenbookConfig;
use openbook_common::model::Id;
use openbook_common::model::invite::{InviteMarker, UserInvite};
use std::io::Write;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("SERVICE_EMAIL_ADDRESS is not configured")]
    MissingSender,
    #[error("The recipient address is invalid: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("Error building the invitation email: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("SMTP transport error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

pub trait InviteTransport {
    fn send_invite(&self, email: &str, name: Option<&str>) -> Result<(), MailError>;
}

pub struct SmtpInviteTransport {
    mailer: SmtpTransport,
    sender: Mailbox,
}

impl SmtpInviteTransport {
    pub fn from_config(config: &OpenbookConfig) -> Result<Self, MailError> {
        let sender = config
            .service_email_address
            .as_deref()
            .ok_or(MailError::MissingSender)?
            .parse()?;

        let mut builder =
            SmtpTransport::builder_dangerous(&config.smtp_host).port(config.smtp_port);
        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            mailer: builder.build(),
            sender,
        })
    }
}

impl InviteTransport for SmtpInviteTransport {
    fn send_invite(&self, email: &str, name: Option<&str>) -> Result<(), MailError> {
        let greeting = name.map_or_else(
            || "Hi,".to_owned(),
            |name| format!("Hi {name},"),
        );

        let message = Message::builder()
            .from(self.sender.clone())
            .to(email.parse()?)
            .subject("You have been invited to Openbook")
            .body(format!(
                "{greeting}\n\nYou have been invited to join Openbook. \
                 Open the app and use your invite to create an account.\n"
            ))?;

        self.mailer.send(&message)?;
        Ok(())
    }
}

/// Attempts one send per invite with a non-null email and returns the ids of
/// the invites whose send succeeded, so the caller can mark them sent.
pub fn sweep_invites<T>(
    invites: &[UserInvite],
    transport: &T,
    out: &mut impl Write,
    err: &mut impl Write,
) -> std::io::Result<Vec<Id<InviteMarker>>>
where
    T: InviteTransport + ?Sized,
{
    let mut sent = Vec::new();

    for invite in invites {
        let Some(email) = invite.email.as_deref() else {
            continue;
        };

        match transport.send_invite(email, invite.name.as_deref()) {
            Ok(()) => sent.push(invite.id),
            Err(error) => {
                writeln!(err, "Exception occurred during send_invite_email: {error}")?;
            }
        }
    }

    writeln!(out, "Successfully sent invitation emails")?;
    Ok(sent)
}

#[cfg(test)]
mod tests {
    use crate::mailer::{InviteTransport, MailError, sweep_invites};
    use openbook_common::model::Id;
    use openbook_common::model::invite::UserInvite;
    use std::cell::RefCell;
    use time::macros::utc_datetime;

    struct FakeTransport {
        attempted: RefCell<Vec<String>>,
        fail_for: Vec<String>,
    }

    impl FakeTransport {
        fn new(fail_for: &[&str]) -> Self {
            Self {
                attempted: RefCell::new(Vec::new()),
                fail_for: fail_for.iter().map(|&s| s.to_owned()).collect(),
            }
        }
    }

    impl InviteTransport for FakeTransport {
        fn send_invite(&self, email: &str, _name: Option<&str>) -> Result<(), MailError> {
            self.attempted.borrow_mut().push(email.to_owned());
            if self.fail_for.iter().any(|f| f == email) {
                Err(MailError::MissingSender)
            } else {
                Ok(())
            }
        }
    }

    fn invite(id: u64, email: Option<&str>) -> UserInvite {
        UserInvite {
            id: Id::new(id),
            email: email.map(ToOwned::to_owned),
            name: None,
            is_invite_email_sent: false,
            created: utc_datetime!(2019-06-20 11:57),
        }
    }

    #[test]
    fn skips_invites_without_email() {
        let invites = vec![
            invite(1, Some("a@example.com")),
            invite(2, None),
            invite(3, Some("b@example.com")),
            invite(4, None),
        ];
        let transport = FakeTransport::new(&[]);
        let mut out = Vec::new();
        let mut err = Vec::new();

        let sent = sweep_invites(&invites, &transport, &mut out, &mut err).unwrap();

        // 4 records, 2 null emails: exactly 2 attempts.
        assert_eq!(
            *transport.attempted.borrow(),
            vec!["a@example.com", "b@example.com"]
        );
        assert_eq!(sent, vec![Id::new(1), Id::new(3)]);
        assert!(err.is_empty());
    }

    #[test]
    fn one_failure_does_not_abort_the_batch() {
        let invites = vec![
            invite(1, Some("a@example.com")),
            invite(2, Some("broken@example.com")),
            invite(3, Some("b@example.com")),
        ];
        let transport = FakeTransport::new(&["broken@example.com"]);
        let mut out = Vec::new();
        let mut err = Vec::new();

        let sent = sweep_invites(&invites, &transport, &mut out, &mut err).unwrap();

        assert_eq!(transport.attempted.borrow().len(), 3);
        assert_eq!(sent, vec![Id::new(1), Id::new(3)]);

        let err = String::from_utf8(err).unwrap();
        assert_eq!(err.lines().count(), 1);
        assert!(err.contains("send_invite_email"));
    }

    // Documented, not necessarily desired: the command reports overall
    // success on stdout even when every single send failed.
    #[test]
    fn success_line_printed_even_when_sends_fail() {
        let invites = vec![
            invite(1, Some("broken@example.com")),
            invite(2, Some("alsobroken@example.com")),
        ];
        let transport = FakeTransport::new(&["broken@example.com", "alsobroken@example.com"]);
        let mut out = Vec::new();
        let mut err = Vec::new();

        let sent = sweep_invites(&invites, &transport, &mut out, &mut err).unwrap();

        assert!(sent.is_empty());
        let out = String::from_utf8(out).unwrap();
        assert_eq!(out, "Successfully sent invitation emails\n");
    }

    #[test]
    fn empty_sweep_still_reports_success() {
        let transport = FakeTransport::new(&[]);
        let mut out = Vec::new();
        let mut err = Vec::new();

        let sent = sweep_invites(&[], &transport, &mut out, &mut err).unwrap();

        assert!(sent.is_empty());
        assert_eq!(out, b"Successfully sent invitation emails\n");
    }
}
