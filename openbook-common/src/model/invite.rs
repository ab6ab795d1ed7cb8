use crate::model::Id;
use serde::{Deserialize, Serialize};
use time::UtcDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct InviteMarker;

/// A pending invitation. Created by the invite endpoints/admin tooling; the
/// `send_invites` sweep only reads these and flips `is_invite_email_sent`.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize, Deserialize)]
pub struct UserInvite {
    pub id: Id<InviteMarker>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub is_invite_email_sent: bool,
    pub created: UtcDateTime,
}
