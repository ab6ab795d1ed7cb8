//! The user entity itself is owned by the external identity provider; content
//! models only ever hold a typed reference to it.

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct UserMarker;
