//! Signed-in state as a plain value.
//!
//! Screens receive a `&Session` instead of reading a global flag; signing
//! in and out consume the old value and return the new one.

use uuid::Uuid;

use crate::types::AuthPayload;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub uid: Uuid,
    pub name: String,
    pub token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated(SessionUser),
}

impl Session {
    /// Session after a successful register or login. Any previous user is
    /// replaced.
    #[must_use]
    pub fn login(self, auth: AuthPayload) -> Self {
        Session::Authenticated(SessionUser {
            uid: auth.uid,
            name: auth.name,
            token: auth.token,
        })
    }

    #[must_use]
    pub fn logout(self) -> Self {
        Session::Anonymous
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated(_))
    }

    #[must_use]
    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            Session::Authenticated(user) => Some(user),
            Session::Anonymous => None,
        }
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.user().map(|u| u.token.as_str())
    }
}
