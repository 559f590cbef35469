//! Repository credentials

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::{NccError, NccResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthenticationType {
    AccessToken,
    UsernamePassword,
}

/// A stored credential; `auth_type` declares which fields are meaningful
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authentication {
    #[serde(rename = "type")]
    pub auth_type: AuthenticationType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Credential ready to be injected into a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential<'a> {
    AccessToken(&'a str),
    UsernamePassword { username: &'a str, password: &'a str },
}

impl Authentication {
    pub fn access_token(token: impl Into<String>) -> Self {
        Self {
            auth_type: AuthenticationType::AccessToken,
            token: Some(token.into()),
            username: None,
            password: None,
        }
    }

    pub fn username_password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            auth_type: AuthenticationType::UsernamePassword,
            token: None,
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    /// Resolve the credential matching the declared type
    pub fn credential(&self) -> NccResult<Credential<'_>> {
        match (self.auth_type, &self.token, &self.username, &self.password) {
            (AuthenticationType::AccessToken, Some(token), _, _) => Ok(Credential::AccessToken(token)),
            (AuthenticationType::UsernamePassword, _, Some(username), Some(password)) => {
                Ok(Credential::UsernamePassword { username, password })
            }
            (auth_type, ..) => Err(NccError::authentication(format!(
                "Credential does not match its declared type {:?}",
                auth_type
            ))),
        }
    }
}

/// Lookup of credentials by repository name
pub trait CredentialStore {
    fn lookup(&self, repository: &str) -> Option<Authentication>;
}

impl CredentialStore for HashMap<String, Authentication> {
    fn lookup(&self, repository: &str) -> Option<Authentication> {
        self.iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(repository))
            .map(|(_, auth)| auth.clone())
    }
}
