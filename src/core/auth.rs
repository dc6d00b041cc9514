//! Session - Bearer token holder and current user identity
//!
//! The backend issues HS256 tokens whose claims carry the user's id and
//! username. The client cannot verify the signature (it does not own the
//! secret); it only reads the claims to know who is sending.

use crate::core::ChatError;
use crate::entities::ChatUser;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use tracing::{debug, info, instrument};

/// Claims encoded in the backend's JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub exp: usize,
    pub iat: usize,
    pub id: i64,
    pub username: String,
}

/// Reads the claims of a token without verifying its signature
#[instrument(skip(token))]
pub fn read_claims(token: &str) -> Result<Claims, ChatError> {
    debug!("Reading JWT claims");
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    let data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)?;
    Ok(data.claims)
}

#[derive(Default)]
pub struct Session {
    state: RwLock<Option<SessionState>>,
}

struct SessionState {
    token: String,
    user: ChatUser,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session already logged in with `token`
    pub fn with_token(token: &str) -> Result<Self, ChatError> {
        let session = Self::new();
        session.login(token)?;
        Ok(session)
    }

    /// Stores a token after checking its claims can be read
    #[instrument(skip(self, token))]
    pub fn login(&self, token: &str) -> Result<ChatUser, ChatError> {
        let claims = read_claims(token)?;
        let user = ChatUser::new(claims.id, claims.username);
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        *state = Some(SessionState {
            token: token.to_string(),
            user: user.clone(),
        });
        info!(user_id = user.id, "Session started");
        Ok(user)
    }

    pub fn logout(&self) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if state.take().is_some() {
            info!("Session cleared");
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Token for the `Authorization: Bearer` header
    pub fn bearer(&self) -> Result<String, ChatError> {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|s| s.token.clone())
            .ok_or(ChatError::NotLoggedIn)
    }

    pub fn current_user(&self) -> Result<ChatUser, ChatError> {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|s| s.user.clone())
            .ok_or(ChatError::NotLoggedIn)
    }
}
