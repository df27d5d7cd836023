//! Request identity and HS256 tokens.
//!
//! A request carries an [`Identity`]. Callers without a token, or with one
//! that fails to decode or verify, get the guest identity; missing auth is
//! a normal path, never an error.
//!
//! ```ignore
//! use graphweave::auth::{Identity, TokenAuthority};
//!
//! let authority = TokenAuthority::new(b"secret")?;
//! let token = authority.login(&Identity::new("ada", ["admin"]))?;
//! assert_eq!(authority.identity(Some(&token)).name, "ada");
//! assert!(authority.identity(None).is_guest());
//! ```

use std::fmt;
use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthSettings;
use crate::error::{AuthError, AuthResult};

pub const GUEST_NAME: &str = "guest";
pub const GUEST_RULE: &str = "guest";

static HEADER: LazyLock<Header> = LazyLock::new(|| Header::new(Algorithm::HS256));

/// Who is making the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    #[serde(default)]
    pub rules: Vec<String>,
}

impl Identity {
    pub fn new(name: &str, rules: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            rules: rules.into_iter().map(Into::into).collect(),
        }
    }

    /// `{ name: "guest", rules: ["guest"] }`
    pub fn guest() -> Self {
        Self::new(GUEST_NAME, [GUEST_RULE])
    }

    pub fn is_guest(&self) -> bool {
        self.name == GUEST_NAME && self.rules.iter().all(|r| r == GUEST_RULE)
    }

    pub fn has_rule(&self, rule: &str) -> bool {
        self.rules.iter().any(|r| r == rule)
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::guest()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    identity: Identity,
    #[serde(default)]
    iat: u64,
}

/// Issues and decodes identity tokens signed with a shared secret.
#[derive(Clone)]
pub struct TokenAuthority {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    guest: Identity,
}

impl TokenAuthority {
    pub fn new(secret: &[u8]) -> AuthResult<Self> {
        if secret.is_empty() {
            return Err(AuthError::MissingSecret);
        }

        // Tokens carry no expiry.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            guest: Identity::guest(),
        })
    }

    pub fn from_settings(settings: &AuthSettings) -> AuthResult<Self> {
        let secret = settings.resolved_secret().ok_or(AuthError::MissingSecret)?;
        Ok(Self::new(secret.as_bytes())?.with_guest(settings.guest_identity()))
    }

    /// Identity handed to unauthenticated callers.
    pub fn with_guest(mut self, guest: Identity) -> Self {
        self.guest = guest;
        self
    }

    /// Issue a token carrying `identity`.
    pub fn login(&self, identity: &Identity) -> AuthResult<String> {
        let iat = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let claims = Claims {
            identity: identity.clone(),
            iat,
        };
        Ok(encode(&HEADER, &claims, &self.encoding)?)
    }

    /// Identity for a request: the token's, or the guest identity.
    pub fn identity(&self, token: Option<&str>) -> Identity {
        let token = token.map(strip_bearer).filter(|t| !t.is_empty());
        let Some(token) = token else {
            return self.guest.clone();
        };
        match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => data.claims.identity,
            Err(e) => {
                log::debug!("rejected token ({e}), continuing as {}", self.guest.name);
                self.guest.clone()
            }
        }
    }
}

impl fmt::Debug for TokenAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAuthority")
            .field("guest", &self.guest)
            .finish_non_exhaustive()
    }
}

fn strip_bearer(token: &str) -> &str {
    token
        .strip_prefix("Bearer ")
        .unwrap_or(token)
        .trim()
}
