use crate::config::IdentityConfig;
use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::collections::HashSet;
use std::fs;

/// Authenticated user making a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub uid: String,
    pub email: String,
    /// May view and download every user's files and search with `scope=all`.
    pub is_admin: bool,
}

/// Turns a bearer credential into a [`Caller`].
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Caller, AppError>;
}

/// Emails granted the admin role regardless of token claims.
#[derive(Debug, Clone, Default)]
pub struct AdminAllowList {
    emails: HashSet<String>,
}

impl AdminAllowList {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            emails: emails
                .into_iter()
                .map(|e| e.as_ref().trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn contains(&self, email: &str) -> bool {
        self.emails.contains(&email.trim().to_lowercase())
    }
}

/// Claims read from an identity-provider ID token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdTokenClaims {
    /// Subject (user ID)
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Custom admin claim
    #[serde(default)]
    pub admin: bool,
    pub iss: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
}

/// Verifies ID tokens issued for one identity-provider project.
///
/// RS256 tokens are checked against a PEM public key; an HS256 shared secret
/// can be configured instead for local development.
pub struct JwtIdentityVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
    admins: AdminAllowList,
}

impl JwtIdentityVerifier {
    pub fn new(config: &IdentityConfig) -> Result<Self, AppError> {
        let (decoding_key, algorithm) = match (&config.public_key_path, &config.shared_secret) {
            (Some(path), _) => {
                let pem = fs::read_to_string(path).map_err(|e| {
                    AppError::ConfigError(anyhow::anyhow!(
                        "Failed to read identity public key from {}: {}",
                        path,
                        e
                    ))
                })?;
                let key = DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| {
                    AppError::ConfigError(anyhow::anyhow!("Failed to parse public key: {}", e))
                })?;
                (key, Algorithm::RS256)
            }
            (None, Some(secret)) => {
                tracing::warn!("Identity verifier using HS256 shared secret");
                (DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256)
            }
            (None, None) => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "IDENTITY_PUBLIC_KEY_PATH or IDENTITY_SHARED_SECRET must be set"
                )))
            }
        };

        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        validation.set_issuer(&[issuer_for(&config.project_id)]);
        validation.set_audience(&[config.project_id.as_str()]);

        tracing::info!(
            project_id = %config.project_id,
            algorithm = ?algorithm,
            admin_emails = config.admin_emails.len(),
            "Identity verifier initialized"
        );

        Ok(Self {
            decoding_key,
            validation,
            admins: AdminAllowList::new(&config.admin_emails),
        })
    }
}

/// Token issuer expected for `project_id`.
pub fn issuer_for(project_id: &str) -> String {
    format!("https://securetoken.google.com/{}", project_id)
}

#[async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<Caller, AppError> {
        let claims = decode::<IdTokenClaims>(token, &self.decoding_key, &self.validation)?.claims;

        if claims.sub.is_empty() {
            return Err(AppError::Unauthorized(anyhow::anyhow!("Invalid token")));
        }

        let email = claims.email.unwrap_or_default();
        let is_admin = claims.admin || self.admins.contains(&email);

        Ok(Caller {
            uid: claims.sub,
            email,
            is_admin,
        })
    }
}
