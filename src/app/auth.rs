use anyhow::{anyhow, Result};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use pasetors::claims::{Claims, ClaimsValidationRules};
use pasetors::keys::SymmetricKey;
use pasetors::token::UntrustedToken;
use pasetors::{local, version4::V4, Local};
use sqlx::Row;

use crate::domain::user::User;
use crate::infra::db::Db;

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: i64,
}

#[derive(Clone)]
pub struct AuthService {
    db: Db,
    key: [u8; 32],
    token_ttl_hours: u64,
}

impl AuthService {
    pub fn new(db: Db, key: [u8; 32], token_ttl_hours: u64) -> Self {
        Self {
            db,
            key,
            token_ttl_hours,
        }
    }

    /// Insert the new user, relying on the unique index on email as the sole
    /// authority for duplicates. A 23505 from the database is the handler's
    /// signal to answer with a conflict.
    pub async fn register(&self, name: String, email: String, password: String) -> Result<User> {
        let password_hash = hash_password(&password)?;
        let row = sqlx::query(
            "INSERT INTO users (name, email, password_hash) \
             VALUES ($1, $2, $3) \
             RETURNING id, name, email, created_at",
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(self.db.pool())
        .await?;

        Ok(User {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            created_at: row.get("created_at"),
        })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Option<(String, User)>> {
        let row = sqlx::query(
            "SELECT id, name, email, password_hash, created_at \
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.db.pool())
        .await?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let password_hash: String = row.get("password_hash");
        if !verify_password(password, &password_hash)? {
            return Ok(None);
        }

        let user = User {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            created_at: row.get("created_at"),
        };
        let token = self.issue_token(user.id)?;
        Ok(Some((token, user)))
    }

    pub async fn authenticate_token(&self, token: &str) -> Result<Option<AuthSession>> {
        let claims = match self.decrypt_claims(token)? {
            Some(claims) => claims,
            None => return Ok(None),
        };
        let user_id = claim_user_id(&claims)?;
        Ok(Some(AuthSession { user_id }))
    }

    pub async fn current_user(&self, user_id: i64) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, name, email, created_at \
             FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        let user = row.map(|row| User {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            created_at: row.get("created_at"),
        });

        Ok(user)
    }

    pub fn issue_token(&self, user_id: i64) -> Result<String> {
        let duration = std::time::Duration::from_secs(self.token_ttl_hours * 60 * 60);
        let mut claims = Claims::new_expires_in(&duration)?;
        claims.issuer("plume")?;
        claims.audience("plume")?;
        claims.subject(&user_id.to_string())?;

        let key = SymmetricKey::<V4>::from(&self.key)?;
        let token = local::encrypt(&key, &claims, None, None)?;
        Ok(token)
    }

    fn decrypt_claims(&self, token: &str) -> Result<Option<Claims>> {
        let key = SymmetricKey::<V4>::from(&self.key)?;
        let mut rules = ClaimsValidationRules::new();
        rules.validate_issuer_with("plume");
        rules.validate_audience_with("plume");

        let untrusted = match UntrustedToken::<Local, V4>::try_from(token) {
            Ok(token) => token,
            Err(_) => return Ok(None),
        };
        let trusted = match local::decrypt(&key, &untrusted, &rules, None, None) {
            Ok(token) => token,
            Err(_) => return Ok(None),
        };
        Ok(trusted.payload_claims().cloned())
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash password: {}", err))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|err| anyhow!("failed to parse password hash: {}", err))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn claim_user_id(claims: &Claims) -> Result<i64> {
    let value = claims
        .get_claim("sub")
        .and_then(|value| value.as_str())
        .ok_or_else(|| anyhow!("missing sub claim"))?;
    value
        .parse::<i64>()
        .map_err(|err| anyhow!("invalid sub claim: {}", err))
}
