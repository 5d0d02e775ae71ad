use std::{collections::HashMap, fs, path::Path};

use anyhow::{Context, Result, bail};
use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use rand_core::OsRng;

/// Decides whether a username/password pair may sign in.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, username: &str, password: &str) -> bool;
}

/// Plaintext lookup table. Exact, case-sensitive match on both fields.
///
/// This is an insecure placeholder: passwords are stored and compared in
/// clear text with no lockout.
pub struct StaticCredentials {
    entries: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new<I, U, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = (U, P)>,
        U: Into<String>,
        P: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(user, password)| (user.into(), password.into()))
                .collect(),
        }
    }

    pub fn placeholder() -> Self {
        Self::new([
            ("uzair1", "12345678"),
            ("uzair2", "12345678"),
            ("uzair3", "12345678"),
        ])
    }
}

impl CredentialVerifier for StaticCredentials {
    fn verify(&self, username: &str, password: &str) -> bool {
        self.entries
            .get(username)
            .is_some_and(|expected| expected == password)
    }
}

/// Username → Argon2 PHC string table.
#[derive(Debug)]
pub struct Argon2Credentials {
    hashes: HashMap<String, String>,
}

impl Argon2Credentials {
    /// Loads a JSON object mapping usernames to Argon2 hashes.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read credentials file {}", path.display()))?;
        Self::from_json_str(&raw)
            .with_context(|| format!("invalid credentials file {}", path.display()))
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let hashes: HashMap<String, String> =
            serde_json::from_str(raw).context("credentials must be a JSON object of strings")?;

        if hashes.is_empty() {
            bail!("credentials file does not define any users");
        }

        for (username, hash) in &hashes {
            if let Err(err) = PasswordHash::new(hash) {
                bail!("password hash for `{username}` is not a valid PHC string: {err}");
            }
        }

        Ok(Self { hashes })
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }
}

impl CredentialVerifier for Argon2Credentials {
    fn verify(&self, username: &str, password: &str) -> bool {
        self.hashes
            .get(username)
            .is_some_and(|hash| verify_password(password, hash))
    }
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let parsed = PasswordHash::new(password_hash);
    match parsed {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn placeholder_accepts_exactly_the_three_listed_pairs() {
        let credentials = StaticCredentials::placeholder();
        for user in ["uzair1", "uzair2", "uzair3"] {
            assert!(credentials.verify(user, "12345678"), "{user} should sign in");
        }

        assert!(!credentials.verify("uzair4", "12345678"));
        assert!(!credentials.verify("uzair1", "1234567"));
        assert!(!credentials.verify("uzair1", ""));
        assert!(!credentials.verify("", ""));
    }

    #[test]
    fn placeholder_is_case_and_whitespace_sensitive() {
        let credentials = StaticCredentials::placeholder();
        assert!(!credentials.verify("UZAIR1", "12345678"));
        assert!(!credentials.verify("Uzair2", "12345678"));
        assert!(!credentials.verify(" uzair3", "12345678"));
        assert!(!credentials.verify("uzair3", "12345678 "));
    }

    #[test]
    fn argon2_table_verifies_hashed_passwords() {
        let hash = hash_password("correct horse").expect("hash");
        let raw = serde_json::json!({ "reviewer": hash }).to_string();
        let credentials = Argon2Credentials::from_json_str(&raw).expect("credentials");

        assert_eq!(credentials.len(), 1);
        assert!(credentials.verify("reviewer", "correct horse"));
        assert!(!credentials.verify("reviewer", "Correct horse"));
        assert!(!credentials.verify("someone", "correct horse"));
    }

    #[test]
    fn argon2_table_loads_from_file() {
        let hash = hash_password("s3cret").expect("hash");
        let mut file = NamedTempFile::new().expect("temp file");
        write!(file, "{}", serde_json::json!({ "editor": hash })).expect("write");

        let credentials = Argon2Credentials::from_json_file(file.path()).expect("credentials");
        assert!(credentials.verify("editor", "s3cret"));
    }

    #[test]
    fn argon2_table_rejects_plaintext_and_empty_files() {
        let err = Argon2Credentials::from_json_str(r#"{"editor": "12345678"}"#).unwrap_err();
        assert!(err.to_string().contains("not a valid PHC string"));

        assert!(Argon2Credentials::from_json_str("{}").is_err());
        assert!(Argon2Credentials::from_json_str("[]").is_err());
    }

    #[test]
    fn verify_password_rejects_malformed_hash() {
        assert!(!verify_password("password", "not-a-hash"));
    }
}
