use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::{self, SaltString, rand_core::OsRng},
};
use tracing::warn;

/// Plaintext behind `Passwords::dummy`. Never stored for a real account.
const DUMMY_PASSWORD: &str = "campus-unknown-user";

/// Argon2id hashing with cost parameters fixed at construction.
#[derive(Clone)]
pub struct Passwords {
    params: Params,
    /// Digest verified against when a login names no account, so unknown
    /// usernames cost as much as wrong passwords.
    dummy: String,
}

impl Passwords {
    pub fn new(params: Params) -> Result<Self, password_hash::Error> {
        let mut passwords = Self {
            params,
            dummy: String::new(),
        };
        passwords.dummy = passwords.hash(DUMMY_PASSWORD)?;
        Ok(passwords)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// PHC-formatted digest with a fresh random salt.
    pub fn hash(&self, plaintext: &str) -> Result<String, password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        Ok(self
            .argon2()
            .hash_password(plaintext.as_bytes(), &salt)?
            .to_string())
    }

    /// False for a wrong password and for a digest that does not parse.
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        let parsed = match PasswordHash::new(digest) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Unparsable password digest: {}", e);
                return false;
            }
        };

        self.argon2()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }

    /// Spends a full verification for a login that matched no account.
    pub fn verify_unknown(&self, plaintext: &str) {
        let _ = self.verify(plaintext, &self.dummy);
    }
}
