use secrecy::{ExposeSecret, SecretString};

/// The only account the app accepts.
pub const FIXED_USERNAME: &str = "talentwunder";

/// Plain equality check against one fixed username and a configured password.
pub struct CredentialGate {
    password: Option<SecretString>,
}

impl CredentialGate {
    /// With no password configured every login fails.
    pub fn new(password: Option<SecretString>) -> Self {
        if password.is_none() {
            tracing::warn!("USER_PASSWORD is not set; all logins will be rejected");
        }
        Self { password }
    }

    pub fn authenticate(&self, username: &str, password: &str) -> bool {
        match &self.password {
            Some(expected) => {
                username == FIXED_USERNAME && password == expected.expose_secret().as_str()
            }
            None => false,
        }
    }
}
