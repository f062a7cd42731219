//! Username/password resolution against stored argon2 hashes.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::password::verify_password;
use crate::error::AppResult;
use crate::model::employee::EmployeeProfile;
use crate::store::ProfileStore;

#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// `Ok(None)` both for unknown users and wrong passwords.
    async fn resolve_login(
        &self,
        username: &str,
        password: &str,
    ) -> AppResult<Option<EmployeeProfile>>;
}

/// Verified when the username is unknown so both failures cost one argon2
/// run. Uses the default parameters of [`super::password::hash_password`].
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$K2x6uV/NkyO2fJgAIWtFEg$QdJrD7YTsieSutYUd1bLTTJHZ/tk+ahKAUmHFcfgniU";

pub struct CredentialResolver {
    profiles: Arc<dyn ProfileStore>,
}

impl CredentialResolver {
    pub fn new(profiles: Arc<dyn ProfileStore>) -> Self {
        Self { profiles }
    }
}

#[async_trait]
impl IdentityResolver for CredentialResolver {
    async fn resolve_login(
        &self,
        username: &str,
        password: &str,
    ) -> AppResult<Option<EmployeeProfile>> {
        let Some(credentials) = self.profiles.find_credentials(username.trim()).await? else {
            debug!("No credentials stored for username");
            let _ = verify_password(password, DUMMY_HASH);
            return Ok(None);
        };

        match verify_password(password, &credentials.password_hash) {
            Ok(()) => Ok(Some(credentials.profile)),
            Err(e) => {
                debug!(error = %e, "Password verification failed");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::hash_password;
    use crate::engine::testing::wib;
    use crate::model::attendance::SessionKind;
    use crate::model::employee::NewEmployee;
    use crate::model::role::Role;
    use crate::store::MemoryStore;
    use std::collections::BTreeSet;

    async fn resolver() -> CredentialResolver {
        let store = Arc::new(MemoryStore::new(wib()));
        let employee = NewEmployee {
            username: "dina".into(),
            display_name: "Dina".into(),
            password: String::new(),
            role: Role::Staff,
            capabilities: BTreeSet::from([SessionKind::General]),
        };
        let hash = hash_password("rahasia123").unwrap();
        store.create_profile(&employee, &hash, 0).await.unwrap();
        CredentialResolver::new(store)
    }

    #[tokio::test]
    async fn resolves_matching_credentials() {
        let profile = resolver().await.resolve_login("dina", "rahasia123").await.unwrap();
        assert_eq!(profile.map(|p| p.display_name), Some("Dina".to_string()));
    }

    #[test]
    fn dummy_hash_parses_and_matches_nothing() {
        let parsed = argon2::password_hash::PasswordHash::new(DUMMY_HASH).unwrap();
        assert_eq!(parsed.algorithm.as_str(), "argon2id");
        assert!(matches!(
            verify_password("rahasia123", DUMMY_HASH),
            Err(argon2::password_hash::Error::Password)
        ));
    }

    #[tokio::test]
    async fn unknown_user_and_wrong_password_look_the_same() {
        let resolver = resolver().await;
        assert!(resolver.resolve_login("dina", "salah").await.unwrap().is_none());
        assert!(resolver.resolve_login("siti", "rahasia123").await.unwrap().is_none());
    }
}
