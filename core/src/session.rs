//! Placeholder identity. Credentials are checked for presence only and never
//! stored; this is not a security boundary.

use crate::error::{Mutation, Result, SugarError, WriteOutcome};
use crate::models::{User, new_id};
use crate::store::{SESSION_KEY, Store, load_json, save_json};

/// Id given to every user created through [`Session::login`].
pub const LOCAL_USER_ID: &str = "1";

#[derive(Debug)]
pub struct Session {
    user: Option<User>,
    loading: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }
}

impl Session {
    pub fn load(&mut self, store: &dyn Store) {
        self.user = match load_json(store, SESSION_KEY) {
            Ok(user) => user,
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "failed to restore session");
                None
            }
        };
        self.loading = false;
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// The signed-in user, for callers that gate mutations on a session.
    pub fn require_user(&self) -> Result<&User> {
        self.user.as_ref().ok_or(SugarError::NotLoggedIn)
    }

    pub fn login(&mut self, store: &dyn Store, email: &str, password: &str) -> Result<Mutation<User>> {
        let email = required("email", email)?;
        required("password", password)?;
        let username = email.split('@').next().unwrap_or(email).to_string();
        let user = User {
            id: LOCAL_USER_ID.to_string(),
            username,
            email: email.to_string(),
        };
        Ok(self.establish(store, user))
    }

    pub fn register(
        &mut self,
        store: &dyn Store,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Mutation<User>> {
        let username = required("username", username)?;
        let email = required("email", email)?;
        required("password", password)?;
        let user = User {
            id: new_id(),
            username: username.to_string(),
            email: email.to_string(),
        };
        Ok(self.establish(store, user))
    }

    /// Clears the session. Yields the user that was signed in, if any.
    pub fn logout(&mut self, store: &dyn Store) -> Mutation<Option<User>> {
        let previous = self.user.take();
        let write = WriteOutcome::from_save(SESSION_KEY, store.remove(SESSION_KEY).map(|_| ()));
        Mutation::new(previous, write)
    }

    fn establish(&mut self, store: &dyn Store, user: User) -> Mutation<User> {
        self.user = Some(user.clone());
        tracing::debug!(user = %user.username, "session established");
        let write = WriteOutcome::from_save(SESSION_KEY, save_json(store, SESSION_KEY, &user));
        Mutation::new(user, write)
    }
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SugarError::validation(format!(
            "Please fill in all fields ({field} is missing)"
        )));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn loaded(store: &MemoryStore) -> Session {
        let mut session = Session::default();
        session.load(store);
        session
    }

    #[test]
    fn test_starts_logged_out() {
        let store = MemoryStore::new();
        let session = loaded(&store);
        assert!(!session.is_authenticated());
        assert!(matches!(session.require_user(), Err(SugarError::NotLoggedIn)));
    }

    #[test]
    fn test_login_derives_username() {
        let store = MemoryStore::new();
        let mut session = loaded(&store);
        let user = session
            .login(&store, "sam@example.com", "hunter2")
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(user.id, LOCAL_USER_ID);
        assert_eq!(user.username, "sam");
        assert_eq!(user.email, "sam@example.com");
        assert_eq!(session.require_user().unwrap(), &user);
    }

    #[test]
    fn test_login_requires_fields() {
        let store = MemoryStore::new();
        let mut session = loaded(&store);
        assert!(session.login(&store, "", "pw").unwrap_err().is_validation());
        assert!(session.login(&store, "a@b.c", "  ").is_err());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_register_and_restore() {
        let store = MemoryStore::new();
        let mut session = loaded(&store);
        let user = session
            .register(&store, "alex", "alex@example.com", "pw")
            .unwrap()
            .value;
        assert_ne!(user.id, LOCAL_USER_ID);

        let restored = loaded(&store);
        assert_eq!(restored.current_user(), Some(&user));
    }

    #[test]
    fn test_password_is_not_stored() {
        let store = MemoryStore::new();
        let mut session = loaded(&store);
        let _ = session.register(&store, "alex", "alex@example.com", "s3cret-pw").unwrap();
        assert!(!store.raw(SESSION_KEY).unwrap().contains("s3cret-pw"));
    }

    #[test]
    fn test_logout_clears_store() {
        let store = MemoryStore::new();
        let mut session = loaded(&store);
        let _ = session.login(&store, "sam@example.com", "pw").unwrap();

        let out = session.logout(&store);
        assert!(out.write.is_persisted());
        assert_eq!(out.value.unwrap().username, "sam");
        assert!(!session.is_authenticated());
        assert!(store.raw(SESSION_KEY).is_none());
        assert!(!loaded(&store).is_authenticated());
    }

    #[test]
    fn test_logout_write_failure_still_logs_out_in_memory() {
        let store = MemoryStore::new();
        let mut session = loaded(&store);
        let _ = session.login(&store, "sam@example.com", "pw").unwrap();
        store.set_fail_writes(true);

        let out = session.logout(&store);
        assert!(!out.write.is_persisted());
        assert!(!session.is_authenticated());
        assert!(store.raw(SESSION_KEY).is_some());
    }

    #[test]
    fn test_corrupt_session_is_ignored() {
        let store = MemoryStore::new();
        store.save(SESSION_KEY, "{}").unwrap();
        assert!(!loaded(&store).is_authenticated());
    }
}
