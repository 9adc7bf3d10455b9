use super::store::{Store, SubscriptionId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

/// Theme shared between components.
#[derive(Clone)]
pub struct ThemeStore {
    store: Store<Theme>,
}

impl ThemeStore {
    pub fn new(initial: Theme) -> Self {
        Self {
            store: Store::new(initial),
        }
    }

    pub fn theme(&self) -> Theme {
        self.store.get()
    }

    pub fn set_theme(&self, theme: Theme) {
        self.store.set(theme);
    }

    pub fn toggle(&self) -> Theme {
        self.store.update(|theme| *theme = theme.toggled());
        self.store.get()
    }

    pub fn subscribe(&self, callback: impl Fn(&Theme) + Send + Sync + 'static) -> SubscriptionId {
        self.store.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }
}

impl Default for ThemeStore {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Fields of a [`User`] that can be edited in place; `None` keeps the old value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Logged-in user shared between components. `None` means logged out.
#[derive(Clone)]
pub struct SessionStore {
    store: Store<Option<User>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            store: Store::new(None),
        }
    }

    pub fn user(&self) -> Option<User> {
        self.store.get()
    }

    pub fn is_logged_in(&self) -> bool {
        self.store.read(Option::is_some)
    }

    pub fn login(&self, user: User) {
        tracing::debug!(user_id = user.id, "session login");
        self.store.set(Some(user));
    }

    pub fn logout(&self) {
        self.store.set(None);
    }

    /// Applies `patch` to the current user. Returns `false` (and notifies no
    /// one) when logged out.
    pub fn update_user(&self, patch: UserPatch) -> bool {
        if !self.is_logged_in() {
            return false;
        }

        self.store.update(|user| {
            if let Some(user) = user.as_mut() {
                if let Some(name) = patch.name {
                    user.name = name;
                }
                if let Some(email) = patch.email {
                    user.email = email;
                }
            }
        });
        true
    }

    pub fn subscribe(
        &self,
        callback: impl Fn(&Option<User>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.store.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
