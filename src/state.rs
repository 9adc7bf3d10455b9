//! Small state primitives: a subscribable store with theme and session
//! stores on top, memoization caches, a debouncer, and a file-backed
//! key-value store.

pub mod context;
pub mod debounce;
pub mod memo;
pub mod persisted;
pub mod store;

pub use context::{Role, SessionStore, Theme, ThemeStore, User, UserPatch};
pub use debounce::{Debouncer, DEFAULT_DEBOUNCE_DELAY};
pub use memo::{Memo, MemoCache, MemoStats};
pub use persisted::{LocalStorage, Persisted};
pub use store::{Store, SubscriptionId};
