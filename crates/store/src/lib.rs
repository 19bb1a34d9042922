//! Fabletime user library storage
//!
//! Favorites, voice settings and the saved-recordings index live in a
//! [`KeyValueStore`]. [`UserLibrary`] is the typed facade the rest of the
//! application uses; construct it once and share it as `Arc<UserLibrary>`.

mod error;
mod file;
mod kv;
mod library;

pub use error::{StoreError, StoreResult};
pub use file::JsonFileStore;
pub use kv::{KeyValueStore, MemoryStore};
pub use library::{
    UserLibrary, FAVORITES_KEY, RECORDINGS_KEY, VOICE_GENDER_KEY, VOICE_PREFERENCE_KEY,
};
