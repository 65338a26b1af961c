//! Seam traits between the node core and its collaborators.
//!
//! The core never reaches for ambient globals: the application connection,
//! the key-value store, and the historical validator-set view are all handed
//! to components as explicit trait objects.

pub mod app;
pub mod store;
pub mod validators;

pub use app::AppConnection;
pub use store::KvStore;
pub use validators::ValidatorSetView;
