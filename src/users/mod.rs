pub mod directory;
pub mod model;
pub mod store;

pub use directory::{DirectoryError, UserDirectory};
pub use model::User;
pub use store::{PgUserStore, StoreError, UserStore};
