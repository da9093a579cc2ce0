pub mod content_store;
pub mod github;
pub mod memory;
pub mod metrics;

pub use content_store::{ContentStore, FileUpdate, RemoteFile};
pub use github::GithubContentStore;
pub use memory::InMemoryContentStore;
pub use self::metrics::{get_metrics, init_metrics};
