pub mod bucket_service;
pub mod secret_service;
pub mod sync_service;

pub use bucket_service::BucketService;
pub use secret_service::SecretService;
pub use sync_service::SyncService;
