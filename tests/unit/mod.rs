mod test_bucket_service;
mod test_secret_service;
mod test_sync_service;
