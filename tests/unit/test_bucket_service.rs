use amethystkey::core::crypto::{KEY_SIZE, SALT_SIZE};
use amethystkey::core::error::ServiceError;

use crate::test_utils::create_test_harness;

#[tokio::test]
async fn bucket_creation_is_exactly_once() {
    let harness = create_test_harness();

    let client_id = harness
        .buckets
        .create_bucket("billing", "prod")
        .await
        .expect("first creation must succeed");
    assert!(!client_id.is_nil());

    let err = harness
        .buckets
        .create_bucket("billing", "prod")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::BucketExists(_)));
}

#[tokio::test]
async fn create_bucket_writes_key_file_and_cache_entry() {
    let harness = create_test_harness();

    let client_id = harness.buckets.create_bucket("app1", "bucketA").await.unwrap();

    assert!(harness.buckets.bucket_exists("app1", "bucketA"));
    assert_eq!(
        harness.cache.get("app1", "bucketA").unwrap(),
        Some(client_id)
    );

    let material = harness
        .buckets
        .load_key_material("app1", "bucketA")
        .await
        .unwrap();
    assert_eq!(material.key.len(), KEY_SIZE);
    assert_eq!(material.salt.len(), SALT_SIZE);
}

#[tokio::test]
async fn buckets_are_isolated_by_app_namespace() {
    let harness = create_test_harness();

    harness.buckets.create_bucket("app1", "shared").await.unwrap();
    harness.buckets.create_bucket("app2", "shared").await.unwrap();

    let app1 = harness
        .buckets
        .load_key_material("app1", "shared")
        .await
        .unwrap();
    let app2 = harness
        .buckets
        .load_key_material("app2", "shared")
        .await
        .unwrap();

    // Same bucket name under different apps gets independent key material
    assert_ne!(app1.salt, app2.salt);
}

#[tokio::test]
async fn list_buckets_enumerates_the_mirror() {
    let harness = create_test_harness();

    harness.buckets.create_bucket("app1", "bucketA").await.unwrap();
    harness.buckets.create_bucket("app1", "bucketB").await.unwrap();
    harness.buckets.create_bucket("app2", "bucketC").await.unwrap();

    let mut all = harness.buckets.list_buckets().await.unwrap();
    all.sort();
    assert_eq!(
        all,
        vec![
            ("app1".to_string(), "bucketA".to_string()),
            ("app1".to_string(), "bucketB".to_string()),
            ("app2".to_string(), "bucketC".to_string()),
        ]
    );

    assert_eq!(
        harness.buckets.list_buckets_for_app("app1").await.unwrap(),
        vec!["bucketA".to_string(), "bucketB".to_string()]
    );
}

#[tokio::test]
async fn missing_bucket_key_material_is_not_found() {
    let harness = create_test_harness();

    // KeyMaterial has no Debug impl, so drop the Ok side before unwrapping
    let err = harness
        .buckets
        .load_key_material("ghost", "bucket")
        .await
        .map(|_| ())
        .unwrap_err();
    assert!(matches!(err, ServiceError::BucketNotFound(_)));
    assert!(!harness.buckets.bucket_exists("ghost", "bucket"));
}
