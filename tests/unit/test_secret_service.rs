use amethystkey::core::error::ServiceError;

use crate::test_utils::create_test_harness;

#[tokio::test]
async fn secret_lifecycle_store_retrieve_delete() {
    let harness = create_test_harness();
    harness.buckets.create_bucket("billing", "prod").await.unwrap();

    harness
        .secrets
        .store("billing", "prod", "db_password", "s3cr3t")
        .await
        .unwrap();

    let plaintext = harness
        .secrets
        .retrieve("billing", "prod", "db_password")
        .await
        .unwrap();
    assert_eq!(plaintext, "s3cr3t");

    harness
        .secrets
        .delete("billing", "prod", "db_password")
        .await
        .unwrap();

    let err = harness
        .secrets
        .retrieve("billing", "prod", "db_password")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::SecretNotFound(_)));
}

#[tokio::test]
async fn store_requires_an_existing_bucket() {
    let harness = create_test_harness();

    let err = harness
        .secrets
        .store("billing", "missing", "db_password", "s3cr3t")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::BucketNotFound(_)));
}

#[tokio::test]
async fn store_rejects_duplicate_secret_names() {
    let harness = create_test_harness();
    harness.buckets.create_bucket("app1", "bucketA").await.unwrap();

    harness
        .secrets
        .store("app1", "bucketA", "api_key", "first")
        .await
        .unwrap();

    let err = harness
        .secrets
        .store("app1", "bucketA", "api_key", "second")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::SecretExists(_)));

    // The original value is untouched
    assert_eq!(
        harness.secrets.retrieve("app1", "bucketA", "api_key").await.unwrap(),
        "first"
    );
}

#[tokio::test]
async fn update_overwrites_both_copies() {
    let harness = create_test_harness();
    harness.buckets.create_bucket("app1", "bucketA").await.unwrap();

    harness
        .secrets
        .store("app1", "bucketA", "api_key", "old-value")
        .await
        .unwrap();
    harness
        .secrets
        .update("app1", "bucketA", "api_key", "new-value")
        .await
        .unwrap();

    assert_eq!(
        harness.secrets.retrieve("app1", "bucketA", "api_key").await.unwrap(),
        "new-value"
    );

    // The database copy was rewritten too, not just the local file
    let rows = harness.repository.fetch_secrets().await.unwrap();
    assert_eq!(rows.len(), 1);
    let mirrored = harness
        .mirror
        .read_secret("app1", "bucketA", "api_key")
        .await
        .unwrap();
    assert_eq!(rows[0].ciphertext, mirrored);
}

#[tokio::test]
async fn update_requires_an_existing_secret() {
    let harness = create_test_harness();
    harness.buckets.create_bucket("app1", "bucketA").await.unwrap();

    let err = harness
        .secrets
        .update("app1", "bucketA", "missing", "value")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::SecretNotFound(_)));
}

#[tokio::test]
async fn delete_requires_an_existing_secret() {
    let harness = create_test_harness();
    harness.buckets.create_bucket("app1", "bucketA").await.unwrap();

    let err = harness
        .secrets
        .delete("app1", "bucketA", "missing")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::SecretNotFound(_)));

    // No database row is touched by the failed delete
    assert!(harness.repository.fetch_secrets().await.unwrap().is_empty());
}

#[tokio::test]
async fn generated_secret_is_stored_and_retrievable() {
    let harness = create_test_harness();
    harness.buckets.create_bucket("app1", "bucketA").await.unwrap();

    let generated = harness
        .secrets
        .generate_and_store("app1", "bucketA", "api_key", 24)
        .await
        .unwrap();
    assert_eq!(generated.len(), 24);

    assert_eq!(
        harness.secrets.retrieve("app1", "bucketA", "api_key").await.unwrap(),
        generated
    );

    // Name collisions are rejected the same way as a plain store
    let err = harness
        .secrets
        .generate_and_store("app1", "bucketA", "api_key", 24)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::SecretExists(_)));
}

#[tokio::test]
async fn list_secrets_reads_local_files() {
    let harness = create_test_harness();
    harness.buckets.create_bucket("app1", "bucketA").await.unwrap();

    harness.secrets.store("app1", "bucketA", "alpha", "1").await.unwrap();
    harness.secrets.store("app1", "bucketA", "beta", "2").await.unwrap();

    assert_eq!(
        harness.secrets.list_secrets("app1", "bucketA").await.unwrap(),
        vec!["alpha".to_string(), "beta".to_string()]
    );

    // The key file is not listed as a secret
    assert!(harness.secrets.secret_exists("app1", "bucketA", "alpha"));
    assert!(!harness.secrets.secret_exists("app1", "bucketA", "secret"));

    // Unknown buckets list as empty rather than erroring
    assert!(harness
        .secrets
        .list_secrets("app1", "missing")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn stored_ciphertext_is_not_plaintext() {
    let harness = create_test_harness();
    harness.buckets.create_bucket("app1", "bucketA").await.unwrap();

    harness
        .secrets
        .store("app1", "bucketA", "api_key", "super-secret-value")
        .await
        .unwrap();

    let mirrored = harness
        .mirror
        .read_secret("app1", "bucketA", "api_key")
        .await
        .unwrap();
    assert!(!mirrored
        .windows("super-secret-value".len())
        .any(|w| w == "super-secret-value".as_bytes()));
}
