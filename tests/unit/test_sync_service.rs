use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use amethystkey::models::BucketKeyRecord;
use uuid::Uuid;

use crate::test_utils::create_test_harness;

// Snapshot of every file in the mirror, for byte-identical comparisons
fn snapshot_mirror(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    let mut files = BTreeMap::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                pending.push(path);
            } else {
                let contents = std::fs::read(&path).unwrap();
                files.insert(path.strip_prefix(root).unwrap().to_path_buf(), contents);
            }
        }
    }
    files
}

#[tokio::test]
async fn sync_restores_missing_secret_file() {
    let harness = create_test_harness();
    harness.buckets.create_bucket("billing", "prod").await.unwrap();
    harness
        .secrets
        .store("billing", "prod", "db_password", "s3cr3t")
        .await
        .unwrap();

    // Simulate local file loss
    harness
        .mirror
        .delete_secret("billing", "prod", "db_password")
        .await
        .unwrap();
    assert!(!harness.mirror.secret_exists("billing", "prod", "db_password"));

    assert!(harness.sync.sync_once().await.unwrap());

    assert_eq!(
        harness
            .secrets
            .retrieve("billing", "prod", "db_password")
            .await
            .unwrap(),
        "s3cr3t"
    );
}

#[tokio::test]
async fn sync_rebuilds_mirror_and_cache_from_empty() {
    let harness = create_test_harness();

    // Rows exist in the database but nothing is mirrored locally yet,
    // as after a fresh deployment onto an empty disk.
    let client_id = Uuid::new_v4();
    let mut key_blob = vec![1u8; 32];
    key_blob.extend_from_slice(&[2u8; 16]);
    harness
        .repository
        .insert_bucket_key(&BucketKeyRecord {
            app_name: "app1".to_string(),
            bucket_name: "bucketA".to_string(),
            key_blob: key_blob.clone(),
            client_id,
        })
        .await
        .unwrap();

    assert!(harness.sync.sync_once().await.unwrap());

    assert!(harness.mirror.bucket_exists("app1", "bucketA"));
    assert_eq!(
        harness.mirror.read_key_blob("app1", "bucketA").await.unwrap(),
        key_blob
    );
    assert_eq!(harness.cache.get("app1", "bucketA").unwrap(), Some(client_id));
}

#[tokio::test]
async fn sync_is_idempotent_on_unchanged_database() {
    let harness = create_test_harness();
    harness.buckets.create_bucket("app1", "bucketA").await.unwrap();
    harness.secrets.store("app1", "bucketA", "alpha", "1").await.unwrap();
    harness.secrets.store("app1", "bucketA", "beta", "2").await.unwrap();

    assert!(harness.sync.sync_once().await.unwrap());
    let first = snapshot_mirror(harness.temp_dir.path());

    assert!(harness.sync.sync_once().await.unwrap());
    let second = snapshot_mirror(harness.temp_dir.path());

    assert_eq!(first, second);
}

#[tokio::test]
async fn sync_never_overwrites_existing_local_files() {
    let harness = create_test_harness();
    harness.buckets.create_bucket("app1", "bucketA").await.unwrap();
    harness.secrets.store("app1", "bucketA", "alpha", "1").await.unwrap();

    // A local edit diverges from the database copy
    let local_edit = b"locally-edited-ciphertext".to_vec();
    harness
        .mirror
        .write_secret("app1", "bucketA", "alpha", &local_edit)
        .await
        .unwrap();

    assert!(harness.sync.sync_once().await.unwrap());

    assert_eq!(
        harness.mirror.read_secret("app1", "bucketA", "alpha").await.unwrap(),
        local_edit
    );
}

#[tokio::test]
async fn sync_refreshes_stale_cache_entries() {
    let harness = create_test_harness();
    let client_id = harness.buckets.create_bucket("app1", "bucketA").await.unwrap();

    // Poison the cache with a stale id; the cycle must repair it
    harness.cache.insert("app1", "bucketA", Uuid::new_v4()).unwrap();

    assert!(harness.sync.sync_once().await.unwrap());

    assert_eq!(harness.cache.get("app1", "bucketA").unwrap(), Some(client_id));
}
