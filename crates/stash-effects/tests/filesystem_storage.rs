//! Filesystem storage handler tests

use stash_core::effects::{StorageEffects, StorageError, StorageJsonExt};
use stash_effects::FilesystemStorageHandler;

#[tokio::test]
async fn filesystem_roundtrip_namespaced_keys() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FilesystemStorageHandler::new(dir.path());

    storage
        .store("stash:attribution", b"{}".to_vec())
        .await
        .unwrap();
    storage.store("stash:referral", b"AB12".to_vec()).await.unwrap();

    assert!(dir.path().join("stash").join("referral.dat").exists());
    assert_eq!(
        storage.retrieve("stash:referral").await.unwrap(),
        Some(b"AB12".to_vec())
    );
    assert_eq!(
        storage.list_keys(Some("stash:")).await.unwrap(),
        vec!["stash:attribution".to_string(), "stash:referral".to_string()]
    );
}

#[tokio::test]
async fn filesystem_missing_key_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FilesystemStorageHandler::new(dir.path());

    assert_eq!(storage.retrieve("stash:country").await.unwrap(), None);
    assert!(!storage.remove("stash:country").await.unwrap());
    assert!(storage.list_keys(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn filesystem_rejects_traversal() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FilesystemStorageHandler::new(dir.path());

    for key in ["", "stash:..", "stash::x", "a/b"] {
        assert!(
            matches!(
                storage.store(key, vec![1]).await,
                Err(StorageError::InvalidKey { .. })
            ),
            "key {key:?} should be rejected"
        );
    }
}

#[tokio::test]
async fn filesystem_json_helpers() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FilesystemStorageHandler::new(dir.path());

    storage
        .store_json("stash:country", &("US".to_string(), 42u64))
        .await
        .unwrap();
    let back: Option<(String, u64)> = storage.retrieve_json("stash:country").await.unwrap();
    assert_eq!(back, Some(("US".to_string(), 42)));
}
