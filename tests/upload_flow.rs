//! End-to-end upload tests against a mock gateway.

use std::sync::atomic::Ordering;
use std::time::Duration;

use arweave_uploader::ledger::client::{HttpNetworkClient, NetworkClient};
use arweave_uploader::ledger::types::{LedgerError, Tag};
use arweave_uploader::{Cancellation, Uploader};

mod common;

#[tokio::test]
async fn test_upload_commits_verifiable_transaction() {
    let (addr, gateway) = common::start_mock_gateway().await;
    let dir = tempfile::tempdir().unwrap();
    let config = common::local_config(addr, Some(common::write_wallet(&dir)));

    let uploader = Uploader::from_config(&config).unwrap();
    let tx = uploader
        .upload(&Cancellation::new(), b"hello".to_vec())
        .await
        .unwrap();

    let committed = gateway.committed();
    assert_eq!(committed.len(), 1);
    assert_eq!(committed[0], tx);
    assert_eq!(tx.last_tx(), common::ANCHOR);
    assert_eq!(tx.reward(), common::price_for(5));
    assert_eq!(tx.owner(), common::test_wallet().owner());
    tx.verify().unwrap();

    let raw: serde_json::Value =
        serde_json::from_slice(&gateway.commits.lock().unwrap()[0]).unwrap();
    assert_eq!(raw["target"], "");
    assert_eq!(raw["quantity"], "0");
    assert_eq!(raw["id"], tx.id());
}

#[tokio::test]
async fn test_upload_with_tags() {
    let (addr, gateway) = common::start_mock_gateway().await;
    let dir = tempfile::tempdir().unwrap();
    let config = common::local_config(addr, Some(common::write_wallet(&dir)));

    let tags = vec![Tag::new("Content-Type", "application/json")];
    Uploader::from_config(&config)
        .unwrap()
        .upload_with_tags(&Cancellation::new(), b"{}".to_vec(), &tags)
        .await
        .unwrap();

    let committed = gateway.committed();
    assert_eq!(committed[0].tags(), tags.as_slice());
    committed[0].verify().unwrap();
}

#[tokio::test]
async fn test_upload_and_confirm_waits_for_receipt() {
    let (addr, gateway) = common::start_mock_gateway().await;
    gateway.pending_polls.store(2, Ordering::SeqCst);
    let dir = tempfile::tempdir().unwrap();
    let config = common::local_config(addr, Some(common::write_wallet(&dir)));

    let receipt = Uploader::from_config(&config)
        .unwrap()
        .upload_and_confirm(&Cancellation::new(), b"confirm me".to_vec())
        .await
        .unwrap();

    assert_eq!(gateway.polls.load(Ordering::SeqCst), 3);
    assert_eq!(receipt, gateway.committed()[0]);
    receipt.verify().unwrap();
}

#[tokio::test]
async fn test_confirmation_stops_at_deadline() {
    let (addr, gateway) = common::start_mock_gateway().await;
    gateway.pending_polls.store(usize::MAX, Ordering::SeqCst);
    let dir = tempfile::tempdir().unwrap();
    let config = common::local_config(addr, Some(common::write_wallet(&dir)));

    let scope = Cancellation::new().with_timeout(Duration::from_millis(300));
    let err = Uploader::from_config(&config)
        .unwrap()
        .upload_and_confirm(&scope, b"never confirmed".to_vec())
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::DeadlineExceeded));
    assert_eq!(gateway.committed().len(), 1);

    let polls = gateway.polls.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(gateway.polls.load(Ordering::SeqCst), polls);
}

#[tokio::test]
async fn test_rejected_commit_is_network_error() {
    let (addr, gateway) = common::start_mock_gateway().await;
    gateway.reject_commits.store(true, Ordering::SeqCst);
    let dir = tempfile::tempdir().unwrap();
    let config = common::local_config(addr, Some(common::write_wallet(&dir)));

    let err = Uploader::from_config(&config)
        .unwrap()
        .upload(&Cancellation::new(), b"rejected".to_vec())
        .await
        .unwrap_err();

    match err {
        LedgerError::Status { status, body, .. } => {
            assert_eq!(status, 400);
            assert!(body.contains("verification failed"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_upload_without_wallet() {
    let (addr, gateway) = common::start_mock_gateway().await;
    let config = common::local_config(addr, None);

    let err = Uploader::from_config(&config)
        .unwrap()
        .upload(&Cancellation::new(), b"data".to_vec())
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::NoWallet));
    assert!(gateway.committed().is_empty());
}

#[tokio::test]
async fn test_unknown_transaction_is_not_found() {
    let (addr, _gateway) = common::start_mock_gateway().await;
    let config = common::local_config(addr, None);

    let client = HttpNetworkClient::new(&config.gateway).unwrap();
    let receipt = client
        .get_transaction(&Cancellation::new(), "bm90LXRoZXJl")
        .await
        .unwrap();
    assert!(receipt.is_none());
}

#[tokio::test]
async fn test_unreachable_gateway() {
    let addr = common::closed_port().await;
    let dir = tempfile::tempdir().unwrap();
    let config = common::local_config(addr, Some(common::write_wallet(&dir)));

    let err = Uploader::from_config(&config)
        .unwrap()
        .upload(&Cancellation::new(), b"data".to_vec())
        .await
        .unwrap_err();
    assert!(err.is_network());
    assert!(err.to_string().contains("fetch anchor"));
}
