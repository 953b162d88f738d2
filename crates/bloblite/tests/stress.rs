//! Stress tests for bloblite
//!
//! These tests verify client behaviour under concurrent access: optimistic
//! concurrency must let exactly one writer win a race on the same ETag, and
//! independent blobs must not interfere with each other.

use std::sync::Arc;
use std::time::Instant;

use bloblite::{BlobLiteClient, ETag};
use tempfile::TempDir;

const CONTAINER: &str = "stress";

// ============================================================================
// Compare-and-swap races
// ============================================================================

/// Race many conditional writers holding the same ETag
///
/// Writers are spread round-robin over `clients`.
async fn race_on_same_etag(clients: &[Arc<BlobLiteClient>], writers: usize) {
    let client = &clients[0];
    let initial = client
        .try_save_plain_text(CONTAINER, "counter.txt", "0", true, None)
        .await
        .unwrap();
    let expected = initial.etag().clone();

    let handles: Vec<_> = (0..writers)
        .map(|i| {
            let client = clients[i % clients.len()].clone();
            let expected = expected.clone();
            tokio::spawn(async move {
                client
                    .try_save_plain_text(
                        CONTAINER,
                        "counter.txt",
                        &format!("writer-{i}"),
                        false,
                        Some(&expected),
                    )
                    .await
            })
        })
        .collect();

    let mut winners = Vec::new();
    let mut rejected = 0;
    for (i, handle) in handles.into_iter().enumerate() {
        match handle.await.unwrap() {
            Ok(result) => winners.push((i, result.etag().clone())),
            Err(e) => {
                assert!(e.is_precondition_failed(), "unexpected error: {e}");
                rejected += 1;
            }
        }
    }

    assert_eq!(winners.len(), 1, "exactly one conditional write must win");
    assert_eq!(rejected, writers - 1);

    let (winner, winning_etag) = &winners[0];
    let loaded = client
        .try_load_plain_text(CONTAINER, "counter.txt")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.result(), &format!("writer-{winner}"));
    assert_eq!(loaded.etag(), winning_etag);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_memory_cas_race_single_winner() {
    let client = Arc::new(BlobLiteClient::new("memory://").unwrap());
    race_on_same_etag(&[client], 64).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_file_cas_race_single_winner() {
    let temp = TempDir::new().unwrap();
    let client =
        Arc::new(BlobLiteClient::new(&format!("file://{}", temp.path().display())).unwrap());
    race_on_same_etag(&[client], 32).await;
}

/// Independent clients on one root must still agree on a single winner
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_file_cas_race_across_clients() {
    let temp = TempDir::new().unwrap();
    let connection = format!("file://{}", temp.path().display());
    let clients = [
        Arc::new(BlobLiteClient::new(&connection).unwrap()),
        Arc::new(BlobLiteClient::new(&connection).unwrap()),
        // Same directory, different spelling
        Arc::new(BlobLiteClient::new(&format!("{connection}/./")).unwrap()),
    ];

    for _ in 0..20 {
        race_on_same_etag(&clients, 16).await;
    }
}

/// Read-modify-write loop: every increment retries on conflict until it lands
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_optimistic_increment_loses_no_updates() {
    let client = Arc::new(BlobLiteClient::new("memory://").unwrap());
    client
        .try_save_as_json(CONTAINER, "count.json", &0u64, true, None)
        .await
        .unwrap();

    let tasks = 16;
    let increments_per_task = 25;

    let handles: Vec<_> = (0..tasks)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move {
                let mut conflicts = 0usize;
                for _ in 0..increments_per_task {
                    loop {
                        let current = client
                            .try_load_from_json::<u64>(CONTAINER, "count.json")
                            .await
                            .unwrap()
                            .unwrap();
                        let (value, etag) = current.into_parts();

                        match client
                            .try_save_as_json(CONTAINER, "count.json", &(value + 1), false, Some(&etag))
                            .await
                        {
                            Ok(_) => break,
                            Err(e) if e.is_precondition_failed() => conflicts += 1,
                            Err(e) => panic!("unexpected error: {e}"),
                        }
                    }
                }
                conflicts
            })
        })
        .collect();

    let mut total_conflicts = 0;
    for handle in handles {
        total_conflicts += handle.await.unwrap();
    }
    println!("Optimistic increments saw {total_conflicts} conflicts");

    let final_count = client
        .try_load_from_json::<u64>(CONTAINER, "count.json")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(*final_count.result(), (tasks * increments_per_task) as u64);
}

// ============================================================================
// Throughput Tests
// ============================================================================

/// Many independent blobs written concurrently all land with distinct ETags
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_independent_writes() {
    let client = Arc::new(BlobLiteClient::new("memory://").unwrap());
    let blob_count = 500;

    let start = Instant::now();

    let handles: Vec<_> = (0..blob_count)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move {
                client
                    .try_save_plain_text(CONTAINER, &format!("blob-{i}"), &i.to_string(), true, None)
                    .await
                    .unwrap()
                    .etag()
                    .clone()
            })
        })
        .collect();

    let mut etags: Vec<ETag> = Vec::with_capacity(blob_count);
    for handle in handles {
        etags.push(handle.await.unwrap());
    }

    let duration = start.elapsed();
    println!("Wrote {blob_count} blobs in {duration:?}");

    let unique: std::collections::HashSet<_> = etags.iter().collect();
    assert_eq!(unique.len(), blob_count);

    for i in [0, blob_count / 2, blob_count - 1] {
        let loaded = client
            .try_load_plain_text(CONTAINER, &format!("blob-{i}"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.result(), &i.to_string());
    }
}

/// Deletes racing with loads never surface as errors
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_delete_races_with_load() {
    let temp = TempDir::new().unwrap();
    let client =
        Arc::new(BlobLiteClient::new(&format!("file://{}", temp.path().display())).unwrap());

    for round in 0..20 {
        let name = format!("flicker-{round}");
        client
            .try_save_plain_text(CONTAINER, &name, "here", true, None)
            .await
            .unwrap();

        let loader = {
            let client = client.clone();
            let name = name.clone();
            tokio::spawn(async move { client.try_load_plain_text(CONTAINER, &name).await })
        };
        let deleter = {
            let client = client.clone();
            let name = name.clone();
            tokio::spawn(async move { client.try_delete_blob(CONTAINER, &name).await })
        };

        let loaded = loader.await.unwrap().unwrap();
        deleter.await.unwrap().unwrap();

        if let Some(result) = loaded {
            assert_eq!(result.result(), "here");
        }
        assert!(
            client
                .try_load_plain_text(CONTAINER, &name)
                .await
                .unwrap()
                .is_none()
        );
    }
}
