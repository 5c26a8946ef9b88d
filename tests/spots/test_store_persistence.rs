// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

use pulseview::spots::{NewSpot, SpotStore, WGS84_SRID};

#[tokio::test]
async fn test_spots_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("pulseview.db");

    {
        let store = SpotStore::open(&db_path).unwrap();
        store
            .create_spot(NewSpot::new("Old Town", "district", 50.0875, 14.4213))
            .await
            .unwrap();
    }

    let reopened = SpotStore::open(&db_path).unwrap();
    let spots = reopened.list_spots(0, 10).await.unwrap();
    assert_eq!(spots.len(), 1);
    assert_eq!(spots[0].name, "Old Town");
    assert_eq!(spots[0].location().srid, WGS84_SRID);
}

#[tokio::test]
async fn test_ids_keep_increasing_after_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("pulseview.db");

    let first_id = {
        let store = SpotStore::open(&db_path).unwrap();
        store
            .create_spot(NewSpot::new("a", "x", 0.0, 0.0))
            .await
            .unwrap()
            .id
    };

    let store = SpotStore::open(&db_path).unwrap();
    let second = store
        .create_spot(NewSpot::new("b", "x", 0.0, 0.0))
        .await
        .unwrap();
    assert!(second.id > first_id);
}
