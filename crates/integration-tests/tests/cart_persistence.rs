//! Persistence round-trips and restart behaviour.

use marketplace_cart::{CartConfig, CartStore, FileStore, KeyValueStore, MemoryStore, codec};
use marketplace_integration_tests::{open_ready, product, product_id, quantities};

const KEY: &str = "@Marketplace:products";

fn pairs(items: &[(&str, u32)]) -> Vec<(String, u32)> {
    items.iter().map(|(id, q)| ((*id).to_string(), *q)).collect()
}

#[tokio::test]
async fn test_every_mutation_rewrites_full_snapshot() {
    let memory = MemoryStore::new();
    let store = open_ready(memory.clone()).await;

    store.add_to_cart(product("p1", "Shirt", 10)).unwrap();
    store.add_to_cart(product("p2", "Hat", 7)).unwrap();
    store.flush().await.unwrap();
    let first = codec::decode(&memory.value(KEY).unwrap()).unwrap();
    assert_eq!(first.items().len(), 2);

    store.decrement(&product_id("p1")).unwrap();
    store.flush().await.unwrap();
    let second = codec::decode(&memory.value(KEY).unwrap()).unwrap();
    assert_eq!(second.items(), store.products().items());
    assert_eq!(second.items().len(), 1);
}

#[tokio::test]
async fn test_restart_restores_cart_from_disk() {
    let dir = tempfile::tempdir().unwrap();

    let store = open_ready(FileStore::new(dir.path())).await;
    store.add_to_cart(product("p2", "Hat", 7)).unwrap();
    store.add_to_cart(product("p1", "Shirt", 10)).unwrap();
    store.add_to_cart(product("p1", "Shirt", 10)).unwrap();
    store.add_to_cart(product("p3", "Socks", 3)).unwrap();
    store.decrement(&product_id("p3")).unwrap();
    let before = store.products();
    store.shutdown().await.unwrap();

    let restarted = open_ready(FileStore::new(dir.path())).await;
    let after = restarted.products();

    assert_eq!(after.items(), before.items());
    assert_eq!(quantities(&after), pairs(&[("p2", 1), ("p1", 2)]));
}

#[tokio::test]
async fn test_hydrates_previously_stored_value() {
    let stored = serde_json::json!([
        {"id": "p1", "title": "Shirt", "image_url": "shirt.png", "price": 10, "quantity": 2}
    ]);
    let store = open_ready(MemoryStore::with_entry(KEY, stored.to_string())).await;

    assert_eq!(quantities(&store.products()), pairs(&[("p1", 2)]));
    let item = store.products().get(&product_id("p1")).unwrap().clone();
    assert_eq!(item.image_url, "shirt.png");
}

#[tokio::test]
async fn test_hydration_is_wholesale_replacement() {
    let memory = MemoryStore::new();
    let seed = CartStore::open(memory.clone(), &CartConfig::default());
    seed.ready().await;
    seed.add_to_cart(product("p1", "Shirt", 10)).unwrap();
    seed.add_to_cart(product("p2", "Hat", 7)).unwrap();
    seed.shutdown().await.unwrap();

    let store = open_ready(memory).await;
    assert_eq!(
        quantities(&store.products()),
        pairs(&[("p1", 1), ("p2", 1)])
    );
}

#[tokio::test]
async fn test_malformed_value_starts_empty() {
    for stored in [
        "not json",
        "{\"id\":\"p1\"}",
        "[{\"id\":\"p1\",\"title\":\"Shirt\",\"image_url\":\"s\",\"price\":\"1\",\"quantity\":0}]",
        "[{\"id\":\"p1\",\"title\":\"Shirt\",\"image_url\":\"s\",\"price\":\"1\",\"quantity\":1},\
          {\"id\":\"p1\",\"title\":\"Shirt\",\"image_url\":\"s\",\"price\":\"1\",\"quantity\":1}]",
    ] {
        let store = open_ready(MemoryStore::with_entry(KEY, stored)).await;
        assert!(store.products().is_empty(), "expected empty cart for {stored}");
        assert!(store.is_hydrated());
    }
}

#[tokio::test]
async fn test_empty_cart_after_last_removal_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FileStore::new(dir.path());

    let store = open_ready(backend.clone()).await;
    store.add_to_cart(product("p1", "Shirt", 10)).unwrap();
    store.decrement(&product_id("p1")).unwrap();
    store.shutdown().await.unwrap();

    assert_eq!(backend.get(KEY).await.unwrap().as_deref(), Some("[]"));
    let restarted = open_ready(backend).await;
    assert!(restarted.products().is_empty());
}
