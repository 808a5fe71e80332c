//! Integration tests for cart mutations.
//!
//! These tests drive `CartManager` against in-memory stock and storage and
//! check the in-memory cart, the persisted cart and the user notices after
//! each operation.

use rocketshoes_cart::notify::{ADD_FAILED, OUT_OF_STOCK, REMOVE_FAILED, UPDATE_FAILED};
use rocketshoes_cart::{CartError, Outcome, StockError, StoreError};
use rocketshoes_core::ProductId;
use rocketshoes_integration_tests::{FakeStock, FlakyStore, Harness, cart_of, sneaker};

// =============================================================================
// Add
// =============================================================================

#[tokio::test]
async fn test_add_to_empty_cart() {
    let h = Harness::load(FakeStock::new().with_stock(1, 10), FlakyStore::new()).await;

    let outcome = h.manager.add_product(ProductId::new(1)).await;

    assert!(outcome.is_committed());
    let cart = h.manager.cart();
    assert_eq!(cart.len(), 1);
    let line = cart.get(ProductId::new(1)).unwrap();
    assert_eq!(line.amount(), 1);
    assert_eq!(line.details, sneaker(1));
    assert_eq!(h.store.stored_cart().as_ref(), Some(&*cart));
    assert!(h.notices.messages().is_empty());
}

#[tokio::test]
async fn test_add_at_stock_ceiling() {
    let h = Harness::load(
        FakeStock::new().with_stock(1, 5),
        FlakyStore::seeded(&cart_of(&[(1, 5)])),
    )
    .await;

    let outcome = h.manager.add_product(ProductId::new(1)).await;

    assert!(matches!(
        outcome,
        Outcome::Failed(CartError::OutOfStock {
            requested: 6,
            available: 5,
            ..
        })
    ));
    assert_eq!(*h.manager.cart(), cart_of(&[(1, 5)]));
    assert_eq!(h.store.writes(), 0);
    assert_eq!(h.notices.messages(), vec![OUT_OF_STOCK]);
}

#[tokio::test]
async fn test_add_increment_keeps_position() {
    let h = Harness::load(
        FakeStock::new().with_stock(1, 9).with_stock(2, 9),
        FlakyStore::seeded(&cart_of(&[(2, 1), (1, 1)])),
    )
    .await;

    h.manager.add_product(ProductId::new(2)).await;

    assert_eq!(*h.manager.cart(), cart_of(&[(2, 2), (1, 1)]));
    // Metadata is only fetched for a first addition
    assert_eq!(h.stock.product_calls(), 0);
}

#[tokio::test]
async fn test_add_new_product_appends() {
    let h = Harness::load(
        FakeStock::new().with_stock(1, 9).with_stock(3, 9),
        FlakyStore::seeded(&cart_of(&[(1, 2)])),
    )
    .await;

    h.manager.add_product(ProductId::new(3)).await;

    assert_eq!(*h.manager.cart(), cart_of(&[(1, 2), (3, 1)]));
    assert_eq!(h.stock.product_calls(), 1);
}

#[tokio::test]
async fn test_add_first_unit_with_zero_stock() {
    let h = Harness::load(FakeStock::new().with_stock(6, 0), FlakyStore::new()).await;

    assert!(h.manager.add_product(ProductId::new(6)).await.is_committed());
    assert_eq!(h.amount(6), Some(1));

    // The second unit is checked
    let outcome = h.manager.add_product(ProductId::new(6)).await;
    assert!(matches!(outcome.error(), Some(CartError::OutOfStock { .. })));
    assert_eq!(h.amount(6), Some(1));
}

#[tokio::test]
async fn test_add_unknown_product() {
    let h = Harness::load(FakeStock::new(), FlakyStore::new()).await;

    let outcome = h.manager.add_product(ProductId::new(42)).await;

    assert!(matches!(
        outcome.error(),
        Some(CartError::Stock(StockError::NotFound(_)))
    ));
    assert!(h.manager.cart().is_empty());
    assert!(h.store.raw().is_none());
    assert_eq!(h.notices.messages(), vec![ADD_FAILED]);
}

#[tokio::test]
async fn test_add_with_stock_service_down() {
    let h = Harness::load(
        FakeStock::new().with_stock(1, 5),
        FlakyStore::seeded(&cart_of(&[(1, 1)])),
    )
    .await;
    h.stock.fail_lookups(true);

    let outcome = h.manager.add_product(ProductId::new(1)).await;

    assert!(matches!(outcome.error(), Some(CartError::Stock(_))));
    assert_eq!(h.amount(1), Some(1));
    assert_eq!(h.notices.messages(), vec![ADD_FAILED]);
}

// =============================================================================
// Remove
// =============================================================================

#[tokio::test]
async fn test_remove_then_remove_again() {
    let h = Harness::load(FakeStock::new(), FlakyStore::seeded(&cart_of(&[(2, 3)]))).await;

    assert!(h.manager.remove_product(ProductId::new(2)).await.is_committed());
    assert!(h.manager.cart().is_empty());
    assert_eq!(h.store.stored_cart(), Some(cart_of(&[])));
    assert!(h.notices.messages().is_empty());

    let outcome = h.manager.remove_product(ProductId::new(2)).await;
    assert!(matches!(outcome.error(), Some(CartError::NotInCart(_))));
    assert!(h.manager.cart().is_empty());
    assert_eq!(h.store.writes(), 1);
    assert_eq!(h.notices.messages(), vec![REMOVE_FAILED]);
}

#[tokio::test]
async fn test_remove_does_not_touch_stock() {
    let h = Harness::load(FakeStock::new(), FlakyStore::seeded(&cart_of(&[(1, 1), (2, 1)]))).await;
    h.stock.fail_lookups(true);

    assert!(h.manager.remove_product(ProductId::new(1)).await.is_committed());
    assert_eq!(*h.manager.cart(), cart_of(&[(2, 1)]));
    assert_eq!(h.stock.stock_calls(), 0);
}

// =============================================================================
// Update amount
// =============================================================================

#[tokio::test]
async fn test_update_within_stock() {
    let h = Harness::load(
        FakeStock::new().with_stock(3, 8),
        FlakyStore::seeded(&cart_of(&[(3, 2)])),
    )
    .await;

    let outcome = h.manager.update_product_amount(ProductId::new(3), 6).await;

    assert!(outcome.is_committed());
    assert_eq!(h.amount(3), Some(6));
    assert_eq!(h.store.stored_cart(), Some(cart_of(&[(3, 6)])));
}

#[tokio::test]
async fn test_update_can_decrease() {
    let h = Harness::load(
        FakeStock::new().with_stock(3, 8),
        FlakyStore::seeded(&cart_of(&[(3, 7)])),
    )
    .await;

    h.manager.update_product_amount(ProductId::new(3), 1).await;
    assert_eq!(h.amount(3), Some(1));
}

#[tokio::test]
async fn test_update_beyond_stock() {
    let h = Harness::load(
        FakeStock::new().with_stock(3, 8),
        FlakyStore::seeded(&cart_of(&[(3, 2)])),
    )
    .await;

    let outcome = h.manager.update_product_amount(ProductId::new(3), 9).await;

    assert!(matches!(outcome.error(), Some(CartError::OutOfStock { .. })));
    assert_eq!(h.amount(3), Some(2));
    assert_eq!(h.store.writes(), 0);
    assert_eq!(h.notices.messages(), vec![OUT_OF_STOCK]);
}

#[tokio::test]
async fn test_update_absent_product() {
    let h = Harness::load(
        FakeStock::new().with_stock(99, 4),
        FlakyStore::seeded(&cart_of(&[(1, 1)])),
    )
    .await;

    let outcome = h.manager.update_product_amount(ProductId::new(99), 1).await;

    assert!(matches!(outcome.error(), Some(CartError::NotInCart(_))));
    assert_eq!(*h.manager.cart(), cart_of(&[(1, 1)]));
    assert_eq!(h.notices.messages(), vec![UPDATE_FAILED]);
}

#[tokio::test]
async fn test_update_non_positive_is_silent() {
    let h = Harness::load(
        FakeStock::new().with_stock(1, 8),
        FlakyStore::seeded(&cart_of(&[(1, 2)])),
    )
    .await;

    for amount in [0, -1, i64::MIN] {
        let outcome = h.manager.update_product_amount(ProductId::new(1), amount).await;
        assert!(matches!(outcome, Outcome::Ignored));
    }

    assert_eq!(h.amount(1), Some(2));
    assert_eq!(h.stock.stock_calls(), 0);
    assert_eq!(h.store.writes(), 0);
    assert!(h.notices.messages().is_empty());
}

// =============================================================================
// Persistence failures
// =============================================================================

#[tokio::test]
async fn test_failed_write_leaves_cart_unchanged() {
    let h = Harness::load(
        FakeStock::new().with_stock(1, 8).with_stock(2, 8),
        FlakyStore::seeded(&cart_of(&[(1, 1)])),
    )
    .await;
    h.store.fail_writes(true);

    let add = h.manager.add_product(ProductId::new(1)).await;
    let append = h.manager.add_product(ProductId::new(2)).await;
    let update = h.manager.update_product_amount(ProductId::new(1), 4).await;
    let remove = h.manager.remove_product(ProductId::new(1)).await;

    for outcome in [&add, &append, &update, &remove] {
        assert!(matches!(
            outcome.error(),
            Some(CartError::Store(StoreError::Io(_)))
        ));
    }
    assert_eq!(*h.manager.cart(), cart_of(&[(1, 1)]));
    assert_eq!(h.store.stored_cart(), Some(cart_of(&[(1, 1)])));
    assert_eq!(
        h.notices.messages(),
        vec![ADD_FAILED, ADD_FAILED, UPDATE_FAILED, REMOVE_FAILED]
    );
}

#[tokio::test]
async fn test_recovers_after_write_failure() {
    let h = Harness::load(FakeStock::new().with_stock(1, 8), FlakyStore::new()).await;

    h.store.fail_writes(true);
    h.manager.add_product(ProductId::new(1)).await;
    assert!(h.manager.cart().is_empty());

    h.store.fail_writes(false);
    assert!(h.manager.add_product(ProductId::new(1)).await.is_committed());
    assert_eq!(h.amount(1), Some(1));
    assert_eq!(h.store.stored_cart(), Some(cart_of(&[(1, 1)])));
}

// =============================================================================
// Loading
// =============================================================================

#[tokio::test]
async fn test_cart_survives_new_session() {
    let h = Harness::load(
        FakeStock::new().with_stock(1, 8).with_stock(2, 8),
        FlakyStore::new(),
    )
    .await;
    h.manager.add_product(ProductId::new(2)).await;
    h.manager.add_product(ProductId::new(1)).await;
    h.manager.update_product_amount(ProductId::new(2), 3).await;

    let stored = h.store.stored_cart().unwrap();
    let next = Harness::load(FakeStock::new(), FlakyStore::seeded(&stored)).await;

    assert_eq!(*next.manager.cart(), cart_of(&[(2, 3), (1, 1)]));
}
