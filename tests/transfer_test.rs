mod common;

use assert_matches::assert_matches;
use common::*;
use stockroom_core::{
    commands::inventory::TransferStockCommand, errors::ServiceError, events::Event,
};
use uuid::Uuid;

fn command(product_id: Uuid, from: Uuid, to: Uuid, quantity: i32) -> TransferStockCommand {
    TransferStockCommand {
        product_id,
        from_site_id: from,
        to_site_id: to,
        quantity,
        notes: None,
        performed_by: None,
    }
}

#[tokio::test]
async fn transfer_creates_destination_lazily_and_writes_mirror_entries() {
    let mut ctx = setup().await;
    let product_id = Uuid::new_v4();
    let site_a = Uuid::new_v4();
    let site_b = Uuid::new_v4();
    let source = seed_inventory(ctx.db.as_ref(), product_id, site_a, 100, 10).await;
    let actor = manager();

    let result = ctx
        .service
        .transfer_stock(Some(&actor), command(product_id, site_a, site_b, 30))
        .await
        .expect("transfer should succeed");

    assert_eq!(result.source_remaining_quantity, 70);
    assert_eq!(result.destination_quantity, 30);

    let updated_source = get_inventory_by_id(ctx.db.as_ref(), source.id).await;
    assert_eq!(updated_source.quantity, 70);
    assert_eq!(updated_source.available_quantity, 60);
    assert_eq!(updated_source.reserved_quantity, 10);

    let destination = find_inventory(ctx.db.as_ref(), product_id, site_b)
        .await
        .expect("destination record should be created");
    assert_eq!(destination.quantity, 30);
    assert_eq!(destination.reserved_quantity, 0);
    assert_eq!(destination.available_quantity, 30);

    // Conservation: nothing lost, nothing minted.
    assert_eq!(updated_source.quantity + destination.quantity, 100);

    let out_movements = movements_for(ctx.db.as_ref(), source.id).await;
    assert_eq!(out_movements.len(), 1);
    let out = &out_movements[0];
    assert_eq!(out.movement_type, "TRANSFER_OUT");
    assert_eq!(out.quantity_before, 100);
    assert_eq!(out.quantity_change, -30);
    assert_eq!(out.quantity_after, 70);
    assert_eq!(out.to_site_id, Some(site_b));
    assert_eq!(out.performed_by, Some(actor.user_id));

    let in_movements = movements_for(ctx.db.as_ref(), destination.id).await;
    assert_eq!(in_movements.len(), 1);
    let incoming = &in_movements[0];
    assert_eq!(incoming.movement_type, "TRANSFER_IN");
    assert_eq!(incoming.quantity_before, 0);
    assert_eq!(incoming.quantity_change, 30);
    assert_eq!(incoming.quantity_after, 30);
    assert_eq!(incoming.from_site_id, Some(site_a));

    assert_eq!(out.quantity_change, -incoming.quantity_change);

    let event = ctx.events.try_recv().expect("event should be published");
    assert_matches!(event, Event::StockTransferred { quantity: 30, .. });
}

#[tokio::test]
async fn transfer_credits_an_existing_destination_record() {
    let ctx = setup().await;
    let product_id = Uuid::new_v4();
    let site_a = Uuid::new_v4();
    let site_b = Uuid::new_v4();
    seed_inventory(ctx.db.as_ref(), product_id, site_a, 50, 0).await;
    let destination = seed_inventory(ctx.db.as_ref(), product_id, site_b, 5, 0).await;

    ctx.service
        .transfer_stock(Some(&admin()), command(product_id, site_a, site_b, 20))
        .await
        .expect("transfer should succeed");

    let updated_destination = get_inventory_by_id(ctx.db.as_ref(), destination.id).await;
    assert_eq!(updated_destination.quantity, 25);
    assert_eq!(updated_destination.available_quantity, 25);

    let in_movements = movements_for(ctx.db.as_ref(), destination.id).await;
    assert_eq!(in_movements.len(), 1);
    assert_eq!(in_movements[0].quantity_before, 5);
    assert_eq!(in_movements[0].quantity_after, 25);
}

#[tokio::test]
async fn transfer_to_the_same_site_is_rejected() {
    let ctx = setup().await;
    let product_id = Uuid::new_v4();
    let site_a = Uuid::new_v4();
    seed_inventory(ctx.db.as_ref(), product_id, site_a, 50, 0).await;

    let err = ctx
        .service
        .transfer_stock(Some(&admin()), command(product_id, site_a, site_a, 10))
        .await
        .expect_err("same-site transfer should be rejected");
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn transfer_beyond_available_fails_without_partial_state() {
    let mut ctx = setup().await;
    let product_id = Uuid::new_v4();
    let site_a = Uuid::new_v4();
    let site_b = Uuid::new_v4();
    let source = seed_inventory(ctx.db.as_ref(), product_id, site_a, 100, 10).await;

    let err = ctx
        .service
        .transfer_stock(Some(&admin()), command(product_id, site_a, site_b, 95))
        .await
        .expect_err("transfer should fail");
    assert_matches!(err, ServiceError::InsufficientStock(_));

    let untouched = get_inventory_by_id(ctx.db.as_ref(), source.id).await;
    assert_eq!(untouched.quantity, 100);
    assert_eq!(untouched.available_quantity, 90);
    assert!(find_inventory(ctx.db.as_ref(), product_id, site_b)
        .await
        .is_none());
    assert!(movements_for(ctx.db.as_ref(), source.id).await.is_empty());
    assert!(ctx.events.try_recv().is_err());
}

#[tokio::test]
async fn transfer_from_an_unstocked_site_is_not_found() {
    let ctx = setup().await;

    let err = ctx
        .service
        .transfer_stock(
            Some(&admin()),
            command(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), 10),
        )
        .await
        .expect_err("missing source should be rejected");
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn transfer_rejects_non_positive_quantity() {
    let ctx = setup().await;
    let product_id = Uuid::new_v4();
    let site_a = Uuid::new_v4();
    seed_inventory(ctx.db.as_ref(), product_id, site_a, 50, 0).await;

    let err = ctx
        .service
        .transfer_stock(
            Some(&admin()),
            command(product_id, site_a, Uuid::new_v4(), 0),
        )
        .await
        .expect_err("zero quantity should be rejected");
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn transfer_requires_a_write_role() {
    let ctx = setup().await;
    let product_id = Uuid::new_v4();
    let site_a = Uuid::new_v4();
    let source = seed_inventory(ctx.db.as_ref(), product_id, site_a, 50, 0).await;

    let err = ctx
        .service
        .transfer_stock(
            Some(&staff()),
            command(product_id, site_a, Uuid::new_v4(), 10),
        )
        .await
        .expect_err("staff may not transfer");
    assert_matches!(err, ServiceError::Forbidden(_));

    let untouched = get_inventory_by_id(ctx.db.as_ref(), source.id).await;
    assert_eq!(untouched.quantity, 50);
}
