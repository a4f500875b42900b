//! Integration tests for resource group reconciliation.
//!
//! These tests run the real `Reconciler` against the in-memory repository and a
//! mock inventory source.

mod common;

use cloud_inventory_pipeline::{SyncError, SyncPolicy};
use cloud_inventory_repository::{
    EventFilter, EventLogRepository, ResourceGroupRepository, ResourceRepository,
    SubscriptionRepository,
};
use cloud_inventory_shared::{EntityKind, EventAction, PatchOperation, SyncTally};
use common::*;
use serde_json::json;

#[tokio::test]
async fn test_create_on_first_sight() {
    let h = harness().await;
    h.source.set_groups(
        SUBSCRIPTION,
        vec![
            make_group(SUBSCRIPTION, "RG_A"),
            make_group(SUBSCRIPTION, "RG_B"),
            make_group(SUBSCRIPTION, "RG_C"),
        ],
    );

    let tally = h.reconciler.sync_resource_groups(SUBSCRIPTION).await.unwrap();
    assert_eq!(tally, SyncTally::new(0, 3, 0, 0));

    let groups = h.repository.list_resource_groups(SUBSCRIPTION).await.unwrap();
    assert_eq!(groups.len(), 3);
    let group = &groups[0];
    assert_eq!(group.resource_id, group.resource_id.to_lowercase());
    assert_eq!(group.name, "RG_A");
    assert_eq!(group.company.as_deref(), Some("acme"));
    assert_eq!(group.resource_type, GROUP_TYPE);
    assert_eq!(group.tags["env"], "prod");
    assert_eq!(group.metas, json!({"provisioningState": "Succeeded"}));

    let creates = h
        .repository
        .list_events(&EventFilter::all().with_action(EventAction::Create))
        .await
        .unwrap();
    assert_eq!(creates.len(), 3);
    assert!(creates.iter().all(|event| event.old_object.is_none()));
    let snapshot = creates[0].new_object.as_ref().unwrap();
    assert!(snapshot.get("created_at").is_none());
    assert!(snapshot.get("updated_at").is_none());
}

#[tokio::test]
async fn test_second_run_with_unchanged_snapshot_is_a_no_op() {
    let h = harness().await;
    h.source.set_groups(
        SUBSCRIPTION,
        vec![make_group(SUBSCRIPTION, "RG_A"), make_group(SUBSCRIPTION, "RG_B")],
    );

    h.reconciler.sync_resource_groups(SUBSCRIPTION).await.unwrap();
    let events_after_first = h.repository.list_events(&EventFilter::all()).await.unwrap().len();

    let tally = h.reconciler.sync_resource_groups(SUBSCRIPTION).await.unwrap();
    assert_eq!(tally, SyncTally::new(0, 0, 0, 0));
    assert_eq!(
        h.repository.list_events(&EventFilter::all()).await.unwrap().len(),
        events_after_first
    );
}

#[tokio::test]
async fn test_update_is_recorded_only_when_patch_is_non_empty() {
    let h = harness().await;
    h.source.set_groups(SUBSCRIPTION, vec![make_group(SUBSCRIPTION, "RG_A")]);
    h.reconciler.sync_resource_groups(SUBSCRIPTION).await.unwrap();

    let changed = with_field(
        make_group(SUBSCRIPTION, "RG_A"),
        "tags",
        json!({"env": "prod", "team": "core"}),
    );
    h.source.set_groups(SUBSCRIPTION, vec![changed.clone()]);

    let tally = h.reconciler.sync_resource_groups(SUBSCRIPTION).await.unwrap();
    assert_eq!(tally, SyncTally::new(0, 0, 1, 0));

    let updates = h
        .repository
        .list_events(&EventFilter::all().with_action(EventAction::Update))
        .await
        .unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(
        updates[0].changes,
        Some(vec![PatchOperation::Add {
            path: "/tags/team".to_string(),
            value: json!("core"),
        }])
    );
    assert_eq!(updates[0].old_object.as_ref().unwrap()["tags"], json!({"env": "prod"}));

    h.source.set_groups(SUBSCRIPTION, vec![changed]);
    let tally = h.reconciler.sync_resource_groups(SUBSCRIPTION).await.unwrap();
    assert_eq!(tally.updated, 0);
    assert_eq!(
        h.repository
            .list_events(&EventFilter::all().with_action(EventAction::Update))
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_disappeared_groups_are_soft_deleted() {
    let h = harness().await;
    h.source.set_groups(
        SUBSCRIPTION,
        vec![make_group(SUBSCRIPTION, "RG_A"), make_group(SUBSCRIPTION, "RG_B")],
    );
    h.reconciler.sync_resource_groups(SUBSCRIPTION).await.unwrap();

    h.source.set_groups(SUBSCRIPTION, vec![]);
    let tally = h.reconciler.sync_resource_groups(SUBSCRIPTION).await.unwrap();
    assert_eq!(tally, SyncTally::new(0, 0, 0, 2));

    let deletes = h
        .repository
        .list_events(&EventFilter::all().with_action(EventAction::Delete))
        .await
        .unwrap();
    assert_eq!(deletes.len(), 2);
    for event in &deletes {
        let old_object = event.old_object.as_ref().unwrap();
        assert_eq!(old_object["deleted"], json!(false));
        assert_eq!(old_object["name"].as_str().map(|name| name.starts_with("RG_")), Some(true));
        assert!(event.new_object.is_none());
    }

    assert!(h.repository.list_resource_groups(SUBSCRIPTION).await.unwrap().is_empty());
    assert_eq!(h.repository.list_all_resource_groups(SUBSCRIPTION).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_unknown_type_is_isolated() {
    let h = harness().await;
    h.source.set_groups(
        SUBSCRIPTION,
        vec![
            make_group(SUBSCRIPTION, "RG_A"),
            with_field(make_group(SUBSCRIPTION, "RG_BAD"), "type", json!("Microsoft.Unknown/things")),
            make_group(SUBSCRIPTION, "RG_B"),
        ],
    );

    let tally = h.reconciler.sync_resource_groups(SUBSCRIPTION).await.unwrap();
    assert_eq!(tally, SyncTally::new(1, 2, 0, 0));
    assert_eq!(h.repository.list_resource_groups(SUBSCRIPTION).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_unknown_type_does_not_delete_existing_group() {
    let h = harness().await;
    h.source.set_groups(SUBSCRIPTION, vec![make_group(SUBSCRIPTION, "RG_A")]);
    h.reconciler.sync_resource_groups(SUBSCRIPTION).await.unwrap();

    h.source.set_groups(
        SUBSCRIPTION,
        vec![with_field(make_group(SUBSCRIPTION, "RG_A"), "type", json!("Microsoft.Unknown/things"))],
    );
    let tally = h.reconciler.sync_resource_groups(SUBSCRIPTION).await.unwrap();

    assert_eq!(tally, SyncTally::new(1, 0, 0, 0));
    assert_eq!(h.repository.list_resource_groups(SUBSCRIPTION).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_type_lookup_ignores_case() {
    let h = harness().await;
    h.source.set_groups(
        SUBSCRIPTION,
        vec![with_field(
            make_group(SUBSCRIPTION, "RG_A"),
            "type",
            json!("microsoft.resources/RESOURCEGROUPS"),
        )],
    );

    let tally = h.reconciler.sync_resource_groups(SUBSCRIPTION).await.unwrap();
    assert_eq!(tally.created, 1);
    let groups = h.repository.list_resource_groups(SUBSCRIPTION).await.unwrap();
    assert_eq!(groups[0].resource_type, GROUP_TYPE);
}

#[tokio::test]
async fn test_malformed_tags_and_properties_are_empty() {
    let h = harness().await;
    let record = with_field(
        with_field(make_group(SUBSCRIPTION, "RG_A"), "tags", json!(null)),
        "properties",
        json!("garbage"),
    );
    h.source.set_groups(SUBSCRIPTION, vec![record]);

    let tally = h.reconciler.sync_resource_groups(SUBSCRIPTION).await.unwrap();
    assert_eq!(tally.created, 1);

    let group = &h.repository.list_resource_groups(SUBSCRIPTION).await.unwrap()[0];
    assert!(group.tags.is_empty());
    assert_eq!(group.metas, json!({}));
}

#[tokio::test]
async fn test_create_events_can_be_disabled() {
    let policy = SyncPolicy {
        emit_create_events: false,
        ..SyncPolicy::default()
    };
    let h = harness_with(policy, MockAuthenticator::new()).await;
    h.source.set_groups(SUBSCRIPTION, vec![make_group(SUBSCRIPTION, "RG_A")]);

    let tally = h.reconciler.sync_resource_groups(SUBSCRIPTION).await.unwrap();
    assert_eq!(tally.created, 1);
    assert!(h.repository.list_events(&EventFilter::all()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reappearing_group_is_revived() {
    let h = harness().await;
    h.source.set_groups(SUBSCRIPTION, vec![make_group(SUBSCRIPTION, "RG_A")]);
    h.reconciler.sync_resource_groups(SUBSCRIPTION).await.unwrap();
    h.source.set_groups(SUBSCRIPTION, vec![]);
    h.reconciler.sync_resource_groups(SUBSCRIPTION).await.unwrap();

    h.source.set_groups(SUBSCRIPTION, vec![make_group(SUBSCRIPTION, "RG_A")]);
    let tally = h.reconciler.sync_resource_groups(SUBSCRIPTION).await.unwrap();
    assert_eq!(tally, SyncTally::new(0, 1, 0, 0));

    let resource_id = group_id(SUBSCRIPTION, "RG_A").to_lowercase();
    let history = h
        .repository
        .list_events(&EventFilter::for_target(EntityKind::ResourceGroup, resource_id))
        .await
        .unwrap();
    let actions: Vec<EventAction> = history.iter().map(|event| event.action).collect();
    assert_eq!(
        actions,
        vec![EventAction::Create, EventAction::Delete, EventAction::Create]
    );
}

#[tokio::test]
async fn test_delete_pass_is_scoped_to_subscription() {
    let h = harness().await;
    h.source.set_groups(SUBSCRIPTION, vec![make_group(SUBSCRIPTION, "RG_A")]);
    h.source.set_groups(OTHER_SUBSCRIPTION, vec![make_group(OTHER_SUBSCRIPTION, "RG_X")]);
    h.reconciler.sync_resource_groups(SUBSCRIPTION).await.unwrap();
    h.reconciler.sync_resource_groups(OTHER_SUBSCRIPTION).await.unwrap();

    h.source.set_groups(SUBSCRIPTION, vec![]);
    let tally = h.reconciler.sync_resource_groups(SUBSCRIPTION).await.unwrap();

    assert_eq!(tally.deleted, 1);
    assert_eq!(h.repository.list_resource_groups(OTHER_SUBSCRIPTION).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_cascade_deletes_child_resources_when_enabled() {
    let policy = SyncPolicy {
        cascade_group_deletes: true,
        ..SyncPolicy::default()
    };
    let h = harness_with(policy, MockAuthenticator::new()).await;
    h.source.set_groups(SUBSCRIPTION, vec![make_group(SUBSCRIPTION, "RG_A")]);
    h.source.set_resources(
        SUBSCRIPTION,
        vec![
            make_resource(SUBSCRIPTION, "RG_A", "one", STORAGE_TYPE),
            make_resource(SUBSCRIPTION, "RG_A", "two", SITE_TYPE),
        ],
    );
    h.reconciler.sync_resource_groups(SUBSCRIPTION).await.unwrap();
    h.reconciler.sync_resources(SUBSCRIPTION).await.unwrap();

    h.source.set_groups(SUBSCRIPTION, vec![]);
    let tally = h.reconciler.sync_resource_groups(SUBSCRIPTION).await.unwrap();

    assert_eq!(tally, SyncTally::new(0, 0, 0, 1));
    assert!(h.repository.list_resources(SUBSCRIPTION).await.unwrap().is_empty());
    let resource_deletes = h
        .repository
        .list_events(
            &EventFilter::all()
                .with_kind(EntityKind::Resource)
                .with_action(EventAction::Delete),
        )
        .await
        .unwrap();
    assert_eq!(resource_deletes.len(), 2);
}

#[tokio::test]
async fn test_child_resources_survive_group_deletion_by_default() {
    let h = harness().await;
    h.source.set_groups(SUBSCRIPTION, vec![make_group(SUBSCRIPTION, "RG_A")]);
    h.source.set_resources(
        SUBSCRIPTION,
        vec![make_resource(SUBSCRIPTION, "RG_A", "one", STORAGE_TYPE)],
    );
    h.reconciler.sync_resource_groups(SUBSCRIPTION).await.unwrap();
    h.reconciler.sync_resources(SUBSCRIPTION).await.unwrap();

    h.source.set_groups(SUBSCRIPTION, vec![]);
    h.reconciler.sync_resource_groups(SUBSCRIPTION).await.unwrap();

    assert_eq!(h.repository.list_resources(SUBSCRIPTION).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_subscription_fails_the_run() {
    let h = harness().await;
    let result = h.reconciler.sync_resource_groups("missing").await;
    assert!(matches!(result, Err(SyncError::SubscriptionNotFound(id)) if id == "missing"));
}

#[tokio::test]
async fn test_inactive_subscription_fails_the_run() {
    let h = harness().await;
    h.repository
        .upsert_subscription(&subscription(SUBSCRIPTION, false))
        .await
        .unwrap();

    let result = h.reconciler.sync_resource_groups(SUBSCRIPTION).await;
    assert!(matches!(result, Err(SyncError::SubscriptionInactive(_))));
}

#[tokio::test]
async fn test_authentication_failure_fails_the_run() {
    let h = harness_with(SyncPolicy::default(), MockAuthenticator::failing()).await;
    h.source.set_groups(SUBSCRIPTION, vec![make_group(SUBSCRIPTION, "RG_A")]);

    let result = h.reconciler.sync_resource_groups(SUBSCRIPTION).await;
    assert!(matches!(result, Err(SyncError::Source(_))));
    assert!(h.repository.list_resource_groups(SUBSCRIPTION).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_listing_failure_fails_the_run() {
    let h = harness().await;
    h.source.set_groups(SUBSCRIPTION, vec![make_group(SUBSCRIPTION, "RG_A")]);
    h.source.fail_listing();

    let result = h.reconciler.sync_resource_groups(SUBSCRIPTION).await;
    assert!(matches!(result, Err(SyncError::Source(_))));
}

#[tokio::test]
async fn test_run_where_every_record_fails_still_returns_tally() {
    let h = harness().await;
    h.source.set_groups(
        SUBSCRIPTION,
        vec![
            with_field(make_group(SUBSCRIPTION, "A"), "type", json!("Nope/a")),
            with_field(make_group(SUBSCRIPTION, "B"), "type", json!("Nope/b")),
        ],
    );

    let tally = h.reconciler.sync_resource_groups(SUBSCRIPTION).await.unwrap();
    assert_eq!(tally, SyncTally::new(2, 0, 0, 0));
}

#[tokio::test]
async fn test_group_owned_by_other_subscription_is_isolated() {
    let h = harness().await;
    h.source.set_groups(OTHER_SUBSCRIPTION, vec![make_group(SUBSCRIPTION, "shared")]);
    let tally = h.reconciler.sync_resource_groups(OTHER_SUBSCRIPTION).await.unwrap();
    assert_eq!(tally.created, 1);

    h.source.set_groups(
        SUBSCRIPTION,
        vec![
            make_group(SUBSCRIPTION, "a"),
            make_group(SUBSCRIPTION, "shared"),
            make_group(SUBSCRIPTION, "b"),
        ],
    );
    let tally = h.reconciler.sync_resource_groups(SUBSCRIPTION).await.unwrap();

    assert_eq!(tally, SyncTally::new(1, 2, 0, 0));
    assert_eq!(h.repository.list_resource_groups(SUBSCRIPTION).await.unwrap().len(), 2);
    let other = h.repository.list_resource_groups(OTHER_SUBSCRIPTION).await.unwrap();
    assert_eq!(other.len(), 1);
    assert_eq!(other[0].resource_id, group_id(SUBSCRIPTION, "shared").to_lowercase());
}
