//! Batch building with build_list and create_list.

use fabrica::core::FabricaError;
use fabrica::factory::Factory;
use fabrica::hooks::HookFlow;
use serde_json::json;

#[test]
fn build_list_returns_n_independent_items() {
    let factory = Factory::new();
    factory.sequence("id").attr("kind", "widget");
    let items = factory
        .build_list(3, json!({}), json!({}))
        .unwrap()
        .into_ready()
        .unwrap();
    assert_eq!(
        items,
        vec![
            json!({"id": 1, "kind": "widget"}),
            json!({"id": 2, "kind": "widget"}),
            json!({"id": 3, "kind": "widget"}),
        ]
    );
}

#[test]
fn build_list_of_zero_is_empty_and_ready() {
    let factory = Factory::new();
    factory.sequence("id");
    let items = factory.build_list(0, json!({}), json!({})).unwrap().into_ready().unwrap();
    assert!(items.is_empty());
}

#[test]
fn overrides_apply_to_every_item() {
    let factory = Factory::new();
    factory.sequence("id").attr("tier", "free");
    let items = factory
        .build_list(2, json!({"tier": "pro"}), json!({}))
        .unwrap()
        .into_ready()
        .unwrap();
    assert!(items.iter().all(|item| item["tier"] == json!("pro")));
}

#[test]
fn sync_list_is_an_immediate_collection() {
    let factory = Factory::new();
    factory.attr("a", 1);
    let outcome = factory.build_list(2, json!({}), json!({})).unwrap();
    assert!(outcome.is_ready());
}

#[tokio::test]
async fn one_async_item_makes_the_whole_list_pending_in_index_order() {
    let factory = Factory::new();
    factory.sequence("id").after_build(|object, _| {
        let updated = object.clone();
        Ok(HookFlow::pending(async move { Ok(Some(updated)) }))
    });
    let outcome = factory.build_list(3, json!({}), json!({})).unwrap();
    assert!(!outcome.is_ready());
    let items = outcome.await.unwrap();
    let ids: Vec<_> = items.iter().map(|item| item["id"].clone()).collect();
    assert_eq!(ids, vec![json!(1), json!(2), json!(3)]);
}

#[tokio::test]
async fn create_list_drives_every_item_through_the_handler() {
    let factory = Factory::new();
    factory.sequence("id").on_create(|object, _| {
        let mut saved = object.clone();
        Ok(HookFlow::pending(async move {
            saved["saved"] = json!(true);
            Ok(Some(saved))
        }))
    });
    let items = factory.create_list(2, json!({}), json!({})).unwrap().await.unwrap();
    assert_eq!(
        items,
        vec![json!({"id": 1, "saved": true}), json!({"id": 2, "saved": true})]
    );
}

#[test]
fn a_failing_item_propagates_the_error() {
    let factory = Factory::new();
    factory.option("required").attr_with("echo", &["required"], |d| Ok(d[0].clone()));
    let err = factory.build_list(2, json!({}), json!({})).unwrap_err();
    assert!(matches!(err, FabricaError::MissingOptionDefault { name } if name == "required"));
}

#[tokio::test]
async fn async_item_failure_rejects_the_aggregate() {
    let factory = Factory::new();
    factory.after_build(|_, _| Ok(HookFlow::pending(async { anyhow::bail!("item exploded") })));
    let outcome = factory.build_list(2, json!({}), json!({})).unwrap();
    assert!(outcome.await.is_err());
}
