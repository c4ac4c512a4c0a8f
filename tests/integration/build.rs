//! The build pipeline: hooks, constructors, sync/async behavior.

use fabrica::core::{BuildStage, FabricaError};
use fabrica::factory::Factory;
use fabrica::hooks::HookFlow;
use serde_json::{Value, json};

use crate::common::{init_tracing, ready};

#[test]
fn build_without_constructor_is_the_attribute_mapping() {
    init_tracing();
    let factory = Factory::new();
    factory.attr("name", "gizmo").attr("qty", 2);
    let built = ready(factory.build(json!({}), json!({})).unwrap());
    assert_eq!(built, json!({"name": "gizmo", "qty": 2}));
}

#[test]
fn constructor_wraps_resolved_attributes() {
    let factory = Factory::with_constructor(|attrs| {
        Ok(json!({"model": Value::Object(attrs), "saved": false}))
    });
    factory.attr("id", 1);
    let built = ready(factory.build(json!({}), json!({})).unwrap());
    assert_eq!(built, json!({"model": {"id": 1}, "saved": false}));
}

#[test]
fn before_build_hooks_can_rewrite_the_overrides() {
    let factory = Factory::new();
    factory.attr("name", "default").before_build(|overrides, _| {
        overrides["name"] = json!("injected");
        Ok(HookFlow::Continue)
    });
    let built = ready(factory.build(json!({}), json!({})).unwrap());
    assert_eq!(built["name"], json!("injected"));
}

#[test]
fn after_build_replacement_discards_the_built_object() {
    let factory = Factory::new();
    factory.attr("original", true).after_build(|_, _| {
        Ok(HookFlow::replace(json!({"something": "else"})))
    });
    let built = ready(factory.build(json!({}), json!({})).unwrap());
    assert_eq!(built, json!({"something": "else"}));
}

#[test]
fn after_build_continue_keeps_in_place_mutation() {
    let factory = Factory::new();
    factory.attr("n", 1).after_build(|object, _| {
        object["n"] = json!(object["n"].as_i64().unwrap() + 1);
        Ok(HookFlow::Continue)
    });
    let built = ready(factory.build(json!({}), json!({})).unwrap());
    assert_eq!(built["n"], json!(2));
}

#[test]
fn hooks_run_in_registration_order_across_the_pipeline() {
    let factory = Factory::new();
    factory
        .attr("trail", "start")
        .after_build(|object, _| {
            let prior = object["trail"].as_str().unwrap().to_string();
            object["trail"] = json!(format!("{prior},first"));
            Ok(HookFlow::Continue)
        })
        .after(|object, _| {
            let prior = object["trail"].as_str().unwrap().to_string();
            object["trail"] = json!(format!("{prior},second"));
            Ok(HookFlow::Continue)
        });
    let built = ready(factory.build(json!({}), json!({})).unwrap());
    assert_eq!(built["trail"], json!("start,first,second"));
}

#[test]
fn fully_synchronous_build_returns_an_immediate_value() {
    let factory = Factory::new();
    factory.attr("a", 1).after_build(|_, _| Ok(HookFlow::Continue));
    let outcome = factory.build(json!({}), json!({})).unwrap();
    assert!(outcome.is_ready());
}

#[tokio::test]
async fn one_async_hook_makes_the_build_pending_with_the_same_value() {
    let sync_factory = Factory::new();
    sync_factory.attr("n", 1).after_build(|object, _| {
        object["n"] = json!(object["n"].as_i64().unwrap() + 1);
        Ok(HookFlow::Continue)
    });
    let sync_value = ready(sync_factory.build(json!({}), json!({})).unwrap());

    let async_factory = Factory::new();
    async_factory.attr("n", 1).after_build(|object, _| {
        let mut updated = object.clone();
        Ok(HookFlow::pending(async move {
            updated["n"] = json!(updated["n"].as_i64().unwrap() + 1);
            Ok(Some(updated))
        }))
    });
    let outcome = async_factory.build(json!({}), json!({})).unwrap();
    assert!(!outcome.is_ready());
    assert_eq!(outcome.await.unwrap(), sync_value);
}

#[tokio::test]
async fn async_before_build_feeds_resolution() {
    let factory = Factory::new();
    factory
        .attr_with("label", &["id"], |deps| Ok(json!(format!("item-{}", deps[0]))))
        .attr("id", 0)
        .before_build(|overrides, _| {
            let mut seeded = overrides.clone();
            Ok(HookFlow::pending(async move {
                seeded["id"] = json!(7);
                Ok(Some(seeded))
            }))
        });
    let built = factory.build(json!({}), json!({})).unwrap().await.unwrap();
    assert_eq!(built["label"], json!("item-7"));
}

#[test]
fn failing_sync_hook_surfaces_synchronously_with_its_stage() {
    let factory = Factory::new();
    factory.before_build(|_, _| anyhow::bail!("rejected"));
    let err = factory.build(json!({}), json!({})).unwrap_err();
    assert!(matches!(err, FabricaError::HookFailed { stage: BuildStage::BeforeBuild, .. }));
}

#[tokio::test]
async fn failing_async_hook_rejects_the_future() {
    let factory = Factory::new();
    factory.after_build(|_, _| Ok(HookFlow::pending(async { anyhow::bail!("save blew up") })));
    let outcome = factory.build(json!({}), json!({})).unwrap();
    let err = outcome.await.unwrap_err();
    assert!(matches!(err, FabricaError::HookFailed { stage: BuildStage::AfterBuild, .. }));
}

#[test]
fn failing_hook_aborts_the_remaining_chain() {
    let factory = Factory::new();
    factory
        .after_build(|_, _| anyhow::bail!("first hook fails"))
        .after_build(|object, _| {
            object["unreachable"] = json!(true);
            Ok(HookFlow::Continue)
        });
    assert!(factory.build(json!({}), json!({})).is_err());
}

#[test]
fn before_build_replacing_with_non_object_is_rejected() {
    let factory = Factory::new();
    factory.before_build(|_, _| Ok(HookFlow::replace(json!("not a map"))));
    let err = factory.build(json!({}), json!({})).unwrap_err();
    assert!(matches!(err, FabricaError::InvalidOverrides { found: "string" }));
}

#[test]
fn undeclared_override_keys_survive_to_the_built_object() {
    let factory = Factory::new();
    factory.attr("declared", 1);
    let built = ready(factory.build(json!({"extra": "kept"}), json!({})).unwrap());
    assert_eq!(built, json!({"extra": "kept", "declared": 1}));
}
