//! Factory inheritance via extend.

use fabrica::factory::Factory;
use fabrica::hooks::HookFlow;
use fabrica::registry::Registry;
use serde_json::json;

use crate::common::ready;

#[test]
fn child_uses_parent_attribute_and_option_specs() {
    let parent = Factory::new();
    parent
        .attr("kind", "animal")
        .option_value("loud", false)
        .attr_with("sound", &["loud"], |deps| {
            Ok(json!(if deps[0] == json!(true) { "ROAR" } else { "purr" }))
        });

    let child = Factory::new();
    child.extend(&parent).attr("kind", "cat");

    let attrs = child.attributes(json!({}), json!({"loud": true})).unwrap();
    assert_eq!(attrs["kind"], json!("cat"));
    assert_eq!(attrs["sound"], json!("ROAR"));
}

#[test]
fn specs_are_copies_not_aliases() {
    let parent = Factory::new();
    parent.attr("color", "red");
    let child = Factory::new();
    child.extend(&parent);

    parent.attr("color", "blue").attr("added_later", 1);

    let attrs = child.attributes(json!({}), json!({})).unwrap();
    assert_eq!(attrs["color"], json!("red"));
    assert!(!attrs.contains_key("added_later"));
}

#[test]
fn constructor_is_inherited_only_when_child_has_none() {
    let parent = Factory::with_constructor(|_| Ok(json!("parent")));

    let plain_child = Factory::new();
    plain_child.extend(&parent);
    assert_eq!(ready(plain_child.build(json!({}), json!({})).unwrap()), json!("parent"));

    let constructing_child = Factory::with_constructor(|_| Ok(json!("child")));
    constructing_child.extend(&parent);
    assert_eq!(ready(constructing_child.build(json!({}), json!({})).unwrap()), json!("child"));
}

#[test]
fn create_handler_is_inherited_only_when_child_has_none() {
    let parent = Factory::new();
    parent.on_create(|_, _| Ok(HookFlow::replace(json!("parent-created"))));

    let child = Factory::new();
    child.on_create(|_, _| Ok(HookFlow::replace(json!("child-created"))));
    child.extend(&parent);

    assert_eq!(ready(child.create(json!({}), json!({})).unwrap()), json!("child-created"));
}

#[test]
fn hook_lists_become_copies_of_the_parents() {
    let parent = Factory::new();
    parent.after_build(|object, _| {
        object["stamped"] = json!("parent");
        Ok(HookFlow::Continue)
    });
    let child = Factory::new();
    child.extend(&parent);

    // Hooks added to the parent afterwards do not leak into the child.
    parent.after_build(|object, _| {
        object["stamped"] = json!("parent-late");
        Ok(HookFlow::Continue)
    });

    let built = ready(child.build(json!({}), json!({})).unwrap());
    assert_eq!(built["stamped"], json!("parent"));
}

#[test]
fn inherited_sequences_share_the_parent_stream() {
    let registry = Registry::new();
    let parent = registry.define("base");
    parent.sequence("id");
    let child = registry.define("derived");
    child.extend(&registry.get("base").unwrap());

    assert_eq!(registry.attributes("base", json!({}), json!({})).unwrap()["id"], json!(1));
    assert_eq!(registry.attributes("derived", json!({}), json!({})).unwrap()["id"], json!(2));
    assert_eq!(registry.attributes("base", json!({}), json!({})).unwrap()["id"], json!(3));
}

#[test]
fn extend_chain_carries_specs_through_generations() {
    let base = Factory::new();
    base.attr("a", 1);
    let middle = Factory::new();
    middle.extend(&base).attr("b", 2);
    let leaf = Factory::new();
    leaf.extend(&middle).attr("c", 3);

    let attrs = leaf.attributes(json!({}), json!({})).unwrap();
    assert_eq!(attrs["a"], json!(1));
    assert_eq!(attrs["b"], json!(2));
    assert_eq!(attrs["c"], json!(3));
}
