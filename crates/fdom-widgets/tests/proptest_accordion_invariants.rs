//! Property-based invariant tests for the accordion.
//!
//! 1. Header `aria-expanded` and panel `hidden` agree after every click.
//! 2. With `multiple: false` at most one item is open.
//! 3. Clicks only ever patch: the root element keeps its identity.
//! 4. The open set matches a reference model of toggle semantics.

use std::collections::BTreeSet;

use fdom_core::{Element, props};
use fdom_runtime::{Factory, Host, Instance};
use fdom_widgets::accordion;
use fdom_widgets::accordion::open_items;
use proptest::prelude::*;

fn items(n: usize) -> serde_json::Value {
    (0..n)
        .map(|i| serde_json::json!({ "title": format!("t{i}"), "content": format!("c{i}") }))
        .collect()
}

fn headers(inst: &Instance) -> Vec<Element> {
    inst.element()
        .map(|root| root.query_class("fdom-accordion__header"))
        .unwrap_or_default()
}

fn panels(inst: &Instance) -> Vec<Element> {
    inst.element()
        .map(|root| root.query_class("fdom-accordion__panel"))
        .unwrap_or_default()
}

fn model_click(open: &mut BTreeSet<usize>, multiple: bool, index: usize) {
    let was_open = open.contains(&index);
    if !multiple {
        open.clear();
    }
    if was_open {
        open.remove(&index);
    } else {
        open.insert(index);
    }
}

proptest! {
    #[test]
    fn clicks_follow_toggle_model(
        count in 1usize..6,
        multiple in any::<bool>(),
        clicks in prop::collection::vec(0usize..6, 0..24),
    ) {
        let host = Host::new();
        let inst = accordion()
            .create(&host, props!({ "items": items(count), "multiple": multiple }))
            .unwrap();
        let root = inst.element().unwrap();
        let mut model = BTreeSet::new();

        for index in clicks.into_iter().filter(|i| *i < count) {
            headers(&inst)[index].click();
            model_click(&mut model, multiple, index);

            prop_assert_eq!(inst.element().unwrap(), root.clone());
            prop_assert_eq!(open_items(&inst), model.iter().copied().collect::<Vec<_>>());
            if !multiple {
                prop_assert!(open_items(&inst).len() <= 1);
            }
            for (header, panel) in headers(&inst).iter().zip(panels(&inst)) {
                let expanded = header.attribute("aria-expanded").unwrap_or_default() == "true";
                prop_assert_eq!(expanded, !panel.has_attribute("hidden"));
            }
        }
    }

    #[test]
    fn single_mode_keeps_first_valid_index(
        count in 1usize..6,
        open in prop::collection::vec(0u64..8, 0..6),
    ) {
        let host = Host::new();
        let inst = accordion()
            .create(&host, props!({ "items": items(count), "open": open.clone() }))
            .unwrap();
        let expected: Vec<usize> = open
            .iter()
            .filter_map(|i| usize::try_from(*i).ok())
            .find(|i| *i < count)
            .into_iter()
            .collect();
        prop_assert_eq!(open_items(&inst), expected);
    }
}
