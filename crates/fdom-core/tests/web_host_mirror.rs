#![cfg(all(feature = "web", target_arch = "wasm32"))]
//! Browser host mirroring. Run with
//! `wasm-pack test --headless --firefox crates/fdom-core --features web`.

use std::cell::Cell;
use std::rc::Rc;

use fdom_core::web::wasm_bindgen::JsCast;
use fdom_core::web::web_sys;
use fdom_core::{Document, Element, el};
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};

wasm_bindgen_test_configure!(run_in_browser);

fn container() -> web_sys::Element {
    let doc = web_sys::window().unwrap().document().unwrap();
    let container = doc.create_element("div").unwrap();
    doc.body().unwrap().append_child(&container).unwrap();
    container
}

fn host_click(el: &Element) {
    el.host_node()
        .unwrap()
        .dyn_into::<web_sys::HtmlElement>()
        .unwrap()
        .click();
}

#[wasm_bindgen_test]
fn tree_changes_are_replayed_on_the_host() {
    let container = container();
    let list = el("ul")
        .class("items")
        .child(el("li").text("a").build())
        .build();
    list.attach_to_host(&container).unwrap();
    assert_eq!(container.inner_html(), list.outer_html());

    list.append_child(&el("li").text("b").build()).unwrap();
    list.set_attribute("data-count", "2");
    list.children()[0].remove();
    list.set_style("color", "red");
    assert_eq!(container.inner_html(), list.outer_html());

    let fresh = el("li").text("c").build();
    list.replace_child(&fresh, &list.children()[0]).unwrap();
    list.children()[0].set_attribute("hidden", "");
    assert_eq!(container.inner_html(), list.outer_html());

    list.set_text("empty");
    assert_eq!(container.inner_html(), r#"<ul class="items" data-count="2" style="color: red;">empty</ul>"#);
}

#[wasm_bindgen_test]
fn host_events_reach_in_memory_handlers() {
    let container = container();
    let hits = Rc::new(Cell::new(0));
    let seen = Rc::clone(&hits);
    let outer = el("div")
        .on("click", move |_| seen.set(seen.get() + 1))
        .child(el("button").build())
        .build();
    outer.attach_to_host(&container).unwrap();
    let button = outer.children()[0].clone();

    host_click(&button);
    assert_eq!(hits.get(), 1);

    let id = button.add_event_listener("click", |ev| ev.stop_propagation());
    host_click(&button);
    assert_eq!(hits.get(), 1);

    button.remove_event_listener(id);
    host_click(&button);
    assert_eq!(hits.get(), 2);
}

#[wasm_bindgen_test]
fn browser_document_binds_head_and_body() {
    let doc = Document::browser().unwrap();
    let marker = el("section").attr("id", "fdom-mirror-check").build();
    doc.body().append_child(&marker).unwrap();
    let host = web_sys::window().unwrap().document().unwrap();
    assert!(host.get_element_by_id("fdom-mirror-check").is_some());
    marker.remove();
    assert!(host.get_element_by_id("fdom-mirror-check").is_none());
}
