#![no_main]

use arbitrary::Arbitrary;
use fdom_core::{Props, el};
use fdom_runtime::{Definition, Factory, Host, Reconcile};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum Mode {
    StateOnly,
    Patch,
    Rebuild,
    RebuildOrPatch,
}

#[derive(Arbitrary, Debug)]
enum Op {
    Update { key: u8, value: i16 },
    UpdateEmpty,
    Click,
    Mount,
    Unmount,
    SwitchTheme(bool),
    Destroy,
}

fn definition(mode: &Mode) -> Definition {
    let def = Definition::new("fuzz", |cx, state| {
        let weak = cx.instance();
        let label = state.get("k0").map(ToString::to_string).unwrap_or_default();
        Ok(cx.build(el("div").text(label).on("click", move |_| {
            if let Some(inst) = weak.upgrade() {
                let _ = inst.update(Props::new().with("clicked", true));
            }
        })))
    })
    .on_theme_change(|_, el, change| el.set_attribute("data-theme", change.theme.clone()));
    let changed = |prev: &Props, delta: &Props| prev.changes(delta, "k0");
    match mode {
        Mode::StateOnly => def,
        Mode::Patch => def.reconcile(Reconcile::patch(|_, el, _| {
            el.toggle_class("patched", None);
            Ok(())
        })),
        Mode::Rebuild => def.reconcile(Reconcile::rebuild_when(changed)),
        Mode::RebuildOrPatch => def.reconcile(Reconcile::rebuild_or_patch(changed, |_, el, _| {
            el.toggle_class("patched", None);
            Ok(())
        })),
    }
}

fuzz_target!(|input: (Mode, Vec<Op>)| {
    let (mode, ops) = input;
    let host = Host::new();
    let Ok(inst) = definition(&mode).theme_aware().create(&host, Props::new()) else {
        return;
    };
    for op in ops.into_iter().take(256) {
        match op {
            Op::Update { key, value } => {
                let _ = inst.update(Props::new().with(&format!("k{}", key % 4), value));
            }
            Op::UpdateEmpty => {
                let before = inst.element();
                let _ = inst.update(Props::new());
                assert_eq!(inst.element(), before);
            }
            Op::Click => {
                if let Some(el) = inst.element() {
                    el.click();
                }
            }
            Op::Mount => {
                let _ = inst.mount(host.document().body());
            }
            Op::Unmount => {
                inst.unmount();
            }
            Op::SwitchTheme(dark) => {
                let _ = host.themes().switch_theme(if dark { "dark" } else { "light" });
            }
            Op::Destroy => {
                inst.destroy();
                assert!(inst.element().is_none());
                assert_eq!(host.themes().subscriber_count(), 0);
            }
        }
    }
    inst.destroy();
    assert_eq!(host.themes().subscriber_count(), 0);
});
