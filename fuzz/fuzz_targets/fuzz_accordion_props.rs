#![no_main]

use fdom_core::Props;
use fdom_runtime::{Factory, Host};
use libfuzzer_sys::fuzz_target;

// Arbitrary JSON must either build an accordion or fail with an error.
fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let Ok(props) = Props::from_value(value) else {
        return;
    };
    let host = Host::new();
    if let Ok(inst) = fdom_widgets::accordion().create(&host, props) {
        if let Some(root) = inst.element() {
            for header in root.query_class("fdom-accordion__header") {
                header.click();
            }
        }
        inst.destroy();
    }
});
