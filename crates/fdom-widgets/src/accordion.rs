#![forbid(unsafe_code)]

//! Accordion widget.
//!
//! A stack of collapsible sections. Each item renders a header button and a
//! panel; clicking a header toggles its panel. With `multiple: false` (the
//! default) opening one item closes the others.
//!
//! Props:
//!
//! | prop       | kind                          | default |
//! |------------|-------------------------------|---------|
//! | `items`    | array of `{title, content}`   | required |
//! | `multiple` | bool                          | `false` |
//! | `open`     | array of item indices         | `[]`    |
//! | `class`    | string, extra root classes    | none    |
//!
//! Changing `items` rebuilds the widget. Every other change is patched onto
//! the existing element, so the root keeps its identity.
//!
//! # Invariants
//!
//! 1. `aria-expanded` on each header and `hidden` on each panel always agree.
//! 2. With `multiple: false` at most one item is open; out-of-range indices
//!    are ignored and the first listed index wins.

use fdom_core::{Element, PropError, Props, el};
use fdom_runtime::{
    Definition, Instance, PropKind, PropSchema, Reconcile, RenderCx, RenderError, ThemeAware,
    WeakInstance,
};
use fdom_style::THEME_ATTR;
use serde_json::Value;

pub const NAME: &str = "accordion";

pub const ACCORDION_CSS: &str = "\
.fdom-accordion{display:flex;flex-direction:column;border:1px solid var(--fdom-border,#d0d4dc);border-radius:6px}
.fdom-accordion__item+.fdom-accordion__item{border-top:1px solid var(--fdom-border,#d0d4dc)}
.fdom-accordion__header{all:unset;box-sizing:border-box;width:100%;padding:.75rem 1rem;cursor:pointer;font-weight:600}
.fdom-accordion__header:focus-visible{outline:2px solid var(--fdom-focus,#3b82f6)}
.fdom-accordion__panel{padding:0 1rem 1rem}
.fdom-accordion__item--open>.fdom-accordion__header{color:var(--fdom-accent,#1d4ed8)}
[data-theme=dark].fdom-accordion{--fdom-border:#3a3f4b;--fdom-accent:#93c5fd;background:#16181d;color:#e6e8ec}
";

const ROOT_CLASS: &str = "fdom-accordion";
const ITEM_CLASS: &str = "fdom-accordion__item";
const ITEM_OPEN_CLASS: &str = "fdom-accordion__item--open";
const HEADER_CLASS: &str = "fdom-accordion__header";
const PANEL_CLASS: &str = "fdom-accordion__panel";

struct Item<'a> {
    title: &'a str,
    content: &'a str,
}

fn schema() -> PropSchema {
    PropSchema::new()
        .required("items", PropKind::Array)
        .with_default("multiple", PropKind::Bool, false)
        .with_default("open", PropKind::Array, Value::Array(Vec::new()))
        .optional("class", PropKind::String)
}

fn parse_items(state: &Props) -> Result<Vec<Item<'_>>, PropError> {
    state
        .array("items")?
        .iter()
        .enumerate()
        .map(|(index, value)| {
            let field = |name: &str| {
                value.get(name).and_then(Value::as_str).ok_or_else(|| {
                    PropError::malformed("items", format!("item {index} needs a string `{name}`"))
                })
            };
            Ok::<_, PropError>(Item {
                title: field("title")?,
                content: field("content")?,
            })
        })
        .collect()
}

/// Per-item open flags for `count` items.
fn open_flags(state: &Props, count: usize) -> Result<Vec<bool>, PropError> {
    let multiple = state.bool_or("multiple", false)?;
    let mut flags = vec![false; count];
    for value in state.opt_array("open")?.unwrap_or_default() {
        let index = value
            .as_u64()
            .ok_or_else(|| PropError::malformed("open", format!("{value} is not an item index")))?;
        let Some(flag) = usize::try_from(index).ok().and_then(|i| flags.get_mut(i)) else {
            continue;
        };
        *flag = true;
        if !multiple {
            break;
        }
    }
    Ok(flags)
}

/// Root class list: [`ROOT_CLASS`] first, then the extra classes, split on
/// whitespace and deduplicated the way [`fdom_core::ElementSpec::class`] does.
fn root_classes(state: &Props) -> Result<String, PropError> {
    let mut classes = vec![ROOT_CLASS];
    for class in state.opt_str("class")?.unwrap_or_default().split_whitespace() {
        if !classes.contains(&class) {
            classes.push(class);
        }
    }
    Ok(classes.join(" "))
}

fn expanded(open: bool) -> &'static str {
    if open { "true" } else { "false" }
}

fn render(cx: &mut RenderCx<'_>, state: &Props) -> Result<Element, RenderError> {
    let items = parse_items(state)?;
    let open = open_flags(state, items.len())?;
    let id = cx.instance_id();

    let mut children = Vec::with_capacity(items.len());
    for (index, (item, is_open)) in items.iter().zip(open).enumerate() {
        let header_id = format!("{NAME}-{id}-header-{index}");
        let panel_id = format!("{NAME}-{id}-panel-{index}");
        let weak = cx.instance();
        let header = cx.build(
            el("button")
                .class(HEADER_CLASS)
                .attr("type", "button")
                .attr("id", header_id.as_str())
                .attr("aria-controls", panel_id.as_str())
                .attr("aria-expanded", expanded(is_open))
                .text(item.title)
                .on("click", move |_| toggle(&weak, index)),
        );
        let panel = el("div")
            .class(PANEL_CLASS)
            .attr("id", panel_id)
            .attr("role", "region")
            .attr("aria-labelledby", header_id)
            .attr_opt("hidden", (!is_open).then_some(""))
            .text(item.content)
            .build();
        children.push(
            el("div")
                .class(ITEM_CLASS)
                .class_if(ITEM_OPEN_CLASS, is_open)
                .child(header)
                .child(panel)
                .build(),
        );
    }

    Ok(el("div")
        .class(root_classes(state)?)
        .attr(THEME_ATTR, cx.theme())
        .children(children)
        .build())
}

fn patch(cx: &mut RenderCx<'_>, root: &Element, _delta: &Props) -> Result<(), RenderError> {
    let state = cx.state();
    let items = root.children();
    let open = open_flags(state, items.len())?;
    root.set_attribute("class", root_classes(state)?);
    for (item, is_open) in items.iter().zip(open) {
        item.toggle_class(ITEM_OPEN_CLASS, Some(is_open));
        for header in item.query_class(HEADER_CLASS) {
            header.set_attribute("aria-expanded", expanded(is_open));
        }
        for panel in item.query_class(PANEL_CLASS) {
            if is_open {
                panel.remove_attribute("hidden");
            } else {
                panel.set_attribute("hidden", "");
            }
        }
    }
    Ok(())
}

/// Open indices after toggling `index`.
fn toggled(state: &Props, count: usize, index: usize) -> Result<Vec<usize>, PropError> {
    let multiple = state.bool_or("multiple", false)?;
    let mut flags = open_flags(state, count)?;
    let Some(was_open) = flags.get(index).copied() else {
        return Ok(indices(&flags));
    };
    if !multiple {
        flags.fill(false);
    }
    flags[index] = !was_open;
    Ok(indices(&flags))
}

fn indices(flags: &[bool]) -> Vec<usize> {
    flags
        .iter()
        .enumerate()
        .filter_map(|(i, open)| open.then_some(i))
        .collect()
}

fn toggle(weak: &WeakInstance, index: usize) {
    let Some(instance) = weak.upgrade() else {
        return;
    };
    let state = instance.state();
    let count = state.opt_array("items").ok().flatten().map_or(0, <[Value]>::len);
    let next = match toggled(&state, count, index) {
        Ok(next) => next,
        Err(_err) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(message = "accordion.toggle_failed", index, err = %_err);
            return;
        }
    };
    #[cfg(feature = "tracing")]
    tracing::debug!(message = "accordion.toggle", index, open = ?next);
    if let Err(_err) = instance.update(Props::new().with("open", next)) {
        #[cfg(feature = "tracing")]
        tracing::warn!(message = "accordion.toggle_failed", index, err = %_err);
    }
}

/// Indices of the open items of a live accordion instance.
#[must_use]
pub fn open_items(instance: &Instance) -> Vec<usize> {
    let state = instance.state();
    let count = state.opt_array("items").ok().flatten().map_or(0, <[Value]>::len);
    open_flags(&state, count)
        .map(|flags| indices(&flags))
        .unwrap_or_default()
}

/// The accordion component definition.
#[must_use]
pub fn accordion() -> Definition {
    Definition::new(NAME, render)
        .schema(schema())
        .reconcile(Reconcile::rebuild_or_patch(
            |prev, delta| prev.changes(delta, "items"),
            patch,
        ))
        .on_theme_change(|_, root, change| root.set_attribute(THEME_ATTR, change.theme.clone()))
        .styles(ACCORDION_CSS)
}

/// [`accordion`] wrapped so instances track theme switches.
#[must_use]
pub fn accordion_themed() -> ThemeAware<Definition> {
    accordion().theme_aware()
}
