#![forbid(unsafe_code)]

//! Component lifecycle and reconciliation.
//!
//! A [`Definition`] pairs a renderer with a [`Reconcile`] strategy chosen once,
//! at definition time. Creating it against a [`Host`] yields an [`Instance`]:
//! a handle that owns the component's prop state and its current root element.
//!
//! # Invariants
//!
//! 1. `element()` returns the same handle across calls until a rebuild.
//! 2. A rebuild puts the new element in the old one's parent slot and releases
//!    the listeners recorded for the discarded subtree.
//! 3. `update` with an empty delta runs no hook and never changes identity.
//! 4. `destroy` is idempotent. It releases recorded listeners, the theme
//!    subscription and the element reference, and never detaches the element
//!    from its parent (see [`Instance::unmount`]).
//! 5. After `destroy`, `update` is a logged no-op: no state or DOM changes.
//! 6. No internal borrow is held while user code (renderer, policy, patcher,
//!    theme hook, cleanup) runs. Reentrant `update` is a logged no-op.
//!
//! # Failure Modes
//!
//! - A renderer or patcher error propagates out of `update`. The merged state
//!   is kept and the previous element stays current.
//! - An invalid delta is rejected before the state is touched.
//! - Listeners recorded by a failed rebuild render are released with it.
//!   After a patch, listeners on nodes it took out of the tree are released.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use fdom_core::{
    Document, Element, ElementSpec, Event, HasElement, ListenerId, ListenerRegistry, Props,
};
use fdom_style::{ThemeChange, ThemeSubscription};
use serde_json::Value;

use crate::error::{ComponentError, RenderError, Result};
use crate::host::Host;
use crate::perf::RenderTimer;
use crate::themed::ThemeAware;
use crate::validate::PropSchema;

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// `(cx, state) -> root element`. Called on creation and on every rebuild.
pub type RenderFn = Rc<dyn Fn(&mut RenderCx<'_>, &Props) -> Result<Element, RenderError>>;

/// `(previous state, delta) -> rebuild?`
pub type PolicyFn = Rc<dyn Fn(&Props, &Props) -> bool>;

/// `(cx, current element, delta)`. Mutates the element in place.
pub type PatchFn = Rc<dyn Fn(&mut RenderCx<'_>, &Element, &Props) -> Result<(), RenderError>>;

pub type ThemeHook = Rc<dyn Fn(&mut RenderCx<'_>, &Element, &ThemeChange)>;

/// How an instance reacts to `update`.
#[derive(Clone, Default)]
pub enum Reconcile {
    /// Merge the delta into state; leave the DOM alone.
    #[default]
    StateOnly,
    /// Always patch the current element in place.
    Patch(PatchFn),
    /// Rebuild when `policy` says so; otherwise run `fallback`, if any.
    Rebuild {
        policy: PolicyFn,
        fallback: Option<PatchFn>,
    },
}

impl Reconcile {
    pub fn patch(
        patch: impl Fn(&mut RenderCx<'_>, &Element, &Props) -> Result<(), RenderError> + 'static,
    ) -> Self {
        Self::Patch(Rc::new(patch))
    }

    pub fn rebuild_when(policy: impl Fn(&Props, &Props) -> bool + 'static) -> Self {
        Self::Rebuild {
            policy: Rc::new(policy),
            fallback: None,
        }
    }

    pub fn rebuild_or_patch(
        policy: impl Fn(&Props, &Props) -> bool + 'static,
        patch: impl Fn(&mut RenderCx<'_>, &Element, &Props) -> Result<(), RenderError> + 'static,
    ) -> Self {
        Self::Rebuild {
            policy: Rc::new(policy),
            fallback: Some(Rc::new(patch)),
        }
    }

    #[must_use]
    pub fn always_rebuild() -> Self {
        Self::rebuild_when(|_, _| true)
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StateOnly => "state_only",
            Self::Patch(_) => "patch",
            Self::Rebuild { fallback: None, .. } => "rebuild",
            Self::Rebuild { fallback: Some(_), .. } => "rebuild_or_patch",
        }
    }
}

impl fmt::Debug for Reconcile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

/// Lifecycle phase of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Live,
    /// Inside a render, patch or theme hook.
    Updating,
    Destroyed,
}

/// Anything that turns props into a live instance.
pub trait Factory {
    fn name(&self) -> &str;

    fn create(&self, host: &Host, props: Props) -> Result<Instance>;
}

/// A component type: name, renderer, reconciliation strategy and optional
/// schema, theme hook and stylesheet.
#[derive(Clone)]
pub struct Definition {
    name: Rc<str>,
    render: RenderFn,
    reconcile: Reconcile,
    schema: Option<Rc<PropSchema>>,
    theme_hook: Option<ThemeHook>,
    styles: Option<Rc<str>>,
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("name", &self.name)
            .field("reconcile", &self.reconcile)
            .field("schema", &self.schema.is_some())
            .field("theme_hook", &self.theme_hook.is_some())
            .field("styles", &self.styles.is_some())
            .finish()
    }
}

impl Definition {
    pub fn new(
        name: &str,
        render: impl Fn(&mut RenderCx<'_>, &Props) -> Result<Element, RenderError> + 'static,
    ) -> Self {
        Self {
            name: Rc::from(name),
            render: Rc::new(render),
            reconcile: Reconcile::StateOnly,
            schema: None,
            theme_hook: None,
            styles: None,
        }
    }

    #[must_use]
    pub fn reconcile(mut self, reconcile: Reconcile) -> Self {
        self.reconcile = reconcile;
        self
    }

    #[must_use]
    pub fn schema(mut self, schema: PropSchema) -> Self {
        self.schema = Some(Rc::new(schema));
        self
    }

    /// Hook run on the current element whenever the theme switches.
    ///
    /// Only called for instances created through [`ThemeAware`].
    #[must_use]
    pub fn on_theme_change(
        mut self,
        hook: impl Fn(&mut RenderCx<'_>, &Element, &ThemeChange) + 'static,
    ) -> Self {
        self.theme_hook = Some(Rc::new(hook));
        self
    }

    /// Stylesheet injected once per host, tagged with the component name.
    #[must_use]
    pub fn styles(mut self, css: &str) -> Self {
        self.styles = Some(Rc::from(css));
        self
    }

    #[must_use]
    pub fn theme_aware(self) -> ThemeAware<Self> {
        ThemeAware::new(self)
    }

    #[must_use]
    pub fn strategy(&self) -> &Reconcile {
        &self.reconcile
    }

    #[must_use]
    pub fn prop_schema(&self) -> Option<&PropSchema> {
        self.schema.as_deref()
    }
}

impl Factory for Definition {
    fn name(&self) -> &str {
        &self.name
    }

    fn create(&self, host: &Host, props: Props) -> Result<Instance> {
        let state = match &self.schema {
            Some(schema) => schema
                .seed(&props, host.config().strict_props)
                .map_err(|err| ComponentError::props(&self.name, err))?,
            None => props,
        };
        if let Some(css) = &self.styles {
            host.styles().inject(&self.name, css);
        }

        let id = NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed);
        let instance = Instance {
            inner: Rc::new(RefCell::new(InstanceInner {
                id,
                def: self.clone(),
                host: host.clone(),
                state: state.clone(),
                element: None,
                phase: Phase::Updating,
                listeners: ListenerRegistry::new(),
                cleanups: Vec::new(),
                theme_subscription: None,
            })),
        };

        let mut pass = Pass {
            id,
            weak: instance.downgrade(),
            def: self.clone(),
            host: host.clone(),
            state,
            element: None,
            listeners: ListenerRegistry::new(),
        };
        let def = self.clone();
        match render_element(&def, &mut pass.cx()) {
            Ok(element) => pass.element = Some(element),
            Err(err) => {
                pass.listeners.release();
                return Err(ComponentError::render(&self.name, err));
            }
        }
        instance.end_pass(pass);
        tracing::debug!(message = "component.create", component = %self.name, id);
        Ok(instance)
    }
}

/// Context handed to renderers and hooks.
///
/// Listeners attached through [`RenderCx::on`] or [`RenderCx::build`] are
/// recorded for the instance and released on rebuild or destroy.
pub struct RenderCx<'a> {
    host: &'a Host,
    listeners: &'a mut ListenerRegistry,
    instance: WeakInstance,
    component: &'a str,
    state: &'a Props,
    id: u64,
}

impl fmt::Debug for RenderCx<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderCx")
            .field("component", &self.component)
            .field("id", &self.id)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl RenderCx<'_> {
    #[must_use]
    pub fn host(&self) -> &Host {
        self.host
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        self.host.document()
    }

    /// Name of the active theme.
    #[must_use]
    pub fn theme(&self) -> String {
        self.host.themes().current()
    }

    /// Weak handle to the instance being rendered, for event handlers.
    #[must_use]
    pub fn instance(&self) -> WeakInstance {
        self.instance.clone()
    }

    #[must_use]
    pub fn instance_id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn component(&self) -> &str {
        self.component
    }

    /// Full state after the pending delta was merged.
    #[must_use]
    pub fn state(&self) -> &Props {
        self.state
    }

    /// Attach a listener owned by the instance.
    pub fn on(
        &mut self,
        el: &Element,
        event: &str,
        handler: impl Fn(&mut Event) + 'static,
    ) -> ListenerId {
        self.listeners.listen(el, event, handler)
    }

    /// Build `spec`, recording its listeners for the instance.
    pub fn build(&mut self, spec: ElementSpec) -> Element {
        spec.build_tracked(self.listeners)
    }
}

fn render_element(def: &Definition, cx: &mut RenderCx<'_>) -> Result<Element, RenderError> {
    let span = tracing::debug_span!(
        "component.render",
        component = %def.name,
        id = cx.id,
        render_duration_us = tracing::field::Empty
    );
    let _guard = span.enter();
    let timer = RenderTimer::start();
    let state = cx.state;
    let result = (def.render)(cx, state);
    let elapsed_us = timer.finish(&def.name, cx.host.config().slow_render_budget);
    span.record("render_duration_us", elapsed_us);
    result
}

struct InstanceInner {
    id: u64,
    def: Definition,
    host: Host,
    state: Props,
    element: Option<Element>,
    phase: Phase,
    listeners: ListenerRegistry,
    cleanups: Vec<Box<dyn FnOnce()>>,
    theme_subscription: Option<ThemeSubscription>,
}

impl InstanceInner {
    fn admit(&self, op: &'static str) -> bool {
        match self.phase {
            Phase::Live => true,
            Phase::Destroyed => {
                if self.host.config().warn_on_post_destroy {
                    tracing::warn!(
                        message = "component.after_destroy",
                        component = %self.def.name,
                        id = self.id,
                        op
                    );
                }
                false
            }
            Phase::Updating => {
                tracing::warn!(
                    message = "component.reentrant",
                    component = %self.def.name,
                    id = self.id,
                    op
                );
                false
            }
        }
    }

    fn begin_pass(&mut self, weak: WeakInstance) -> Pass {
        self.phase = Phase::Updating;
        Pass {
            id: self.id,
            weak,
            def: self.def.clone(),
            host: self.host.clone(),
            state: self.state.clone(),
            element: self.element.clone(),
            listeners: std::mem::take(&mut self.listeners),
        }
    }
}

/// Everything user code may touch, moved out of the instance for the
/// duration of a render or hook.
struct Pass {
    id: u64,
    weak: WeakInstance,
    def: Definition,
    host: Host,
    state: Props,
    element: Option<Element>,
    listeners: ListenerRegistry,
}

impl Pass {
    fn cx(&mut self) -> RenderCx<'_> {
        RenderCx {
            host: &self.host,
            listeners: &mut self.listeners,
            instance: self.weak.clone(),
            component: &self.def.name,
            state: &self.state,
            id: self.id,
        }
    }
}

enum Action {
    Keep,
    Patch(PatchFn),
    Rebuild,
}

impl Action {
    fn label(&self) -> &'static str {
        match self {
            Self::Keep => "state_only",
            Self::Patch(_) => "patch",
            Self::Rebuild => "rebuild",
        }
    }
}

/// Handle to a live (or destroyed) component.
///
/// Clones share the same instance; equality is identity.
#[derive(Clone)]
pub struct Instance {
    inner: Rc<RefCell<InstanceInner>>,
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Instance {}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Instance")
            .field("name", &inner.def.name)
            .field("id", &inner.id)
            .field("phase", &inner.phase)
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

impl HasElement for Instance {
    fn element(&self) -> Option<Element> {
        Instance::element(self)
    }
}

impl Instance {
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.borrow().id
    }

    #[must_use]
    pub fn name(&self) -> Rc<str> {
        Rc::clone(&self.inner.borrow().def.name)
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.inner.borrow().phase
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.phase() == Phase::Destroyed
    }

    /// Current root element; `None` once destroyed.
    #[must_use]
    pub fn element(&self) -> Option<Element> {
        self.inner.borrow().element.clone()
    }

    /// Snapshot of the prop state.
    #[must_use]
    pub fn state(&self) -> Props {
        self.inner.borrow().state.clone()
    }

    #[must_use]
    pub fn prop(&self, key: &str) -> Option<Value> {
        self.inner.borrow().state.get(key).cloned()
    }

    /// Listeners currently recorded for this instance.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    #[must_use]
    pub fn is_theme_subscribed(&self) -> bool {
        self.inner
            .borrow()
            .theme_subscription
            .as_ref()
            .is_some_and(ThemeSubscription::is_active)
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakInstance {
        WeakInstance(Rc::downgrade(&self.inner))
    }

    /// Merge `delta` into the state and reconcile the DOM.
    ///
    /// Returns `self` for chaining. After `destroy`, or when called from
    /// inside this instance's own renderer or hooks, logs a warning and does
    /// nothing.
    pub fn update(&self, delta: Props) -> Result<&Self> {
        let (mut pass, previous) = {
            let mut inner = self.inner.borrow_mut();
            if !inner.admit("update") {
                return Ok(self);
            }
            if inner.host.config().validate_updates {
                if let Some(schema) = &inner.def.schema {
                    schema
                        .validate_delta(&delta, inner.host.config().strict_props)
                        .map_err(|err| ComponentError::props(&inner.def.name, err))?;
                }
            }
            if delta.is_empty() {
                return Ok(self);
            }
            let previous = inner.state.clone();
            inner.state.merge(&delta);
            (inner.begin_pass(self.downgrade()), previous)
        };

        let outcome = Self::reconcile(&mut pass, &previous, &delta);
        self.end_pass(pass);
        outcome.map(|()| self)
    }

    fn reconcile(pass: &mut Pass, previous: &Props, delta: &Props) -> Result<()> {
        let def = pass.def.clone();
        let action = match &def.reconcile {
            Reconcile::StateOnly => Action::Keep,
            Reconcile::Patch(patch) => Action::Patch(Rc::clone(patch)),
            Reconcile::Rebuild { policy, fallback } => {
                if policy(previous, delta) {
                    Action::Rebuild
                } else if let Some(patch) = fallback {
                    Action::Patch(Rc::clone(patch))
                } else {
                    Action::Keep
                }
            }
        };
        tracing::debug!(
            message = "component.update",
            component = %def.name,
            id = pass.id,
            action = action.label(),
            keys = delta.len()
        );

        match action {
            Action::Keep => Ok(()),
            Action::Patch(patch) => {
                let Some(element) = pass.element.clone() else {
                    return Ok(());
                };
                let inside = pass.listeners.ids_within(&element);
                let outcome = patch(&mut pass.cx(), &element, delta)
                    .map_err(|err| ComponentError::render(&def.name, err));
                let released = pass.listeners.prune(&element, &inside);
                if released > 0 {
                    tracing::debug!(
                        message = "component.patch_released",
                        component = %def.name,
                        id = pass.id,
                        released
                    );
                }
                outcome
            }
            Action::Rebuild => {
                let mark = pass.listeners.mark();
                let fresh = match render_element(&def, &mut pass.cx()) {
                    Ok(fresh) => fresh,
                    Err(err) => {
                        pass.listeners.release_since(mark);
                        return Err(ComponentError::render(&def.name, err));
                    }
                };
                let Some(old) = pass.element.take() else {
                    pass.element = Some(fresh);
                    return Ok(());
                };
                let parent = old.parent();
                if let Some(parent) = &parent {
                    if let Err(err) = parent.replace_child(&fresh, &old) {
                        pass.listeners.release_since(mark);
                        pass.element = Some(old);
                        return Err(ComponentError::dom(&def.name, err));
                    }
                }
                let released = pass.listeners.release_within(&old);
                tracing::debug!(
                    message = "component.rebuild",
                    component = %def.name,
                    id = pass.id,
                    attached = parent.is_some(),
                    released
                );
                pass.element = Some(fresh);
                Ok(())
            }
        }
    }

    fn end_pass(&self, pass: Pass) {
        let Pass {
            mut listeners,
            element,
            ..
        } = pass;
        let mut inner = self.inner.borrow_mut();
        if inner.phase == Phase::Destroyed {
            drop(inner);
            // Destroyed from inside its own hook.
            listeners.release();
            return;
        }
        inner.phase = Phase::Live;
        inner.element = element;
        inner.listeners = listeners;
    }

    /// Release listeners, the theme subscription and the element reference.
    ///
    /// The element stays wherever it is in the document; call
    /// [`Instance::unmount`] first to detach it.
    pub fn destroy(&self) {
        let (mut listeners, subscription, cleanups, name, id) = {
            let mut inner = self.inner.borrow_mut();
            if inner.phase == Phase::Destroyed {
                return;
            }
            inner.phase = Phase::Destroyed;
            inner.element = None;
            (
                std::mem::take(&mut inner.listeners),
                inner.theme_subscription.take(),
                std::mem::take(&mut inner.cleanups),
                Rc::clone(&inner.def.name),
                inner.id,
            )
        };
        let released = listeners.release();
        drop(subscription);
        let cleanup_count = cleanups.len();
        for cleanup in cleanups.into_iter().rev() {
            cleanup();
        }
        tracing::debug!(
            message = "component.destroy",
            component = %name,
            id,
            released,
            cleanups = cleanup_count
        );
    }

    /// Register `cleanup` to run on destroy, most recent first.
    ///
    /// Runs immediately if the instance is already destroyed.
    pub fn on_destroy(&self, cleanup: impl FnOnce() + 'static) {
        let mut inner = self.inner.borrow_mut();
        if inner.phase == Phase::Destroyed {
            drop(inner);
            cleanup();
            return;
        }
        inner.cleanups.push(Box::new(cleanup));
    }

    /// Append the element to `parent`.
    pub fn mount(&self, parent: &Element) -> Result<&Self> {
        let (element, name) = {
            let inner = self.inner.borrow();
            if !inner.admit("mount") {
                return Ok(self);
            }
            (inner.element.clone(), Rc::clone(&inner.def.name))
        };
        if let Some(element) = element {
            parent
                .append_child(&element)
                .map_err(|err| ComponentError::dom(&name, err))?;
        }
        Ok(self)
    }

    /// Detach the element from its parent. Returns whether it was attached.
    pub fn unmount(&self) -> bool {
        let element = {
            let inner = self.inner.borrow();
            if inner.phase == Phase::Destroyed {
                inner.admit("unmount");
                return false;
            }
            inner.element.clone()
        };
        element.is_some_and(|el| el.remove())
    }

    /// Without a theme hook the new theme name is merged into the `theme`
    /// state key and the DOM is left alone.
    pub(crate) fn notify_theme(&self, change: &ThemeChange) {
        let (hook, mut pass) = {
            let mut inner = self.inner.borrow_mut();
            if !inner.admit("theme_change") {
                return;
            }
            let Some(hook) = inner.def.theme_hook.clone() else {
                inner.state.set("theme", change.theme.clone());
                tracing::debug!(
                    message = "component.theme",
                    component = %inner.def.name,
                    id = inner.id,
                    theme = %change.theme,
                    hook = false
                );
                return;
            };
            (hook, inner.begin_pass(self.downgrade()))
        };
        if let Some(element) = pass.element.clone() {
            hook(&mut pass.cx(), &element, change);
        }
        tracing::debug!(
            message = "component.theme",
            component = %pass.def.name,
            id = pass.id,
            theme = %change.theme
        );
        self.end_pass(pass);
    }

    /// Attach a theme subscription. Refuses a second one, or any once destroyed.
    pub(crate) fn bind_theme(&self, subscription: ThemeSubscription) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.phase == Phase::Destroyed || inner.theme_subscription.is_some() {
            return false;
        }
        inner.theme_subscription = Some(subscription);
        true
    }
}

/// Non-owning instance handle, for event handlers and theme callbacks.
#[derive(Clone, Default)]
pub struct WeakInstance(Weak<RefCell<InstanceInner>>);

impl fmt::Debug for WeakInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WeakInstance")
            .field(&(self.0.strong_count() > 0))
            .finish()
    }
}

impl WeakInstance {
    #[must_use]
    pub fn upgrade(&self) -> Option<Instance> {
        self.0.upgrade().map(|inner| Instance { inner })
    }
}
