//! Contextual action menu
//!
//! Four pieces cooperate on every activation:
//!
//! - [`trigger`] turns a secondary click or a long-press into an activation
//! - [`resolver`] decides which action groups apply and binds them to the target
//! - [`registry`] executes the bound actions
//! - [`presenter`] positions the menu, owns the overlay and tears it all down
//!
//! [`ContextMenu`] wires them to a host page.

pub mod presenter;
pub mod registry;
pub mod resolver;
pub mod trigger;

use std::time::{Duration, Instant};

pub use presenter::{compute_position, Dismissal, MenuPresenter, MenuState, PresenterState};
pub use registry::{ActionRegistry, Outcome};
pub use resolver::{CapabilityResolver, Resolution};
pub use trigger::{Activation, ActivationTrigger, ClickDecision, DeviceCapabilities};

use crate::config::Config;
use crate::core::{ActionBinding, ActionId, Invocation, Task};
use crate::page::{ElementRef, Hooks, ListenerHandle, Page};

pub struct ContextMenu {
    trigger: ActivationTrigger,
    resolver: CapabilityResolver,
    presenter: MenuPresenter,
    registry: ActionRegistry,
    overlay_class: String,
    /// Bindings of the visible menu; dropped on every dismissal
    binding: Option<ActionBinding>,
    read_mode_exit: Option<ListenerHandle>,
}

impl ContextMenu {
    /// Attach to a page. Returns `None` when the page has no menu container,
    /// which disables the menu for that page.
    pub fn attach(
        page: &dyn Page,
        config: &Config,
        capabilities: DeviceCapabilities,
    ) -> Option<Self> {
        let Some(menu) = page.get_by_id(&config.dom.menu_id) else {
            log::debug!(
                "no #{} on {}, context menu disabled",
                config.dom.menu_id,
                page.location()
            );
            return None;
        };
        log::debug!("context menu attached with {capabilities:?}");
        Some(Self {
            trigger: ActivationTrigger::new(
                capabilities,
                Duration::from_millis(config.menu.long_press_ms),
            ),
            resolver: CapabilityResolver::new(config.dom.clone()),
            presenter: MenuPresenter::new(menu, config.dom.clone(), config.menu.pointer_offset),
            registry: ActionRegistry::new(
                config.dom.clone(),
                config.messages.clone(),
                config.router.enabled,
            ),
            overlay_class: config.dom.overlay_class.clone(),
            binding: None,
            read_mode_exit: None,
        })
    }

    pub fn capabilities(&self) -> DeviceCapabilities {
        self.trigger.capabilities()
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn presenter(&self) -> &MenuPresenter {
        &self.presenter
    }

    pub fn is_visible(&self) -> bool {
        self.presenter.is_visible()
    }

    pub fn binding(&self) -> Option<&ActionBinding> {
        self.binding.as_ref()
    }

    /// Invocation currently bound to an action, by flat lookup
    pub fn bound(&self, id: ActionId) -> Option<&Invocation> {
        self.binding.as_ref().and_then(|binding| binding.lookup(id))
    }

    /// Whether the element belongs to the menu chrome (menu or overlay)
    fn is_chrome(&self, page: &dyn Page, el: ElementRef) -> bool {
        if page.has_class(el, &self.overlay_class) {
            return true;
        }
        let mut current = Some(el);
        while let Some(e) = current {
            if e == self.presenter.menu() {
                return true;
            }
            current = page.parent(e);
        }
        false
    }

    /// Hit-test the page underneath any visible menu
    fn target_at(&mut self, page: &mut dyn Page, x: i32, y: i32) -> Option<ElementRef> {
        let hit = page.element_at(x, y);
        if hit.is_some_and(|el| self.is_chrome(page, el)) {
            self.dismiss(page);
            return page.element_at(x, y);
        }
        hit
    }

    /// Secondary click at viewport coordinates. `bypass` (Ctrl held) lets the
    /// native menu through.
    pub fn secondary_click(
        &mut self,
        page: &mut dyn Page,
        x: i32,
        y: i32,
        bypass: bool,
    ) -> ClickDecision {
        if !self.capabilities().supports_context_gesture {
            return ClickDecision::Ignore;
        }
        let target = if bypass {
            None
        } else {
            self.target_at(page, x, y)
        };
        let decision = self.trigger.secondary_click(target, x, y, bypass);
        if let ClickDecision::Activate(activation) = decision {
            self.activate(page, activation);
        }
        decision
    }

    /// Touch start; touches on the menu itself are taps, not long-presses
    pub fn touch_start(&mut self, page: &dyn Page, x: i32, y: i32, at: Instant) {
        let target = page.element_at(x, y);
        if target.is_some_and(|el| self.is_chrome(page, el)) {
            return;
        }
        self.trigger.touch_start(target, x, y, at);
    }

    pub fn touch_move(&mut self) {
        self.trigger.touch_move();
    }

    pub fn touch_end(&mut self) {
        self.trigger.touch_end();
    }

    pub fn long_press_pending(&self) -> bool {
        self.trigger.is_pending()
    }

    /// Fire a due long-press. Returns whether the menu opened.
    pub fn tick(&mut self, page: &mut dyn Page, now: Instant) -> bool {
        match self.trigger.poll(now) {
            Some(activation) => {
                self.activate(page, activation);
                true
            }
            None => false,
        }
    }

    /// Resolve the target, rebind every action and show the menu
    pub fn activate(&mut self, page: &mut dyn Page, activation: Activation) {
        let resolution = self.resolver.resolve(page, activation.target);
        self.resolver.apply(page, &resolution);
        self.presenter
            .show(page, resolution.target, activation.x, activation.y);
        log::info!(
            "menu opened at ({}, {}) with {} bindings",
            activation.x,
            activation.y,
            resolution.binding.len()
        );
        self.binding = Some(resolution.binding);
    }

    /// Hide the menu and drop the bindings. Safe to call when hidden.
    pub fn dismiss(&mut self, page: &mut dyn Page) {
        self.presenter.dismiss(page);
        self.binding = None;
    }

    /// Route listeners fired by the page. Returns a task when a menu item
    /// started asynchronous work.
    pub fn on_fired(
        &mut self,
        page: &mut dyn Page,
        hooks: &mut dyn Hooks,
        fired: &[ListenerHandle],
        clicked: Option<ElementRef>,
    ) -> Option<Task> {
        let mut task = None;
        for handle in fired {
            if self.read_mode_exit == Some(*handle) {
                self.read_mode_exit = None;
                self.registry.exit_read_mode(page);
                continue;
            }
            let Some(dismissal) = self.presenter.handle_fired(page, *handle, clicked) else {
                continue;
            };
            let binding = self.binding.take();
            if let Dismissal::Item(Some(item)) = dismissal {
                let invocation = self
                    .presenter
                    .item_action(page, item)
                    .and_then(|(group, id)| binding.as_ref()?.get(group, id).cloned());
                match invocation {
                    Some(invocation) => task = self.execute(page, hooks, &invocation),
                    None => log::debug!("menu item has no binding"),
                }
            }
        }
        task
    }

    /// Dismiss and run the currently bound action
    pub fn invoke(
        &mut self,
        page: &mut dyn Page,
        hooks: &mut dyn Hooks,
        id: ActionId,
    ) -> Option<Task> {
        let invocation = self.bound(id).cloned();
        self.dismiss(page);
        self.execute(page, hooks, &invocation?)
    }

    fn execute(
        &mut self,
        page: &mut dyn Page,
        hooks: &mut dyn Hooks,
        invocation: &Invocation,
    ) -> Option<Task> {
        // One exit button at a time; it stays wired until clicked
        if *invocation == Invocation::ReadMode && self.in_read_mode() {
            return None;
        }
        match self.registry.execute(invocation, page, hooks) {
            Outcome::Done => None,
            Outcome::Spawn(task) => Some(task),
            Outcome::ReadMode(handle) => {
                self.read_mode_exit = Some(handle);
                None
            }
        }
    }

    /// Whether reading mode is waiting for its exit click
    pub fn in_read_mode(&self) -> bool {
        self.read_mode_exit.is_some()
    }
}
