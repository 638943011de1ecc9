//! Standard menu markup

use super::{ElementRef, Page, Tag};
use crate::config::DomConfig;
use crate::core::ActionGroup;

/// Build the menu container with every group and item, hidden, under the body.
///
/// Conditional groups carry the hidden-group class so the resolver can hide
/// them on every activation.
pub fn install_menu(page: &mut dyn Page, dom: &DomConfig) -> ElementRef {
    let body = page.body();
    let menu = page.create_element(Tag::Menu, "");
    page.set_attribute(menu, "id", &dom.menu_id);
    page.set_displayed(menu, false);
    page.append_child(body, menu);

    for group in ActionGroup::ALL {
        let class = if group.is_conditional() {
            format!("{} {}", dom.group_class, dom.hidden_group_class)
        } else {
            dom.group_class.clone()
        };
        let group_el = page.create_element(Tag::MenuGroup, &class);
        page.set_attribute(group_el, "id", dom.group_id(group));
        page.set_displayed(group_el, !group.is_conditional());
        page.append_child(menu, group_el);

        for action in group.actions() {
            let item = page.create_element(Tag::MenuItem, &dom.item_class);
            page.set_attribute(item, &dom.action_attribute, action.name());
            page.set_text(item, action.label());
            page.append_child(group_el, item);
        }
    }
    menu
}
