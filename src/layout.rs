//! Renders a parsed menu tree into the DBusMenu layout served to hosts.
//!
//! The walk happens once per widget build: depth-first, preserving the
//! provider's order at every level, skipping empty categories. The result is
//! immutable; activation and property queries read it without locking.

use std::collections::HashMap;

use tracing::warn;
use zbus::zvariant::{OwnedValue, Value};

use crate::icon::{self, MenuIcon};
use crate::menu::{Menu, MenuEntry};
use crate::util;

/// Root node id mandated by the DBusMenu protocol.
pub(crate) const ROOT_ID: i32 = 0;

/// One rendered menu node.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub id: i32,
    pub label: String,
    pub tooltip: Option<String>,
    pub icon: Option<MenuIcon>,
    /// Shell command started on activation. `None` for the root and for
    /// submenu containers.
    pub command: Option<String>,
    pub children: Vec<Node>,
}

/// The rendered widget tree for one build.
#[derive(Debug, Clone)]
pub(crate) struct MenuLayout {
    pub revision: u32,
    pub root: Node,
}

impl MenuLayout {
    /// Renders `menu`'s child categories and entries directly into the
    /// layout root. The root category itself never becomes a submenu item;
    /// only its contents appear at the top level.
    pub fn build(menu: &Menu) -> Self {
        let mut next_id = ROOT_ID + 1;
        let mut root = Node {
            id: ROOT_ID,
            label: String::new(),
            tooltip: None,
            icon: None,
            command: None,
            children: Vec::new(),
        };
        render_into(&mut root, menu, &mut next_id);
        MenuLayout { revision: 1, root }
    }

    /// Locates a node by id anywhere in the tree.
    pub fn find(&self, id: i32) -> Option<&Node> {
        fn walk(node: &Node, id: i32) -> Option<&Node> {
            if node.id == id {
                return Some(node);
            }
            node.children.iter().find_map(|child| walk(child, id))
        }
        walk(&self.root, id)
    }
}

/// Renders a category's child menus and entries into `parent`, child menus
/// first, both in the provider's order.
fn render_into(parent: &mut Node, menu: &Menu, next_id: &mut i32) {
    for child in &menu.menus {
        render_menu(parent, child, next_id);
    }
    for entry in &menu.entries {
        render_entry(parent, entry, next_id);
    }
}

/// Renders one category as a submenu of `parent`. Categories with no child
/// menus and no entries render as nothing.
fn render_menu(parent: &mut Node, menu: &Menu, next_id: &mut i32) {
    if menu.is_empty() {
        return;
    }

    let mut node = Node {
        id: take_id(next_id),
        label: menu.name.clone(),
        tooltip: None,
        icon: icon::resolve(menu.icon.as_deref()),
        command: None,
        children: Vec::new(),
    };
    render_into(&mut node, menu, next_id);
    parent.children.push(node);
}

/// Renders one launchable entry as a clickable item of `parent`.
fn render_entry(parent: &mut Node, entry: &MenuEntry, next_id: &mut i32) {
    parent.children.push(Node {
        id: take_id(next_id),
        label: entry.label.clone(),
        tooltip: entry.comment.clone(),
        icon: icon::resolve(entry.icon.as_deref()),
        command: Some(entry.command.clone()),
        children: Vec::new(),
    });
}

fn take_id(next_id: &mut i32) -> i32 {
    let id = *next_id;
    *next_id += 1;
    id
}

impl Node {
    /// DBusMenu property map for this node. Protocol defaults (`enabled`,
    /// `visible`, `type`) are omitted; an empty `filter` selects everything.
    pub fn properties(&self, filter: &[String]) -> HashMap<String, OwnedValue> {
        let mut props = HashMap::new();
        let mut insert = |name: &str, value: Value<'static>| {
            if filter.is_empty() || filter.iter().any(|f| f == name) {
                props.insert(
                    name.to_owned(),
                    OwnedValue::try_from(value).expect("property values never hold fds"),
                );
            }
        };

        if self.id != ROOT_ID {
            insert("label", Value::from(self.label.clone()));
        }
        // Submenu containers, the root included, announce themselves so
        // hosts render an expandable item even when a category came out
        // empty of visible children.
        if self.command.is_none() {
            insert("children-display", Value::from("submenu".to_owned()));
        }
        if let Some(tooltip) = &self.tooltip {
            insert("accessible-desc", Value::from(tooltip.clone()));
        }
        match &self.icon {
            Some(MenuIcon::Named(name)) => insert("icon-name", Value::from(name.clone())),
            Some(MenuIcon::Image(image)) => match util::image_to_png(image) {
                Ok(data) => insert("icon-data", Value::from(data)),
                Err(err) => warn!(%err, label = %self.label, "failed to encode menu icon"),
            },
            None => {}
        }

        props
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::{Menu, MenuEntry};

    fn labels(node: &Node) -> Vec<&str> {
        node.children.iter().map(|child| child.label.as_str()).collect()
    }

    #[test]
    fn empty_category_renders_nothing() {
        let root = Menu::new("root").with_menu(Menu::new("Empty"));
        let layout = MenuLayout::build(&root);
        assert!(layout.root.children.is_empty());
    }

    #[test]
    fn empty_category_is_skipped_next_to_a_direct_entry() {
        let root = Menu::new("root")
            .with_menu(Menu::new("Empty"))
            .with_entry(MenuEntry::new("Terminal", "xterm"));
        let layout = MenuLayout::build(&root);
        assert_eq!(labels(&layout.root), ["Terminal"]);
    }

    #[test]
    fn order_is_preserved_at_every_level() {
        let root = Menu::new("root")
            .with_menu(
                Menu::new("Office")
                    .with_entry(MenuEntry::new("Writer", "writer"))
                    .with_entry(MenuEntry::new("Spreadsheet", "spreadsheet")),
            )
            .with_menu(Menu::new("Games").with_entry(MenuEntry::new("Chess", "chess")))
            .with_entry(MenuEntry::new("Terminal", "xterm"));
        let layout = MenuLayout::build(&root);

        assert_eq!(labels(&layout.root), ["Office", "Games", "Terminal"]);
        assert_eq!(labels(&layout.root.children[0]), ["Writer", "Spreadsheet"]);
        assert_eq!(labels(&layout.root.children[1]), ["Chess"]);
    }

    #[test]
    fn accessories_scenario_builds_one_nested_item() {
        let root = Menu::new("root").with_menu(
            Menu::new("Accessories")
                .with_entry(MenuEntry::new("Calculator", "gnome-calculator").with_icon("calc")),
        );
        let layout = MenuLayout::build(&root);

        assert_eq!(labels(&layout.root), ["Accessories"]);
        let accessories = &layout.root.children[0];
        assert!(accessories.command.is_none());
        assert_eq!(labels(accessories), ["Calculator"]);

        let calculator = &accessories.children[0];
        assert_eq!(calculator.command.as_deref(), Some("gnome-calculator"));
        assert_eq!(calculator.tooltip, None);
        assert!(calculator.children.is_empty());
    }

    #[test]
    fn comment_becomes_tooltip_exactly() {
        let root = Menu::new("root").with_entry(
            MenuEntry::new("Calculator", "gnome-calculator").with_comment("Do arithmetic"),
        );
        let layout = MenuLayout::build(&root);
        assert_eq!(layout.root.children[0].tooltip.as_deref(), Some("Do arithmetic"));
    }

    #[test]
    fn ids_are_unique_and_root_is_zero() {
        fn collect(node: &Node, ids: &mut Vec<i32>) {
            ids.push(node.id);
            for child in &node.children {
                collect(child, ids);
            }
        }

        let root = Menu::new("root")
            .with_menu(Menu::new("Office").with_entry(MenuEntry::new("Writer", "writer")))
            .with_entry(MenuEntry::new("Terminal", "xterm"));
        let layout = MenuLayout::build(&root);

        let mut ids = Vec::new();
        collect(&layout.root, &mut ids);
        assert_eq!(ids[0], ROOT_ID);

        let mut deduped = ids.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(deduped.len(), ids.len());
    }

    #[test]
    fn find_locates_nested_nodes() {
        let root = Menu::new("root")
            .with_menu(Menu::new("Office").with_entry(MenuEntry::new("Writer", "writer")));
        let layout = MenuLayout::build(&root);

        let writer_id = layout.root.children[0].children[0].id;
        assert_eq!(layout.find(writer_id).unwrap().label, "Writer");
        assert!(layout.find(1000).is_none());
    }

    #[test]
    fn properties_mark_entries_and_submenus_apart() {
        let root = Menu::new("root").with_menu(
            Menu::new("Office").with_entry(MenuEntry::new("Writer", "writer").with_comment("Write")),
        );
        let layout = MenuLayout::build(&root);

        let office = &layout.root.children[0];
        let props = office.properties(&[]);
        assert_eq!(String::try_from(props["label"].clone()).unwrap(), "Office");
        assert_eq!(
            String::try_from(props["children-display"].clone()).unwrap(),
            "submenu"
        );

        let writer = &office.children[0];
        let props = writer.properties(&[]);
        assert!(!props.contains_key("children-display"));
        assert_eq!(
            String::try_from(props["accessible-desc"].clone()).unwrap(),
            "Write"
        );
    }

    #[test]
    fn entry_without_comment_has_no_tooltip_property() {
        let root = Menu::new("root").with_entry(MenuEntry::new("Terminal", "xterm"));
        let layout = MenuLayout::build(&root);
        let props = layout.root.children[0].properties(&[]);
        assert!(!props.contains_key("accessible-desc"));
    }

    #[test]
    fn property_filter_limits_the_map() {
        let root = Menu::new("root")
            .with_entry(MenuEntry::new("Terminal", "xterm").with_comment("A terminal"));
        let layout = MenuLayout::build(&root);

        let props = layout.root.children[0].properties(&["label".to_owned()]);
        assert_eq!(props.len(), 1);
        assert!(props.contains_key("label"));
    }
}
