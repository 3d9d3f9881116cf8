//! Menu tree model and the provider contract.
//!
//! The tree is assembled elsewhere, by a parser following the XDG Desktop
//! Menu Specification, and handed to this crate fully resolved. Nothing here
//! reads `.menu` files or desktop entries.

use anyhow::Result;

/// One category level of the launcher menu.
#[derive(Debug, Clone, Default)]
pub struct Menu {
    /// Display name of the category.
    pub name: String,
    /// Optional icon identifier: a theme icon name or an absolute file path.
    pub icon: Option<String>,
    /// Child categories, in display order.
    pub menus: Vec<Menu>,
    /// Launchable entries, in display order.
    pub entries: Vec<MenuEntry>,
}

impl Menu {
    /// Create a new category with the given display name.
    pub fn new(name: impl Into<String>) -> Self {
        Menu {
            name: name.into(),
            icon: None,
            menus: Vec::new(),
            entries: Vec::new(),
        }
    }

    /// Set the icon identifier for this category.
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Append a child category.
    pub fn with_menu(mut self, menu: Menu) -> Self {
        self.menus.push(menu);
        self
    }

    /// Append a launchable entry.
    pub fn with_entry(mut self, entry: MenuEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Whether this category holds neither child categories nor entries.
    ///
    /// Empty categories are skipped entirely during rendering.
    pub fn is_empty(&self) -> bool {
        self.menus.is_empty() && self.entries.is_empty()
    }
}

/// A single launchable application reference.
#[derive(Debug, Clone)]
pub struct MenuEntry {
    /// Text label displayed for this entry.
    pub label: String,
    /// Optional tooltip text shown for the entry.
    pub comment: Option<String>,
    /// Optional icon identifier: a theme icon name or an absolute file path.
    pub icon: Option<String>,
    /// Shell command line started when the entry is activated.
    pub command: String,
}

impl MenuEntry {
    /// Create a new entry with the given label and launch command.
    pub fn new(label: impl Into<String>, command: impl Into<String>) -> Self {
        MenuEntry {
            label: label.into(),
            comment: None,
            icon: None,
            command: command.into(),
        }
    }

    /// Set the tooltip text for this entry.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Set the icon identifier for this entry.
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// Source of parsed menu trees.
///
/// Implementations locate the on-disk menu definition selected by `prefix`
/// (`None` means the implementation's default resolution rule, e.g. a name
/// derived from `XDG_MENU_PREFIX`), parse it, and return the root [`Menu`].
/// Failure to locate or parse a definition is fatal to the widget build;
/// there is no partial-result path.
pub trait MenuProvider {
    /// Resolve and parse the menu definition selected by `prefix`.
    fn load(&self, prefix: Option<&str>) -> Result<Menu>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_without_children_or_entries_is_empty() {
        assert!(Menu::new("Empty").is_empty());
    }

    #[test]
    fn menu_with_a_child_menu_is_not_empty() {
        let menu = Menu::new("Top").with_menu(Menu::new("Nested"));
        assert!(!menu.is_empty());
    }

    #[test]
    fn menu_with_an_entry_is_not_empty() {
        let menu = Menu::new("Top").with_entry(MenuEntry::new("Terminal", "xterm"));
        assert!(!menu.is_empty());
    }

    #[test]
    fn builders_preserve_insertion_order() {
        let menu = Menu::new("Top")
            .with_entry(MenuEntry::new("A", "a"))
            .with_entry(MenuEntry::new("B", "b"));
        let labels: Vec<_> = menu.entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, ["A", "B"]);
    }

    #[test]
    fn entry_fields_default_to_absent() {
        let entry = MenuEntry::new("Calculator", "gnome-calculator");
        assert_eq!(entry.comment, None);
        assert_eq!(entry.icon, None);
    }
}
