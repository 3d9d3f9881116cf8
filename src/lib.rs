//! XDG application-launcher menu widget for status bars.
//!
//! This crate walks a parsed menu tree — assembled elsewhere, per the XDG
//! Desktop Menu Specification — once, and publishes the matching menu over
//! the StatusNotifierItem and DBusMenu D-Bus protocols so a status-bar host
//! can embed it. Activating a leaf launches the entry's command, detached.
//!
//! Menu-file and desktop-entry parsing stay behind the [`MenuProvider`]
//! trait; this crate only renders the finished tree.
//!
//! ```no_run
//! use launcher_menu::{Menu, MenuEntry, MenuProvider, MenuWidget, MenuWidgetAttributes};
//!
//! struct Provider;
//!
//! impl MenuProvider for Provider {
//!     fn load(&self, _prefix: Option<&str>) -> anyhow::Result<Menu> {
//!         Ok(Menu::new("Applications").with_menu(
//!             Menu::new("Accessories")
//!                 .with_entry(MenuEntry::new("Calculator", "gnome-calculator")),
//!         ))
//!     }
//! }
//!
//! let widget = MenuWidget::new(&Provider, MenuWidgetAttributes::default())?;
//! # Ok::<(), anyhow::Error>(())
//! ```

mod dbus_interface;
pub mod icon;
mod launch;
mod layout;
pub mod menu;
mod util;
mod widget;

pub use icon::{IconImage, MenuIcon};
pub use menu::{Menu, MenuEntry, MenuProvider};
pub use widget::{MenuWidget, MenuWidgetAttributes};
