//! Publishes a small static launcher menu, standing in for a real `.menu`
//! parser behind the provider trait. Open the menu from any running
//! StatusNotifierItem-capable bar.

use anyhow::Result;
use launcher_menu::{Menu, MenuEntry, MenuProvider, MenuWidget, MenuWidgetAttributes};
use tracing::{debug, info};

struct StaticProvider;

impl MenuProvider for StaticProvider {
    fn load(&self, prefix: Option<&str>) -> Result<Menu> {
        debug!(?prefix, "serving static menu tree");

        Ok(Menu::new("Applications")
            .with_menu(
                Menu::new("Accessories")
                    .with_icon("applications-accessories")
                    .with_entry(
                        MenuEntry::new("Calculator", "gnome-calculator")
                            .with_comment("Perform calculations")
                            .with_icon("accessories-calculator"),
                    )
                    .with_entry(
                        MenuEntry::new("Text Editor", "gedit")
                            .with_icon("accessories-text-editor"),
                    ),
            )
            .with_menu(Menu::new("Empty Category"))
            .with_entry(MenuEntry::new("Terminal", "xterm").with_icon("utilities-terminal")))
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let widget = MenuWidget::new(
        &StaticProvider,
        MenuWidgetAttributes::default().with_icon("start-here"),
    )?;
    info!(?widget, "launcher menu published, press Ctrl-C to exit");

    loop {
        std::thread::park();
    }
}
