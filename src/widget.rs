//! Top-level widget construction and the D-Bus service lifetime.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use tracing::{debug, error, trace, warn};
use zbus::blocking::Connection;

use crate::dbus_interface::{DBusMenuInterface, MENU_OBJECT_PATH, StatusNotifierItemInterface};
use crate::icon::{self, MenuIcon};
use crate::layout::MenuLayout;
use crate::menu::MenuProvider;
use crate::util::{self, SniIcon};

static COUNTER: AtomicUsize = AtomicUsize::new(1);

const SNI_OBJECT_PATH: &str = "/StatusNotifierItem";
const SNI_WATCHER_SERVICE: &str = "org.kde.StatusNotifierWatcher";
const SNI_WATCHER_PATH: &str = "/StatusNotifierWatcher";

/// Configuration for building a launcher menu widget.
#[derive(Debug, Clone)]
pub struct MenuWidgetAttributes {
    /// Menu-name prefix handed to the provider; `None` selects the
    /// provider's default menu definition.
    pub prefix: Option<String>,
    /// Title hosts show for the bar button.
    pub title: String,
    /// Icon identifier for the bar button, resolved like menu icons.
    pub icon: Option<String>,
}

impl Default for MenuWidgetAttributes {
    fn default() -> Self {
        MenuWidgetAttributes {
            prefix: None,
            title: "Applications".to_string(),
            icon: None,
        }
    }
}

impl MenuWidgetAttributes {
    /// Set the menu-name prefix used to select the on-disk menu definition.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Set the title for the bar button.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the icon identifier for the bar button.
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// A ready-to-display launcher menu, live on the session bus until dropped.
pub struct MenuWidget {
    internal_id: usize,
    // Handle to the background thread serving D-Bus requests
    thread_handle: Option<thread::JoinHandle<()>>,
    // Channel to signal the background thread to stop
    shutdown_tx: Option<mpsc::Sender<()>>,
}

impl std::fmt::Debug for MenuWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MenuWidget")
            .field("internal_id", &self.internal_id)
            .finish()
    }
}

impl MenuWidget {
    /// Builds the widget: obtains the menu tree from `provider`, renders it
    /// once, and publishes it for status-bar hosts to embed.
    ///
    /// Failure to obtain the tree fails the whole call and no widget
    /// appears. Unresolvable icons degrade individual items but never block
    /// construction. Repeated calls produce independent widgets.
    pub fn new(provider: &dyn MenuProvider, attr: MenuWidgetAttributes) -> Result<Self> {
        let internal_id = COUNTER.fetch_add(1, Ordering::Relaxed);
        debug!(internal_id, prefix = ?attr.prefix, "building launcher menu widget");

        let root = provider
            .load(attr.prefix.as_deref())
            .context("failed to obtain menu tree")?;
        let layout = MenuLayout::build(&root);

        let (icon_name, icon_pixmap) = match icon::resolve(attr.icon.as_deref()) {
            Some(MenuIcon::Named(name)) => (name, Vec::new()),
            Some(MenuIcon::Image(image)) => {
                (String::new(), vec![util::image_to_sni_icon(&image)])
            }
            None => (String::new(), Vec::new()),
        };

        let id = format!("launcher_menu_{internal_id}");
        let title = attr.title;

        let (shutdown_tx, shutdown_rx) = mpsc::channel();

        let thread_handle = thread::spawn(move || {
            if let Err(err) =
                run_dbus_service(id, title, icon_name, icon_pixmap, layout, shutdown_rx)
            {
                error!("D-Bus service error: {err}");
            }
        });

        Ok(MenuWidget {
            internal_id,
            thread_handle: Some(thread_handle),
            shutdown_tx: Some(shutdown_tx),
        })
    }
}

impl Drop for MenuWidget {
    fn drop(&mut self) {
        debug!(internal_id = self.internal_id, "dropping launcher menu widget");

        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }

        // Give the service thread a short time to unregister and clean up
        if let Some(handle) = self.thread_handle.take() {
            let timeout = Duration::from_millis(500);
            let start = Instant::now();

            while !handle.is_finished() && start.elapsed() < timeout {
                thread::sleep(Duration::from_millis(10));
            }

            if handle.is_finished() {
                let _ = handle.join();
            } else {
                warn!("D-Bus service thread did not exit cleanly within timeout");
            }
        }
    }
}

/// Runs the D-Bus service on a background thread: connects to the session
/// bus, exports the item and menu objects, registers with the
/// StatusNotifierWatcher so hosts pick the widget up, then waits for the
/// shutdown signal.
fn run_dbus_service(
    id: String,
    title: String,
    icon_name: String,
    icon_pixmap: Vec<SniIcon>,
    layout: MenuLayout,
    shutdown_rx: mpsc::Receiver<()>,
) -> Result<()> {
    trace!("starting D-Bus service thread");

    let connection = Connection::session().context("failed to connect to D-Bus session bus")?;

    let item = StatusNotifierItemInterface {
        id,
        title,
        icon_name,
        icon_pixmap,
    };
    connection
        .object_server()
        .at(SNI_OBJECT_PATH, item)
        .context("failed to register StatusNotifierItem interface")?;
    connection
        .object_server()
        .at(MENU_OBJECT_PATH, DBusMenuInterface { layout })
        .context("failed to register DBusMenu interface")?;

    debug!(item = SNI_OBJECT_PATH, menu = MENU_OBJECT_PATH, "registered D-Bus interfaces");

    if let Err(err) = register_with_watcher(&connection) {
        warn!("failed to register with StatusNotifierWatcher: {err}. The menu may not appear.");
    }

    match shutdown_rx.recv() {
        Ok(_) => debug!("received shutdown signal, cleaning up"),
        Err(_) => debug!("shutdown channel disconnected, exiting"),
    }

    if let Err(err) = unregister_from_watcher(&connection) {
        warn!("failed to unregister from StatusNotifierWatcher: {err}");
    }

    let _ = connection
        .object_server()
        .remove::<StatusNotifierItemInterface, _>(SNI_OBJECT_PATH);
    let _ = connection
        .object_server()
        .remove::<DBusMenuInterface, _>(MENU_OBJECT_PATH);

    debug!("D-Bus service thread exiting cleanly");
    Ok(())
}

/// Registers the widget with the StatusNotifierWatcher, the system service
/// that tells status bars which items exist.
fn register_with_watcher(connection: &Connection) -> Result<()> {
    trace!("registering with StatusNotifierWatcher");

    let unique_name = connection
        .unique_name()
        .ok_or_else(|| anyhow!("failed to get D-Bus unique name"))?;
    let service_name = format!("{unique_name}{SNI_OBJECT_PATH}");

    let proxy = zbus::blocking::Proxy::new(
        connection,
        SNI_WATCHER_SERVICE,
        SNI_WATCHER_PATH,
        "org.kde.StatusNotifierWatcher",
    )?;

    proxy
        .call::<&str, _, ()>("RegisterStatusNotifierItem", &service_name)
        .context("failed to call RegisterStatusNotifierItem")?;

    debug!(service = %service_name, "registered with StatusNotifierWatcher");
    Ok(())
}

/// Unregisters the widget so it disappears from bars immediately. Some
/// watcher implementations lack the method, so call errors are ignored.
fn unregister_from_watcher(connection: &Connection) -> Result<()> {
    trace!("unregistering from StatusNotifierWatcher");

    let unique_name = connection
        .unique_name()
        .ok_or_else(|| anyhow!("failed to get D-Bus unique name"))?;
    let service_name = format!("{unique_name}{SNI_OBJECT_PATH}");

    if let Ok(proxy) = zbus::blocking::Proxy::new(
        connection,
        SNI_WATCHER_SERVICE,
        SNI_WATCHER_PATH,
        "org.kde.StatusNotifierWatcher",
    ) {
        let _ = proxy.call::<&str, _, ()>("UnregisterStatusNotifierItem", &service_name);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::Menu;

    struct FailingProvider;

    impl MenuProvider for FailingProvider {
        fn load(&self, _prefix: Option<&str>) -> Result<Menu> {
            Err(anyhow!("no matching menu definition file"))
        }
    }

    #[test]
    fn provider_failure_fails_the_whole_build() {
        let err = MenuWidget::new(&FailingProvider, MenuWidgetAttributes::default()).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("failed to obtain menu tree"));
        assert!(message.contains("no matching menu definition file"));
    }

    #[test]
    fn attributes_build_up_by_value() {
        let attr = MenuWidgetAttributes::default()
            .with_prefix("xfce-")
            .with_title("Apps")
            .with_icon("start-here");
        assert_eq!(attr.prefix.as_deref(), Some("xfce-"));
        assert_eq!(attr.title, "Apps");
        assert_eq!(attr.icon.as_deref(), Some("start-here"));
    }
}
