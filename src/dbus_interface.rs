//! D-Bus interfaces exposing the widget to status-bar hosts.
//!
//! Two objects are exported per widget: the `org.kde.StatusNotifierItem`
//! that appears as a button in the bar, and the `com.canonical.dbusmenu`
//! tree the host renders when the button is opened.

use std::collections::HashMap;

use tracing::{trace, warn};
use zbus::object_server::SignalEmitter;
use zbus::zvariant::{ObjectPath, OwnedValue, Type, Value};

use crate::launch;
use crate::layout::{MenuLayout, Node};
use crate::util::SniIcon;

/// Object path the menu layout is served at.
pub(crate) const MENU_OBJECT_PATH: &str = "/MenuBar";

/// StatusNotifierItem D-Bus interface implementation.
///
/// The item is purely a menu anchor; hosts open the attached DBusMenu
/// themselves, so the activation methods carry no behavior of their own.
pub(crate) struct StatusNotifierItemInterface {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) icon_name: String,
    pub(crate) icon_pixmap: Vec<SniIcon>,
}

#[zbus::interface(name = "org.kde.StatusNotifierItem")]
impl StatusNotifierItemInterface {
    fn activate(&self, x: i32, y: i32) {
        trace!(x, y, "StatusNotifierItem::Activate called");
    }

    fn secondary_activate(&self, x: i32, y: i32) {
        trace!(x, y, "StatusNotifierItem::SecondaryActivate called");
    }

    fn scroll(&self, delta: i32, orientation: &str) {
        trace!(delta, orientation, "StatusNotifierItem::Scroll called");
    }

    /// Unique identifier for this widget instance.
    #[zbus(property)]
    fn id(&self) -> &str {
        &self.id
    }

    /// The title hosts show for the bar button.
    #[zbus(property)]
    fn title(&self) -> &str {
        &self.title
    }

    #[zbus(property)]
    fn category(&self) -> &str {
        "ApplicationStatus"
    }

    #[zbus(property)]
    fn status(&self) -> &str {
        "Active"
    }

    #[zbus(property)]
    fn window_id(&self) -> i32 {
        0
    }

    /// Theme icon name for the bar button; empty when a pixmap is used.
    #[zbus(property)]
    fn icon_name(&self) -> &str {
        &self.icon_name
    }

    /// Bar button icon as ARGB32 pixmaps; empty when a theme name is used.
    #[zbus(property)]
    fn icon_pixmap(&self) -> &Vec<SniIcon> {
        &self.icon_pixmap
    }

    #[zbus(property)]
    fn overlay_icon_name(&self) -> &str {
        ""
    }

    #[zbus(property)]
    fn overlay_icon_pixmap(&self) -> Vec<SniIcon> {
        vec![]
    }

    #[zbus(property)]
    fn attention_icon_name(&self) -> &str {
        ""
    }

    #[zbus(property)]
    fn attention_icon_pixmap(&self) -> Vec<SniIcon> {
        vec![]
    }

    #[zbus(property)]
    fn attention_movie_name(&self) -> &str {
        ""
    }

    /// Tooltip information: (icon_name, icon_pixmap, title, description).
    #[zbus(property)]
    fn tool_tip(&self) -> (String, Vec<SniIcon>, String, String) {
        (String::new(), vec![], self.title.clone(), String::new())
    }

    #[zbus(property)]
    fn icon_theme_path(&self) -> &str {
        ""
    }

    /// Object path of the attached menu.
    #[zbus(property)]
    fn menu(&self) -> ObjectPath<'static> {
        ObjectPath::try_from(MENU_OBJECT_PATH).expect("Invalid menu path")
    }

    /// The item is nothing but a menu; hosts should always open it.
    #[zbus(property)]
    fn item_is_menu(&self) -> bool {
        true
    }
}

/// `com.canonical.dbusmenu` implementation serving one immutable
/// [`MenuLayout`].
pub(crate) struct DBusMenuInterface {
    pub(crate) layout: MenuLayout,
}

/// Child values in the `av` slot of a layout item, shaped `(ia{sv}av)`.
#[derive(Debug, Clone, Type, Value, OwnedValue)]
struct LayoutChild {
    id: i32,
    properties: HashMap<String, OwnedValue>,
    children: Vec<OwnedValue>,
}

#[zbus::interface(name = "com.canonical.dbusmenu")]
impl DBusMenuInterface {
    /// Returns the layout under `parent_id`, `recursion_depth` levels deep
    /// (negative means unlimited).
    fn get_layout(
        &self,
        parent_id: i32,
        recursion_depth: i32,
        property_names: Vec<String>,
    ) -> zbus::fdo::Result<(u32, (i32, HashMap<String, OwnedValue>, Vec<OwnedValue>))> {
        trace!(parent_id, recursion_depth, "DBusMenu::GetLayout called");

        let node = self
            .layout
            .find(parent_id)
            .ok_or_else(|| zbus::fdo::Error::InvalidArgs(format!("unknown menu id {parent_id}")))?;

        Ok((
            self.layout.revision,
            layout_item(node, recursion_depth, &property_names),
        ))
    }

    /// Property maps for a batch of items; unknown ids are skipped.
    fn get_group_properties(
        &self,
        ids: Vec<i32>,
        property_names: Vec<String>,
    ) -> Vec<(i32, HashMap<String, OwnedValue>)> {
        ids.iter()
            .filter_map(|id| self.layout.find(*id))
            .map(|node| (node.id, node.properties(&property_names)))
            .collect()
    }

    fn get_property(&self, id: i32, name: String) -> zbus::fdo::Result<OwnedValue> {
        self.layout
            .find(id)
            .and_then(|node| node.properties(std::slice::from_ref(&name)).remove(&name))
            .ok_or_else(|| {
                zbus::fdo::Error::InvalidArgs(format!("no property {name} on menu id {id}"))
            })
    }

    /// Menu item activation. A `clicked` event on an entry launches its
    /// command; every other event is meaningless for a static menu.
    fn event(&self, id: i32, event_id: String, _data: Value<'_>, _timestamp: u32) {
        trace!(id, event_id, "DBusMenu::Event called");

        if event_id != "clicked" {
            return;
        }
        match self.layout.find(id) {
            Some(Node {
                command: Some(command),
                ..
            }) => launch::launch(command),
            Some(_) => {}
            None => warn!(id, "click event for unknown menu id"),
        }
    }

    /// Batched activation; returns the ids that were not found.
    fn event_group(&self, events: Vec<(i32, String, OwnedValue, u32)>) -> Vec<i32> {
        let mut not_found = Vec::new();
        for (id, event_id, _data, _timestamp) in events {
            match self.layout.find(id) {
                Some(Node {
                    command: Some(command),
                    ..
                }) if event_id == "clicked" => launch::launch(command),
                Some(_) => {}
                None => not_found.push(id),
            }
        }
        not_found
    }

    /// The layout never changes after construction, so showing a menu never
    /// requires an update.
    fn about_to_show(&self, _id: i32) -> bool {
        false
    }

    fn about_to_show_group(&self, _ids: Vec<i32>) -> (Vec<i32>, Vec<i32>) {
        (Vec::new(), Vec::new())
    }

    #[zbus(property)]
    fn version(&self) -> u32 {
        3
    }

    #[zbus(property)]
    fn text_direction(&self) -> &str {
        "ltr"
    }

    #[zbus(property)]
    fn status(&self) -> &str {
        "normal"
    }

    #[zbus(property)]
    fn icon_theme_path(&self) -> Vec<String> {
        Vec::new()
    }

    #[zbus(signal)]
    async fn layout_updated(
        emitter: &SignalEmitter<'_>,
        revision: u32,
        parent: i32,
    ) -> zbus::Result<()>;

    #[zbus(signal)]
    async fn items_properties_updated(
        emitter: &SignalEmitter<'_>,
        updated_props: Vec<(i32, HashMap<String, OwnedValue>)>,
        removed_props: Vec<(i32, Vec<String>)>,
    ) -> zbus::Result<()>;
}

/// Serializes one node, `depth` levels of children included, into the
/// `(ia{sv}av)` layout item shape.
fn layout_item(
    node: &Node,
    depth: i32,
    property_names: &[String],
) -> (i32, HashMap<String, OwnedValue>, Vec<OwnedValue>) {
    (
        node.id,
        node.properties(property_names),
        layout_children(node, depth, property_names),
    )
}

fn layout_children(node: &Node, depth: i32, property_names: &[String]) -> Vec<OwnedValue> {
    if depth == 0 {
        return Vec::new();
    }
    let child_depth = if depth < 0 { -1 } else { depth - 1 };

    node.children
        .iter()
        .map(|child| {
            let child = LayoutChild {
                id: child.id,
                properties: child.properties(property_names),
                children: layout_children(child, child_depth, property_names),
            };
            OwnedValue::try_from(Value::from(child)).expect("layout values never hold fds")
        })
        .collect()
}
