use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;

/// Category of an accessibility element.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ControlType {
    AppBar,
    Button,
    Calendar,
    CheckBox,
    ComboBox,
    Custom,
    DataGrid,
    DataItem,
    Document,
    Edit,
    Group,
    Header,
    HeaderItem,
    Hyperlink,
    Image,
    List,
    ListItem,
    Menu,
    MenuBar,
    MenuItem,
    Pane,
    ProgressBar,
    RadioButton,
    ScrollBar,
    SemanticZoom,
    Separator,
    Slider,
    Spinner,
    SplitButton,
    StatusBar,
    Tab,
    TabItem,
    Table,
    Text,
    Thumb,
    TitleBar,
    ToolBar,
    ToolTip,
    Tree,
    TreeItem,
    Window,
}

static BY_NAME: Lazy<HashMap<String, ControlType>> = Lazy::new(|| {
    ControlType::ALL
        .iter()
        .map(|ty| (ty.name().to_ascii_lowercase(), *ty))
        .collect()
});

impl ControlType {
    pub const ALL: [ControlType; 41] = [
        ControlType::AppBar,
        ControlType::Button,
        ControlType::Calendar,
        ControlType::CheckBox,
        ControlType::ComboBox,
        ControlType::Custom,
        ControlType::DataGrid,
        ControlType::DataItem,
        ControlType::Document,
        ControlType::Edit,
        ControlType::Group,
        ControlType::Header,
        ControlType::HeaderItem,
        ControlType::Hyperlink,
        ControlType::Image,
        ControlType::List,
        ControlType::ListItem,
        ControlType::Menu,
        ControlType::MenuBar,
        ControlType::MenuItem,
        ControlType::Pane,
        ControlType::ProgressBar,
        ControlType::RadioButton,
        ControlType::ScrollBar,
        ControlType::SemanticZoom,
        ControlType::Separator,
        ControlType::Slider,
        ControlType::Spinner,
        ControlType::SplitButton,
        ControlType::StatusBar,
        ControlType::Tab,
        ControlType::TabItem,
        ControlType::Table,
        ControlType::Text,
        ControlType::Thumb,
        ControlType::TitleBar,
        ControlType::ToolBar,
        ControlType::ToolTip,
        ControlType::Tree,
        ControlType::TreeItem,
        ControlType::Window,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ControlType::AppBar => "AppBar",
            ControlType::Button => "Button",
            ControlType::Calendar => "Calendar",
            ControlType::CheckBox => "CheckBox",
            ControlType::ComboBox => "ComboBox",
            ControlType::Custom => "Custom",
            ControlType::DataGrid => "DataGrid",
            ControlType::DataItem => "DataItem",
            ControlType::Document => "Document",
            ControlType::Edit => "Edit",
            ControlType::Group => "Group",
            ControlType::Header => "Header",
            ControlType::HeaderItem => "HeaderItem",
            ControlType::Hyperlink => "Hyperlink",
            ControlType::Image => "Image",
            ControlType::List => "List",
            ControlType::ListItem => "ListItem",
            ControlType::Menu => "Menu",
            ControlType::MenuBar => "MenuBar",
            ControlType::MenuItem => "MenuItem",
            ControlType::Pane => "Pane",
            ControlType::ProgressBar => "ProgressBar",
            ControlType::RadioButton => "RadioButton",
            ControlType::ScrollBar => "ScrollBar",
            ControlType::SemanticZoom => "SemanticZoom",
            ControlType::Separator => "Separator",
            ControlType::Slider => "Slider",
            ControlType::Spinner => "Spinner",
            ControlType::SplitButton => "SplitButton",
            ControlType::StatusBar => "StatusBar",
            ControlType::Tab => "Tab",
            ControlType::TabItem => "TabItem",
            ControlType::Table => "Table",
            ControlType::Text => "Text",
            ControlType::Thumb => "Thumb",
            ControlType::TitleBar => "TitleBar",
            ControlType::ToolBar => "ToolBar",
            ControlType::ToolTip => "ToolTip",
            ControlType::Tree => "Tree",
            ControlType::TreeItem => "TreeItem",
            ControlType::Window => "Window",
        }
    }

    /// Resolve a type name through the static registry (ASCII case-insensitive).
    pub fn lookup(name: &str) -> Option<ControlType> {
        BY_NAME.get(&name.to_ascii_lowercase()).copied()
    }
}

impl fmt::Display for ControlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ControlType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ControlType::lookup(s).ok_or_else(|| format!("unknown control type '{s}'"))
    }
}
