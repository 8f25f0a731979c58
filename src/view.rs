// Render model: scan control, device rows, connection panel

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::peripheral::PeripheralId;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Labels {
    #[serde(default = "default_scan")]
    pub scan: String,
    #[serde(default = "default_connected")]
    pub connected: String,
    #[serde(default = "default_panel_title")]
    pub panel_title: String,
    #[serde(default = "default_disconnect")]
    pub disconnect: String,
}

fn default_scan() -> String {
    "Scan".to_string()
}

fn default_connected() -> String {
    "Connected".to_string()
}

fn default_panel_title() -> String {
    "Thiết Bị Đã Kết Nối".to_string()
}

fn default_disconnect() -> String {
    "Ngắt Kết Nối".to_string()
}

impl Default for Labels {
    fn default() -> Self {
        Labels {
            scan: default_scan(),
            connected: default_connected(),
            panel_title: default_panel_title(),
            disconnect: default_disconnect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct View {
    pub scan_label: String,
    pub rows: Vec<Row>,
    pub panel: Option<Panel>,
    #[serde(skip)]
    connected_label: String,
}

/// One listed peripheral. `index` is the 1-based number the user types to
/// select it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    pub index: usize,
    pub name: String,
    pub id: PeripheralId,
    pub connected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Panel {
    pub title: String,
    pub name: String,
    pub id: PeripheralId,
    pub disconnect_label: String,
}

impl View {
    pub(crate) fn new(labels: &Labels, rows: Vec<Row>, panel: Option<Panel>) -> Self {
        View {
            scan_label: labels.scan.clone(),
            rows,
            panel,
            connected_label: labels.connected.clone(),
        }
    }

    pub fn connected_rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter().filter(|row| row.connected)
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[ {} ]", self.scan_label)?;
        for row in &self.rows {
            writeln!(f, "{:>3}. {}", row.index, row.name)?;
            writeln!(f, "     {}", row.id)?;
            if row.connected {
                writeln!(f, "     {}", self.connected_label)?;
            }
        }
        if let Some(panel) = &self.panel {
            writeln!(f, "{}", "-".repeat(32))?;
            writeln!(f, "{}", panel.title)?;
            writeln!(f, "{}", panel.name)?;
            writeln!(f, "{}", panel.id)?;
            writeln!(f, "[ {} ]", panel.disconnect_label)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(index: usize, name: &str, id: &str, connected: bool) -> Row {
        Row {
            index,
            name: name.to_string(),
            id: id.into(),
            connected,
        }
    }

    #[test]
    fn renders_rows_without_panel() {
        let view = View::new(
            &Labels::default(),
            vec![row(1, "Foo", "AA", false), row(2, "Bar", "BB", false)],
            None,
        );

        let text = view.to_string();
        assert_eq!(text, "[ Scan ]\n  1. Foo\n     AA\n  2. Bar\n     BB\n");
    }

    #[test]
    fn renders_connected_label_and_panel() {
        let labels = Labels::default();
        let view = View::new(
            &labels,
            vec![row(1, "Foo", "AA", true)],
            Some(Panel {
                title: labels.panel_title.clone(),
                name: "Foo".to_string(),
                id: "AA".into(),
                disconnect_label: labels.disconnect.clone(),
            }),
        );

        let text = view.to_string();
        assert!(text.contains("     Connected\n"));
        assert!(text.contains("Thiết Bị Đã Kết Nối\nFoo\nAA\n[ Ngắt Kết Nối ]\n"));
    }

    #[test]
    fn serializes_for_machine_output() {
        let view = View::new(&Labels::default(), vec![row(1, "Foo", "AA", true)], None);
        let json = serde_json::to_value(&view).expect("serialize");

        assert_eq!(json["scan_label"], "Scan");
        assert_eq!(json["rows"][0]["id"], "AA");
        assert_eq!(json["rows"][0]["connected"], true);
        assert!(json["panel"].is_null());
        assert!(json.get("connected_label").is_none());
    }
}
