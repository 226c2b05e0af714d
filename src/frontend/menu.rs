// src/frontend/menu.rs

//! The fixed "Game" menu handed to the driver at window construction.

use crate::midend::Command;
use crate::platform::MenuAction;

#[derive(Debug, Clone, PartialEq)]
pub enum MenuItem {
    Entry { label: String, action: MenuAction },
    Submenu { label: String, items: Vec<MenuItem> },
    Separator,
}

impl MenuItem {
    fn key(label: &str, key: u8) -> Self {
        MenuItem::Entry {
            label: label.to_string(),
            action: MenuAction::Key(Command::Char(key)),
        }
    }

    /// Depth-first list of every activatable entry.
    pub fn entries(items: &[MenuItem]) -> Vec<(&str, MenuAction)> {
        let mut out = Vec::new();
        for item in items {
            match item {
                MenuItem::Entry { label, action } => out.push((label.as_str(), *action)),
                MenuItem::Submenu { items, .. } => out.extend(Self::entries(items)),
                MenuItem::Separator => {}
            }
        }
        out
    }
}

/// New, Restart, the presets under "Type" (omitted when there are none),
/// Undo, Redo, Exit.
pub fn game_menu(preset_names: &[String]) -> Vec<MenuItem> {
    let mut menu = vec![MenuItem::key("New", b'n'), MenuItem::key("Restart", b'r')];
    if !preset_names.is_empty() {
        let items = preset_names
            .iter()
            .enumerate()
            .map(|(i, name)| MenuItem::Entry {
                label: name.clone(),
                action: MenuAction::Preset(i),
            })
            .collect();
        menu.push(MenuItem::Submenu {
            label: "Type".to_string(),
            items,
        });
    }
    menu.push(MenuItem::Separator);
    menu.push(MenuItem::key("Undo", b'u'));
    menu.push(MenuItem::key("Redo", 0x12));
    menu.push(MenuItem::Separator);
    menu.push(MenuItem::key("Exit", b'q'));
    menu
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_without_presets_has_no_type_submenu() {
        let menu = game_menu(&[]);
        assert!(!menu.iter().any(|i| matches!(i, MenuItem::Submenu { .. })));
        let entries = MenuItem::entries(&menu);
        let labels: Vec<&str> = entries.iter().map(|(l, _)| *l).collect();
        assert_eq!(labels, ["New", "Restart", "Undo", "Redo", "Exit"]);
    }

    #[test]
    fn key_entries_carry_the_engine_codes() {
        let presets = vec!["5x5".to_string(), "8x8".to_string()];
        let menu = game_menu(&presets);
        let entries = MenuItem::entries(&menu);
        assert_eq!(entries[0].1, MenuAction::Key(Command::Char(b'n')));
        assert_eq!(entries[2], ("5x5", MenuAction::Preset(0)));
        assert_eq!(entries[3], ("8x8", MenuAction::Preset(1)));
        assert_eq!(entries[5], ("Redo", MenuAction::Key(Command::Char(0x12))));
        assert_eq!(entries[6], ("Exit", MenuAction::Key(Command::Char(b'q'))));
    }
}
