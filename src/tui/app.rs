use std::collections::HashSet;

use crate::domain::NewsItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    List,
    Reader,
    Help,
}

pub struct TuiApp {
    pub view: View,
    /// View to return to when help is closed.
    pub previous_view: View,
    pub items: Vec<NewsItem>,
    pub read_ids: HashSet<String>,
    pub cursor: usize,
    pub reader_scroll: u16,
    pub should_quit: bool,
    pub status_message: Option<String>,
    pub is_refreshing: bool,
}

impl TuiApp {
    pub fn new(items: Vec<NewsItem>, read_ids: HashSet<String>) -> Self {
        Self {
            view: View::List,
            previous_view: View::List,
            items,
            read_ids,
            cursor: 0,
            reader_scroll: 0,
            should_quit: false,
            status_message: None,
            is_refreshing: false,
        }
    }

    pub fn selected_item(&self) -> Option<&NewsItem> {
        self.items.get(self.cursor)
    }

    pub fn is_item_read(&self, item_id: &str) -> bool {
        self.read_ids.contains(item_id)
    }

    pub fn unread_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| !self.is_item_read(&item.id))
            .count()
    }

    pub fn set_read(&mut self, item_id: &str, read: bool) {
        if read {
            self.read_ids.insert(item_id.to_string());
        } else {
            self.read_ids.remove(item_id);
        }
    }

    /// Replace the item list, keeping the cursor on the same item if it is
    /// still present.
    pub fn replace_items(&mut self, items: Vec<NewsItem>, read_ids: HashSet<String>) {
        let selected = self.selected_item().map(|i| i.id.clone());
        self.items = items;
        self.read_ids = read_ids;
        self.cursor = selected
            .and_then(|id| self.items.iter().position(|i| i.id == id))
            .unwrap_or(0);
        if self.view == View::Reader && self.items.is_empty() {
            self.view = View::List;
        }
        self.reader_scroll = self.reader_scroll.min(self.reader_max_scroll());
    }

    pub fn move_up(&mut self) {
        match self.view {
            View::List => self.cursor = self.cursor.saturating_sub(1),
            View::Reader => self.reader_scroll = self.reader_scroll.saturating_sub(1),
            View::Help => {}
        }
    }

    pub fn move_down(&mut self) {
        match self.view {
            View::List => {
                if self.cursor + 1 < self.items.len() {
                    self.cursor += 1;
                }
            }
            View::Reader => {
                let max = self.reader_max_scroll();
                self.reader_scroll = self.reader_scroll.saturating_add(1).min(max);
            }
            View::Help => {}
        }
    }

    pub fn go_top(&mut self) {
        match self.view {
            View::List => self.cursor = 0,
            View::Reader => self.reader_scroll = 0,
            View::Help => {}
        }
    }

    pub fn go_bottom(&mut self) {
        match self.view {
            View::List => self.cursor = self.items.len().saturating_sub(1),
            View::Reader => self.reader_scroll = self.reader_max_scroll(),
            View::Help => {}
        }
    }

    /// Last scroll offset that still shows a line of the selected item: the
    /// header (title, blank line, date, optional link, separator) followed by
    /// the content lines.
    pub fn reader_max_scroll(&self) -> u16 {
        let Some(item) = self.selected_item() else {
            return 0;
        };
        let header = if item.link.is_some() { 5 } else { 4 };
        let total = header + item.content.lines().count();
        u16::try_from(total.saturating_sub(1)).unwrap_or(u16::MAX)
    }

    /// Open the selected item in the reader. Returns its id so the caller
    /// can mark it read.
    pub fn open_selected(&mut self) -> Option<String> {
        if self.view != View::List {
            return None;
        }
        let id = self.selected_item()?.id.clone();
        self.view = View::Reader;
        self.reader_scroll = 0;
        Some(id)
    }

    pub fn toggle_help(&mut self) {
        if self.view == View::Help {
            self.view = self.previous_view;
        } else {
            self.previous_view = self.view;
            self.view = View::Help;
        }
    }

    /// Leave the current view; quitting from the list.
    pub fn back(&mut self) {
        match self.view {
            View::List => self.should_quit = true,
            View::Reader => self.view = View::List,
            View::Help => self.view = self.previous_view,
        }
    }

    pub fn set_status(&mut self, message: String) {
        self.status_message = Some(message);
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }
}
