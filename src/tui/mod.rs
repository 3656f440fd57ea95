pub mod app;
pub mod event;
pub mod layout;

use std::collections::HashSet;
use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::app::{AppContext, Result};
use crate::domain::NewsItem;
use crate::store::ReadStore;

use self::app::TuiApp;
use self::event::{Action, AppEvent, EventHandler};

type Tui = Terminal<CrosstermBackend<Stdout>>;

pub async fn run(ctx: &AppContext) -> Result<()> {
    let items = ctx.collect_items(false).await;

    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, ctx, items).await;
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn read_ids(items: &[NewsItem], store: &dyn ReadStore) -> HashSet<String> {
    items
        .iter()
        .filter(|item| store.is_read(&item.id))
        .map(|item| item.id.clone())
        .collect()
}

async fn run_app(terminal: &mut Tui, ctx: &AppContext, items: Vec<NewsItem>) -> Result<()> {
    let store = ctx.store.as_ref();
    let read = read_ids(&items, store);
    let mut tui_app = TuiApp::new(items, read);
    let event_handler = EventHandler::new(Duration::from_millis(100));

    loop {
        terminal.draw(|frame| layout::render(frame, &tui_app))?;

        if let AppEvent::Key(key) = event_handler.next()? {
            tui_app.clear_status();

            match Action::from(key) {
                Action::Quit => tui_app.should_quit = true,
                Action::Back => tui_app.back(),
                Action::MoveUp => tui_app.move_up(),
                Action::MoveDown => tui_app.move_down(),
                Action::Top => tui_app.go_top(),
                Action::Bottom => tui_app.go_bottom(),
                Action::Help => tui_app.toggle_help(),
                Action::Select => {
                    if let Some(item_id) = tui_app.open_selected() {
                        if !tui_app.is_item_read(&item_id) {
                            set_read(&mut tui_app, store, &item_id, true);
                        }
                    }
                }
                Action::ToggleRead => {
                    if let Some(item) = tui_app.selected_item() {
                        let item_id = item.id.clone();
                        let is_read = tui_app.is_item_read(&item_id);
                        set_read(&mut tui_app, store, &item_id, !is_read);
                    }
                }
                Action::OpenInBrowser => {
                    if let Some(link) = tui_app.selected_item().and_then(|i| i.link.clone()) {
                        if let Err(e) = open::that(&link) {
                            tui_app.set_status(format!("Failed to open browser: {}", e));
                        }
                    }
                }
                Action::Refresh => {
                    tui_app.is_refreshing = true;
                    terminal.draw(|frame| layout::render(frame, &tui_app))?;

                    let items = ctx.collect_items(false).await;
                    let read = read_ids(&items, store);
                    let count = items.len();
                    tui_app.replace_items(items, read);

                    tui_app.is_refreshing = false;
                    tui_app.set_status(format!("Refreshed: {} items", count));
                }
                Action::None => {}
            }
        }

        if tui_app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Persist a read mark and mirror the store in the view. A failed save is
/// reported in the status bar; the in-memory mark still applies.
fn set_read(tui_app: &mut TuiApp, store: &dyn ReadStore, item_id: &str, read: bool) {
    let result = if read {
        store.mark_as_read(item_id)
    } else {
        store.mark_as_unread(item_id)
    };

    if let Err(e) = result {
        tui_app.set_status(format!("Failed to save read status: {}", e));
    }
    tui_app.set_read(item_id, store.is_read(item_id));
}
