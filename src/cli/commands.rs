use std::io::{self, BufRead, IsTerminal, Write};
use std::process::{Command, Stdio};
use std::time::Duration;

use crate::app::{AppContext, InformantError, Result};
use crate::domain::NewsItem;
use crate::store::ReadStore;

/// Bodies longer than this many lines are offered to the pager.
const PAGER_THRESHOLD: usize = 20;

pub async fn list(ctx: &AppContext, unread_only: bool, reverse: bool) -> Result<()> {
    let items = ctx.collect_items(true).await;
    let lines = list_lines(&items, ctx.store.as_ref(), unread_only, reverse);

    if lines.is_empty() {
        if unread_only && !items.is_empty() {
            println!("No unread news items.");
        } else {
            println!("No news items found.");
        }
        return Ok(());
    }

    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

/// Numbered listing lines. Numbers are positions in the full newest-first
/// list so they stay valid for `read <N>` under any filter or ordering.
pub fn list_lines(
    items: &[NewsItem],
    store: &dyn ReadStore,
    unread_only: bool,
    reverse: bool,
) -> Vec<String> {
    let mut lines: Vec<String> = items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| {
            let read = store.is_read(&item.id);
            if unread_only && read {
                return None;
            }
            Some(format_list_line(i + 1, item, read))
        })
        .collect();

    if reverse {
        lines.reverse();
    }
    lines
}

pub fn format_list_line(index: usize, item: &NewsItem, read: bool) -> String {
    format!(
        "{}. {} {} ({}) [{}]",
        index,
        item.date_label(),
        item.display_title(),
        item.feed_name,
        if read { "READ" } else { "UNREAD" }
    )
}

/// Look up an item by 1-based index, or else by case-insensitive title
/// substring.
pub fn find_item<'a>(items: &'a [NewsItem], selector: &str) -> Result<&'a NewsItem> {
    let selector = selector.trim();

    if let Ok(index) = selector.parse::<usize>() {
        return index
            .checked_sub(1)
            .and_then(|i| items.get(i))
            .ok_or_else(|| InformantError::ItemNotFound(format!("no item number {}", index)));
    }

    items
        .iter()
        .find(|item| item.title_matches(selector))
        .ok_or_else(|| InformantError::ItemNotFound(format!("no item matching \"{}\"", selector)))
}

pub async fn read(ctx: &AppContext, selector: Option<&str>, all: bool) -> Result<()> {
    let items = ctx.collect_items(true).await;
    let store = ctx.store.as_ref();

    if all {
        let marked = mark_all_read(&items, store)?;
        println!("Marked {} items as read.", marked);
        return Ok(());
    }

    if let Some(selector) = selector {
        let item = find_item(&items, selector)?;
        display_item(item)?;
        store.mark_as_read(&item.id)?;
        return Ok(());
    }

    let unread: Vec<&NewsItem> = items.iter().filter(|i| !store.is_read(&i.id)).collect();
    if unread.is_empty() {
        println!("No unread news items.");
        return Ok(());
    }

    let total = unread.len();
    for (n, item) in unread.into_iter().enumerate() {
        println!(
            "[{}/{}] {} {} ({})",
            n + 1,
            total,
            item.date_label(),
            item.display_title(),
            item.feed_name
        );
        if !ask_yes_default("Read this item?") {
            continue;
        }
        display_item(item)?;
        store.mark_as_read(&item.id)?;
    }

    Ok(())
}

/// Mark every unread item as read, returning how many were marked.
pub fn mark_all_read(items: &[NewsItem], store: &dyn ReadStore) -> Result<usize> {
    let mut marked = 0;
    for item in items.iter().filter(|i| !store.is_read(&i.id)) {
        store.mark_as_read(&item.id)?;
        marked += 1;
    }
    Ok(marked)
}

/// Non-interactive check run from the pacman hook. Returns the number of
/// unread items as a process exit code.
pub async fn check(ctx: &AppContext) -> Result<u8> {
    let items = ctx.collect_items(false).await;
    let store = ctx.store.as_ref();
    let unread: Vec<&NewsItem> = items.iter().filter(|i| !store.is_read(&i.id)).collect();

    match unread.as_slice() {
        [] => {}
        [only] => {
            print_item(only);
            store.mark_as_read(&only.id)?;
        }
        many => {
            println!("There are {} unread news items:", many.len());
            for item in many {
                println!("  {} {}", item.date_label(), item.display_title());
            }
            println!("Run `informant read` to read them.");
        }
    }

    Ok(exit_code(unread.len()))
}

pub fn exit_code(unread: usize) -> u8 {
    u8::try_from(unread).unwrap_or(u8::MAX)
}

pub fn cleanup(ctx: &AppContext, older_than: Duration) -> Result<()> {
    let removed = ctx.store.cleanup(older_than)?;
    println!(
        "Removed {} read marks older than {}.",
        removed,
        format_duration(older_than)
    );
    Ok(())
}

/// Parse an age such as "90d", "12h", "30m", "45s", or a bare number of seconds.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim().to_lowercase();

    let secs = if let Some(days) = s.strip_suffix('d') {
        days.parse::<u64>()
            .map(|d| d * 86400)
            .map_err(|_| format!("Invalid days: {}", days))
    } else if let Some(hours) = s.strip_suffix('h') {
        hours
            .parse::<u64>()
            .map(|h| h * 3600)
            .map_err(|_| format!("Invalid hours: {}", hours))
    } else if let Some(minutes) = s.strip_suffix('m') {
        minutes
            .parse::<u64>()
            .map(|m| m * 60)
            .map_err(|_| format!("Invalid minutes: {}", minutes))
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>()
            .map_err(|_| format!("Invalid seconds: {}", secs))
    } else {
        s.parse::<u64>()
            .map_err(|_| format!("Invalid duration: {}. Use a format like '90d', '12h', '30m'", s))
    }?;

    Ok(Duration::from_secs(secs))
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 86400 && secs.is_multiple_of(86400) {
        format!("{}d", secs / 86400)
    } else if secs >= 3600 && secs.is_multiple_of(3600) {
        format!("{}h", secs / 3600)
    } else if secs >= 60 && secs.is_multiple_of(60) {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}

fn print_item(item: &NewsItem) {
    println!("{}", render_item(item));
}

/// Header, link and body as shown by `read` and `check`.
pub fn render_item(item: &NewsItem) -> String {
    let mut out = format!(
        "{}\n{} | {}\n",
        item.display_title(),
        item.date_label(),
        item.feed_name
    );
    if let Some(link) = &item.link {
        out.push_str(link);
        out.push('\n');
    }
    out.push('\n');
    out.push_str(&item.content);
    out
}

fn display_item(item: &NewsItem) -> Result<()> {
    let text = render_item(item);

    if text.lines().count() > PAGER_THRESHOLD
        && io::stdout().is_terminal()
        && ask_yes_default("This item is long. Open it in the pager?")
    {
        return page(&text);
    }

    println!("{}\n", text);
    Ok(())
}

fn page(text: &str) -> Result<()> {
    let pager = std::env::var("PAGER")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| "less".to_string());
    let mut parts = pager.split_whitespace();
    let program = parts.next().unwrap_or("less");

    let mut child = Command::new(program)
        .args(parts)
        .stdin(Stdio::piped())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        // The pager may exit before reading everything
        if let Err(e) = stdin.write_all(text.as_bytes()) {
            if e.kind() != io::ErrorKind::BrokenPipe {
                return Err(e.into());
            }
        }
    }

    child.wait()?;
    Ok(())
}

fn ask_yes_default(question: &str) -> bool {
    print!("{} [Y/n]: ", question);
    let _ = io::stdout().flush();

    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(0) | Err(_) => false,
        Ok(_) => is_yes_default(&answer),
    }
}

/// An empty answer means yes.
fn is_yes_default(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "" | "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::item::sample_item;
    use crate::store::StatusStore;
    use tempfile::TempDir;

    fn items() -> Vec<NewsItem> {
        vec![
            sample_item("c", "Glibc 2.40 update", "2024-07-03T00:00:00Z"),
            sample_item("b", "OpenSSH manual intervention", "2024-07-02T00:00:00Z"),
            sample_item("a", "Old news", "2024-07-01T00:00:00Z"),
        ]
    }

    fn store_in(dir: &TempDir) -> StatusStore {
        StatusStore::with_path(dir.path().join("status.json"), false).unwrap()
    }

    #[test]
    fn test_format_list_line() {
        let item = sample_item("a", "Glibc 2.40 update", "2024-07-03T08:00:00Z");
        assert_eq!(
            format_list_line(1, &item, false),
            "1. 2024-07-03 Glibc 2.40 update (Arch Linux News) [UNREAD]"
        );
        assert!(format_list_line(2, &item, true).ends_with("[READ]"));
    }

    #[test]
    fn test_list_lines_keep_numbers_when_filtered() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.mark_as_read("b").unwrap();

        let lines = list_lines(&items(), &store, true, false);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("1. "));
        assert!(lines[1].starts_with("3. "));
    }

    #[test]
    fn test_list_lines_reverse() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let lines = list_lines(&items(), &store, false, true);
        assert!(lines[0].starts_with("3. "));
        assert!(lines[2].starts_with("1. "));
    }

    #[test]
    fn test_find_item_by_index() {
        let items = items();
        assert_eq!(find_item(&items, "2").unwrap().id, "b");
        assert!(matches!(
            find_item(&items, "0"),
            Err(InformantError::ItemNotFound(_))
        ));
        assert!(matches!(
            find_item(&items, "4"),
            Err(InformantError::ItemNotFound(_))
        ));
    }

    #[test]
    fn test_find_item_by_title() {
        let items = items();
        assert_eq!(find_item(&items, "openssh").unwrap().id, "b");
        assert!(matches!(
            find_item(&items, "kernel"),
            Err(InformantError::ItemNotFound(_))
        ));
    }

    #[test]
    fn test_mark_all_read() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.mark_as_read("a").unwrap();

        assert_eq!(mark_all_read(&items(), &store).unwrap(), 2);
        assert_eq!(store.read_count(), 3);
        assert_eq!(mark_all_read(&items(), &store).unwrap(), 0);
    }

    #[test]
    fn test_exit_code_clamped() {
        assert_eq!(exit_code(0), 0);
        assert_eq!(exit_code(3), 3);
        assert_eq!(exit_code(255), 255);
        assert_eq!(exit_code(300), 255);
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("90d").unwrap(), Duration::from_secs(90 * 86400));
        assert_eq!(parse_duration("12h").unwrap(), Duration::from_secs(43200));
        assert_eq!(parse_duration("30m").unwrap(), Duration::from_secs(1800));
        assert_eq!(parse_duration("45s").unwrap(), Duration::from_secs(45));
        assert_eq!(parse_duration("3600").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration(" 7D ").unwrap(), Duration::from_secs(7 * 86400));
        assert!(parse_duration("soon").is_err());
        assert!(parse_duration("d").is_err());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(90 * 86400)), "90d");
        assert_eq!(format_duration(Duration::from_secs(7200)), "2h");
        assert_eq!(format_duration(Duration::from_secs(1800)), "30m");
        assert_eq!(format_duration(Duration::from_secs(90)), "90s");
    }

    #[test]
    fn test_render_item() {
        let item = sample_item("a", "Glibc 2.40 update", "2024-07-03T00:00:00Z");
        let text = render_item(&item);
        assert!(text.starts_with("Glibc 2.40 update\n2024-07-03 | Arch Linux News\n"));
        assert!(text.contains("https://archlinux.org/news/a/"));
        assert!(text.ends_with("Body of Glibc 2.40 update"));
    }

    #[test]
    fn test_yes_default_answers() {
        assert!(is_yes_default("\n"));
        assert!(is_yes_default("Y\n"));
        assert!(is_yes_default("yes"));
        assert!(!is_yes_default("n\n"));
        assert!(!is_yes_default("nope"));
    }
}
