//! Built-in commands and key actions.

use super::commands::{Command, CommandRegistry};
use super::core::{Core, INFO_ERROR, INFO_HELP, INFO_INFO};
use super::key_router::{ActionTable, ESCAPE_NEXT_KEY, GO_TO_ROOM_NUMBER};
use super::tab_list::Direction;
use super::timed_events::MAX_DELAY;
use crate::model::error::CommandError;
use crate::model::key::RESIZE_KEY;
use crate::tabs::{ConversationKind, Scroll};
use tracing::debug;

/// Options `/set` can change at runtime.
pub const SETTABLE_OPTIONS: &[&str] = &["create_gaps", "show_timestamps", "popup_time"];

/// Register every built-in command.
pub fn register_commands(registry: &mut CommandRegistry<Core>) {
    registry.register(
        Command::new("help", command_help)
            .usage("[command]")
            .short_help("Show the help")
            .help("Without argument, list every command. With a command name, show its usage and help.")
            .completion(complete_help),
    );
    registry.register(
        Command::new("win", command_win)
            .usage("<number or name>")
            .short_help("Go to the specified tab")
            .help("Go to the tab with that number, or to the first tab whose name contains the given text.")
            .completion(complete_tab_names),
    );
    registry.register(
        Command::new("next", command_next)
            .short_help("Go to the next tab"),
    );
    registry.register(
        Command::new("prev", command_prev)
            .short_help("Go to the previous tab"),
    );
    registry.register(
        Command::new("move_tab", command_move_tab)
            .usage("<source> <destination>")
            .short_help("Move a tab")
            .help("Insert the <source> tab at the position of <destination>. Tabs are given by number or exact name; \".\" is the current tab.")
            .completion(complete_tab_names),
    );
    registry.register(
        Command::new("close", command_close)
            .usage("[number]")
            .short_help("Close a tab")
            .help("Close the current tab, or the tab with the given number. The first tab cannot be closed."),
    );
    registry.register(
        Command::new("quit", command_quit)
            .short_help("Quit"),
    );
    registry.register(
        Command::new("exit", command_quit)
            .short_help("Quit"),
    );
    registry.register(
        Command::new("runkey", command_runkey)
            .usage("<key>")
            .short_help("Run the action bound to a key")
            .help("Handle <key> as if it was typed, for example /runkey ^N or /runkey _show_roster."),
    );
    registry.register(
        Command::new("bind", command_bind)
            .usage("<key> [target]")
            .short_help("Bind a key to another key or action")
            .help("Make <key> behave as [target], a key name, an action name or _exc_<command>. Without a target, the binding is removed."),
    );
    registry.register(
        Command::new("set", command_set)
            .usage("<option> <value>")
            .short_help("Change an option")
            .help("Change one of: create_gaps, show_timestamps, popup_time.")
            .completion(complete_set),
    );
    registry.register(
        Command::new("message", command_message)
            .usage("<conversation> [text]")
            .short_help("Open a conversation")
            .help("Open a one-to-one conversation with <conversation>, focus it, and send [text] if given."),
    );
    registry.register(
        Command::new("correct", command_correct)
            .usage("<text>")
            .short_help("Correct your last message")
            .help("Replace the last message you sent in this conversation by <text>."),
    );
    registry.register(
        Command::new("clear", command_clear)
            .short_help("Clear the input history")
            .help("Forget the lines typed in this tab's input."),
    );
    // the alias cannot clash on a fresh registry
    let _ = registry.alias("w", "win");
}

/// Actions and their default keys.
pub fn register_actions(table: &mut ActionTable<Core>) {
    let actions: &[(&str, fn(&mut Core), &[&str])] = &[
        ("_scroll_up", scroll_page_up, &["KEY_PPAGE"]),
        ("_scroll_down", scroll_page_down, &["KEY_NPAGE"]),
        ("_scroll_line_up", scroll_line_up, &["^B"]),
        ("_scroll_line_down", scroll_line_down, &["^F"]),
        ("_scroll_half_up", scroll_half_up, &["^S"]),
        ("_scroll_half_down", scroll_half_down, &["^X"]),
        ("_room_left", rotate_left, &["KEY_F(5)", "^P"]),
        ("_room_right", rotate_right, &["KEY_F(6)", "^N"]),
        ("_show_important_room", go_to_important_room, &["M-e"]),
        ("_show_roster", go_to_roster, &["M-r"]),
        ("_go_to_previous_tab", go_to_previous_tab, &["M-z"]),
        ("_redraw_screen", full_screen_redraw, &["^L"]),
        ("_scroll_info_up", scroll_info_up, &["M-D"]),
        ("_scroll_info_down", scroll_info_down, &["M-C"]),
        ("_resize", call_for_resize, &[RESIZE_KEY]),
        ("_close_tab", close_tab, &[]),
        ("_quit", quit, &[]),
        (GO_TO_ROOM_NUMBER, noop, &["M-j"]),
        (ESCAPE_NEXT_KEY, noop, &["M-k"]),
    ];
    for (name, handler, keys) in actions {
        table.define(*name, *handler);
        for key in *keys {
            table.bind_key(*key, name);
        }
    }
}

// --- commands ---

fn command_help(core: &mut Core, args: &str) -> Result<(), CommandError> {
    let name = args.trim().trim_start_matches('/');
    let text = if name.is_empty() {
        core.commands().help_summary()
    } else {
        core.commands().help_for(name)?
    };
    core.information(&text, INFO_HELP);
    Ok(())
}

fn complete_help(core: &Core, args: &str) -> Vec<String> {
    core.commands().complete_name(args.trim())
}

/// Index of the tab `arg` designates: a number, `.`, or a name.
fn find_tab(core: &Core, arg: &str, exact: bool) -> Result<usize, CommandError> {
    let tabs = core.tabs();
    if arg == "." {
        return Ok(tabs.current_index());
    }
    if let Ok(number) = arg.parse::<usize>() {
        return match tabs.get(number) {
            Some(tab) if !tab.is_placeholder() => Ok(number),
            _ => Err(CommandError::NoSuchTab(arg.to_string())),
        };
    }
    let found = if exact {
        tabs.find_by_name(arg)
    } else {
        tabs.find_matching(arg)
    };
    found.ok_or_else(|| CommandError::NoSuchTab(arg.to_string()))
}

fn command_win(core: &mut Core, args: &str) -> Result<(), CommandError> {
    let arg = args.trim();
    if arg.is_empty() {
        return Err(usage_error(core, "win"));
    }
    let index = find_tab(core, arg, false)?;
    core.tabs_mut().focus(index)?;
    Ok(())
}

fn complete_tab_names(core: &Core, args: &str) -> Vec<String> {
    let word = args.rsplit(' ').next().unwrap_or("").to_lowercase();
    core.tabs()
        .iter()
        .filter(|t| !t.is_placeholder())
        .map(|t| t.name().to_string())
        .filter(|name| name.to_lowercase().starts_with(&word))
        .collect()
}

fn command_next(core: &mut Core, _args: &str) -> Result<(), CommandError> {
    core.tabs_mut().rotate(Direction::Next);
    Ok(())
}

fn command_prev(core: &mut Core, _args: &str) -> Result<(), CommandError> {
    core.tabs_mut().rotate(Direction::Previous);
    Ok(())
}

fn command_move_tab(core: &mut Core, args: &str) -> Result<(), CommandError> {
    let mut parts = args.split_whitespace();
    let (Some(source), Some(destination), None) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(usage_error(core, "move_tab"));
    };
    let old = find_tab(core, source, true)?;
    let new = match destination.parse::<usize>() {
        // a destination may be a gap or past the end of gaps
        Ok(number) => number,
        Err(_) => find_tab(core, destination, true)?,
    };
    core.tabs_mut().insert_at(old, new)?;
    Ok(())
}

fn command_close(core: &mut Core, args: &str) -> Result<(), CommandError> {
    let arg = args.trim();
    let index = if arg.is_empty() {
        core.tabs().current_index()
    } else {
        find_tab(core, arg, true)?
    };
    core.tabs_mut().close(index)?;
    Ok(())
}

fn command_quit(core: &mut Core, _args: &str) -> Result<(), CommandError> {
    core.quit();
    Ok(())
}

fn command_runkey(core: &mut Core, args: &str) -> Result<(), CommandError> {
    let key = args.trim();
    if key.is_empty() {
        return Err(usage_error(core, "runkey"));
    }
    core.feed_keys(&[key]);
    Ok(())
}

fn command_bind(core: &mut Core, args: &str) -> Result<(), CommandError> {
    let mut parts = args.split_whitespace();
    let Some(key) = parts.next() else {
        return Err(usage_error(core, "bind"));
    };
    match parts.next() {
        Some(target) => {
            core.router_mut().set_alias(key, target);
            core.information(&format!("{key} is now bound to {target}"), INFO_INFO);
        }
        None => {
            if core.router_mut().remove_alias(key) {
                core.information(&format!("{key} is now unbound"), INFO_INFO);
            } else {
                core.information(&format!("{key} was not bound"), INFO_INFO);
            }
        }
    }
    Ok(())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "on" | "yes" => Some(true),
        "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

fn command_set(core: &mut Core, args: &str) -> Result<(), CommandError> {
    let mut parts = args.split_whitespace();
    let (Some(option), Some(value)) = (parts.next(), parts.next()) else {
        return Err(usage_error(core, "set"));
    };
    let invalid = || CommandError::Failed(format!("Invalid value for {option}: {value}"));
    match option {
        "create_gaps" => {
            let gaps = parse_bool(value).ok_or_else(invalid)?;
            core.set_create_gaps(gaps);
        }
        "show_timestamps" => {
            let show = parse_bool(value).ok_or_else(invalid)?;
            core.set_show_timestamps(show);
        }
        "popup_time" => {
            let seconds = value
                .parse()
                .ok()
                .filter(|&s| s <= MAX_DELAY.as_secs())
                .ok_or_else(invalid)?;
            core.set_popup_time(seconds);
        }
        _ => return Err(CommandError::Failed(format!("Unknown option: {option}"))),
    }
    debug!(option, value, "Option changed");
    core.information(&format!("{option}={value}"), INFO_INFO);
    Ok(())
}

fn complete_set(_core: &Core, args: &str) -> Vec<String> {
    let words: Vec<&str> = args.split(' ').collect();
    match words.as_slice() {
        [option] => SETTABLE_OPTIONS
            .iter()
            .filter(|o| o.starts_with(option))
            .map(|o| o.to_string())
            .collect(),
        [option, value] if *option != "popup_time" => ["true", "false"]
            .iter()
            .filter(|v| v.starts_with(value))
            .map(|v| v.to_string())
            .collect(),
        _ => Vec::new(),
    }
}

fn command_message(core: &mut Core, args: &str) -> Result<(), CommandError> {
    let (name, text) = match args.trim().split_once(' ') {
        Some((name, text)) => (name, text.trim()),
        None => (args.trim(), ""),
    };
    if name.is_empty() {
        return Err(usage_error(core, "message"));
    }
    core.open_conversation(name, ConversationKind::Direct, true);
    if !text.is_empty() {
        core.send_message(text)?;
    }
    Ok(())
}

fn command_correct(core: &mut Core, args: &str) -> Result<(), CommandError> {
    if args.trim().is_empty() {
        return Err(usage_error(core, "correct"));
    }
    core.correct_last_message(args)
}

fn command_clear(core: &mut Core, _args: &str) -> Result<(), CommandError> {
    let Some(input) = core.tabs_mut().current_mut().input_mut() else {
        return Err(CommandError::Failed("This tab has no input".to_string()));
    };
    input.clear_history();
    Ok(())
}

fn usage_error(core: &Core, name: &str) -> CommandError {
    match core.commands().resolve(name) {
        Some(command) => command.usage_error(),
        None => CommandError::Unknown(name.to_string()),
    }
}

// --- actions ---

fn scroll(core: &mut Core, amount: Scroll) {
    let (tabs, info) = core.tabs_and_info_mut();
    tabs.current_mut().scroll(info, amount);
}

fn scroll_page_up(core: &mut Core) {
    scroll(core, Scroll::PageUp);
}

fn scroll_page_down(core: &mut Core) {
    scroll(core, Scroll::PageDown);
}

fn scroll_line_up(core: &mut Core) {
    scroll(core, Scroll::LineUp);
}

fn scroll_line_down(core: &mut Core) {
    scroll(core, Scroll::LineDown);
}

fn scroll_half_up(core: &mut Core) {
    scroll(core, Scroll::HalfUp);
}

fn scroll_half_down(core: &mut Core) {
    scroll(core, Scroll::HalfDown);
}

fn scroll_info_up(core: &mut Core) {
    if let Some(window) = core.info_mut().strip_window_mut() {
        window.apply_scroll(Scroll::LineUp);
    }
}

fn scroll_info_down(core: &mut Core) {
    if let Some(window) = core.info_mut().strip_window_mut() {
        window.apply_scroll(Scroll::LineDown);
    }
}

fn rotate_left(core: &mut Core) {
    core.tabs_mut().rotate(Direction::Previous);
}

fn rotate_right(core: &mut Core) {
    core.tabs_mut().rotate(Direction::Next);
}

fn go_to_important_room(core: &mut Core) {
    if let Some(index) = core.tabs().important_tab() {
        // important_tab never returns a gap
        let _ = core.tabs_mut().focus(index);
    }
}

fn go_to_roster(core: &mut Core) {
    let _ = core.tabs_mut().focus(0);
}

fn go_to_previous_tab(core: &mut Core) {
    if let Err(err) = core.tabs_mut().focus_previous() {
        core.report(&err.into());
    }
}

fn full_screen_redraw(core: &mut Core) {
    core.request_full_redraw();
}

fn call_for_resize(core: &mut Core) {
    let (width, height) = core.screen_size();
    core.resize(width, height);
    core.request_full_redraw();
}

fn close_tab(core: &mut Core) {
    let index = core.tabs().current_index();
    if let Err(err) = core.tabs_mut().close(index) {
        core.information(&format!("Unable to close the tab: {err}"), INFO_ERROR);
    }
}

fn quit(core: &mut Core) {
    core.quit();
}

/// Handled by the router itself; defined so keys can be bound to it.
fn noop(_core: &mut Core) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_keys_resolve_to_actions() {
        let mut table = ActionTable::new();
        register_actions(&mut table);
        assert_eq!(table.resolve("^N"), Some("_room_right"));
        assert_eq!(table.resolve("KEY_F(5)"), Some("_room_left"));
        assert_eq!(table.resolve("M-j"), Some(GO_TO_ROOM_NUMBER));
        assert_eq!(table.resolve(RESIZE_KEY), Some("_resize"));
        assert_eq!(table.resolve("_quit"), Some("_quit"));
        assert_eq!(table.resolve("a"), None);
    }

    #[test]
    fn win_has_alias_w() {
        let mut registry = CommandRegistry::new();
        register_commands(&mut registry);
        assert_eq!(registry.alias_of("win"), Some("w"));
        assert!(registry.contains("w"));
    }

    #[test]
    fn bool_values_accept_common_spellings() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
