//! The client context: every piece of state the event loop drives.
//!
//! Command and action handlers are plain functions over [`Core`], so the
//! registries live inside it. A handler is copied out of its registry before
//! it runs with `&mut Core`.

use super::builtins;
use super::commands::{parse_command_line, CommandRegistry};
use super::info_buffer::InfoBuffer;
use super::input_line::{InputLine, InputOutcome};
use super::key_router::{ActionTable, Dispatch, KeyRouter};
use super::tab_list::TabSlotList;
use super::timed_events::{fire_expired, TimedEventId, TimedEventQueue};
use crate::config::ResolvedConfig;
use crate::model::error::CommandError;
use crate::model::key::KeyToken;
use crate::model::message::{CorrelationId, NewMessage};
use crate::session::{InboundMessage, Session, SessionEvent};
use crate::tabs::{ConversationKind, ConversationTab, FocusState, RosterInfoTab, Tab};
use crate::view::layout::ScreenLayout;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Information kind for failures.
pub const INFO_ERROR: &str = "Error";
/// Information kind for ordinary notices.
pub const INFO_INFO: &str = "Info";
/// Information kind for help output.
pub const INFO_HELP: &str = "Help";
/// Information kind for non-fatal problems.
pub const INFO_WARNING: &str = "Warning";

/// Where the event loop is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Keys are routed through the bindings.
    Running,
    /// Keys go verbatim to a prompt, bindings are not consulted.
    Paused,
    /// The loop exits.
    Stopped,
}

/// Modal prompt capturing text for code waiting on the user.
#[derive(Debug)]
pub struct PausedPrompt {
    prompt: String,
    input: InputLine,
    reply: Sender<String>,
}

impl PausedPrompt {
    /// Text shown before the answer.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Answer typed so far.
    pub fn input(&self) -> &InputLine {
        &self.input
    }
}

/// Everything the client knows, threaded through every handler.
pub struct Core {
    tabs: TabSlotList,
    info: InfoBuffer,
    commands: CommandRegistry<Core>,
    actions: ActionTable<Core>,
    router: KeyRouter,
    timed: TimedEventQueue<Core>,
    session: Box<dyn Session>,
    events: Receiver<SessionEvent>,
    config: ResolvedConfig,
    state: LoopState,
    paused: Option<PausedPrompt>,
    popup_event: Option<TimedEventId>,
    screen: (u16, u16),
    full_redraw: bool,
}

impl std::fmt::Debug for Core {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Core")
            .field("tabs", &self.tabs)
            .field("state", &self.state)
            .field("timed", &self.timed)
            .field("screen", &self.screen)
            .finish_non_exhaustive()
    }
}

impl Core {
    /// Build a context with the roster tab, built-in commands and actions,
    /// and the configured key aliases.
    pub fn new(
        config: ResolvedConfig,
        session: Box<dyn Session>,
        events: Receiver<SessionEvent>,
    ) -> Self {
        let mut info = InfoBuffer::new(config.max_messages_in_memory, config.info_win_height);
        info.set_show_timestamps(config.show_timestamps);

        let mut commands = CommandRegistry::new();
        builtins::register_commands(&mut commands);
        let mut actions = ActionTable::new();
        builtins::register_actions(&mut actions);

        let mut router = KeyRouter::new();
        config.bindings.apply_to(&mut router);

        Self {
            tabs: TabSlotList::new(Box::new(RosterInfoTab::new()), config.create_gaps),
            info,
            commands,
            actions,
            router,
            timed: TimedEventQueue::new(),
            session,
            events,
            config,
            state: LoopState::Running,
            paused: None,
            popup_event: None,
            screen: (0, 0),
            full_redraw: false,
        }
    }

    /// The tab list.
    pub fn tabs(&self) -> &TabSlotList {
        &self.tabs
    }

    /// The tab list, mutably.
    pub fn tabs_mut(&mut self) -> &mut TabSlotList {
        &mut self.tabs
    }

    /// The information buffer.
    pub fn info(&self) -> &InfoBuffer {
        &self.info
    }

    /// The information buffer, mutably.
    pub fn info_mut(&mut self) -> &mut InfoBuffer {
        &mut self.info
    }

    /// Both halves a tab needs to scroll the information view.
    pub fn tabs_and_info_mut(&mut self) -> (&mut TabSlotList, &mut InfoBuffer) {
        (&mut self.tabs, &mut self.info)
    }

    /// Registered commands.
    pub fn commands(&self) -> &CommandRegistry<Core> {
        &self.commands
    }

    /// Registered commands, mutably.
    pub fn commands_mut(&mut self) -> &mut CommandRegistry<Core> {
        &mut self.commands
    }

    /// Named actions and their keys.
    pub fn actions(&self) -> &ActionTable<Core> {
        &self.actions
    }

    /// Named actions and their keys, mutably.
    pub fn actions_mut(&mut self) -> &mut ActionTable<Core> {
        &mut self.actions
    }

    /// Key alias and escape state.
    pub fn router(&self) -> &KeyRouter {
        &self.router
    }

    /// Key alias and escape state, mutably.
    pub fn router_mut(&mut self) -> &mut KeyRouter {
        &mut self.router
    }

    /// Pending timers.
    pub fn timed_events(&self) -> &TimedEventQueue<Core> {
        &self.timed
    }

    /// Pending timers, mutably.
    pub fn timed_events_mut(&mut self) -> &mut TimedEventQueue<Core> {
        &mut self.timed
    }

    /// Settings in effect.
    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Where the loop is.
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Whether the loop should go on.
    pub fn is_running(&self) -> bool {
        self.state != LoopState::Stopped
    }

    /// The prompt capturing input, while paused.
    pub fn paused_prompt(&self) -> Option<&PausedPrompt> {
        self.paused.as_ref()
    }

    /// Last size given to [`Core::resize`].
    pub fn screen_size(&self) -> (u16, u16) {
        self.screen
    }

    /// Switch gap mode; turning it off collapses every gap.
    pub fn set_create_gaps(&mut self, gaps: bool) {
        self.config.create_gaps = gaps;
        self.tabs.set_gap_mode(gaps);
    }

    /// Show or hide times in every view, rebuilding them.
    pub fn set_show_timestamps(&mut self, show: bool) {
        self.config.show_timestamps = show;
        self.info.set_show_timestamps(show);
        let (width, height) = self.screen;
        if width > 0 && height > 0 {
            let roster = ScreenLayout::compute(width, height, self.info.height(), false);
            self.info.resize(width, roster.tab.height);
        }
        for tab in self.tabs.iter_mut() {
            if let Some(conversation) = tab.as_conversation_mut() {
                conversation.set_show_timestamps(show);
            }
        }
    }

    /// Seconds a popped-up information strip stays grown.
    pub fn set_popup_time(&mut self, seconds: u64) {
        self.config.popup_time = seconds;
    }

    /// Record a new terminal size without rewrapping; the resize action
    /// does the rewrap.
    pub fn set_screen_size(&mut self, width: u16, height: u16) {
        self.screen = (width, height);
    }

    /// Stop the event loop after the current batch.
    pub fn quit(&mut self) {
        info!("Quit requested");
        self.state = LoopState::Stopped;
    }

    /// Ask the display to repaint everything on its next draw.
    pub fn request_full_redraw(&mut self) {
        self.full_redraw = true;
    }

    /// Whether a full repaint was requested since the last call.
    pub fn take_full_redraw(&mut self) -> bool {
        std::mem::take(&mut self.full_redraw)
    }

    // --- information buffer ---

    /// Add a line to the information buffer.
    ///
    /// Text matching a configured filter is dropped. Kinds listed in
    /// `information_buffer_popup_on` grow the strip for `popup_time`
    /// seconds.
    pub fn information(&mut self, text: &str, kind: &str) {
        if self.config.is_filtered(text) {
            trace!(kind, "Information filtered out");
            return;
        }
        if kind == INFO_ERROR || kind == INFO_WARNING {
            warn!(kind, "{text}");
        } else {
            info!(kind, "{text}");
        }
        let lines = self.info.add(kind, text);
        if self.config.pops_up_on(kind) {
            self.pop_up_information(lines);
        }
    }

    fn pop_up_information(&mut self, lines: usize) {
        self.info.pop_up(lines);
        if let Some(id) = self.popup_event.take() {
            self.timed.remove(id);
        }
        let delay = Duration::from_secs(self.config.popup_time);
        let id = self
            .timed
            .add_delayed(delay, |core: &mut Core| core.shrink_information());
        self.popup_event = Some(id);
        self.resize_tabs();
    }

    /// Return the information strip to its configured height.
    pub fn shrink_information(&mut self) {
        self.popup_event = None;
        if self.info.is_popped_up() {
            debug!("Information strip shrinks back");
            self.info.shrink();
            self.resize_tabs();
        }
    }

    // --- timed events ---

    /// Fire every timed event due at `now`. Returns how many ran.
    pub fn check_timed_events(&mut self, now: Instant) -> usize {
        let fired = fire_expired(self, timed_queue, now);
        if fired > 0 {
            debug!(fired, pending = self.timed.len(), "Timed events fired");
        }
        fired
    }

    // --- session events ---

    /// Handle every session event queued so far. Returns how many.
    pub fn drain_session_events(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events.try_recv() {
            self.handle_session_event(event);
            handled += 1;
        }
        handled
    }

    /// Apply one event from the session.
    pub fn handle_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Message(message) => self.on_message(message),
            SessionEvent::Presence {
                conversation,
                nickname,
                status,
            } => {
                self.information(&format!("{nickname} is {status} in {conversation}"), INFO_INFO);
            }
            SessionEvent::Connected => self.information("Connected", INFO_INFO),
            SessionEvent::Disconnected(reason) => {
                self.information(&format!("Disconnected: {reason}"), INFO_ERROR);
            }
        }
    }

    fn on_message(&mut self, message: InboundMessage) {
        let kind = if message.direct {
            ConversationKind::Direct
        } else {
            ConversationKind::Room
        };
        let index = self.open_conversation(&message.conversation, kind, false);
        let highlighted = self.is_highlight(&message);

        let mut new = NewMessage::new(message.text.clone())
            .highlighted(highlighted)
            .history(message.history);
        if let Some(nick) = &message.nickname {
            new = new.nickname(nick.clone());
        }
        if let Some(identity) = &message.identity {
            new = new.identity(identity.clone());
        }
        if let Some(id) = &message.correlation_id {
            new = new.correlation_id(id.clone());
        }
        if let Some(time) = message.timestamp {
            new = new.timestamp(time);
        }

        let Some(tab) = self
            .tabs
            .get_mut(index)
            .and_then(|t| t.as_conversation_mut())
        else {
            return;
        };

        let failure = match &message.correction_of {
            Some(old_id) => {
                let new_id = message
                    .correlation_id
                    .clone()
                    .unwrap_or_else(|| old_id.clone());
                let result = tab
                    .correct(
                        &message.text,
                        old_id,
                        new_id,
                        message.identity.as_ref(),
                        message.timestamp,
                        highlighted,
                    )
                    .map(|_| ());
                match result {
                    Ok(()) => None,
                    Err(err) => {
                        // keep the text rather than lose it
                        tab.add_message(new);
                        Some(err)
                    }
                }
            }
            None => {
                tab.add_message(new);
                None
            }
        };
        if let Some(err) = failure {
            self.information(&format!("Unable to correct: {err}"), INFO_ERROR);
        }

        let attention = if highlighted {
            FocusState::Highlight
        } else if message.direct {
            FocusState::Private
        } else {
            FocusState::Active
        };
        self.tabs.notify(index, attention);
    }

    fn is_highlight(&self, message: &InboundMessage) -> bool {
        let own = self.config.own_nick.to_lowercase();
        if own.is_empty() || message.history {
            return false;
        }
        if message
            .nickname
            .as_deref()
            .is_some_and(|n| n.to_lowercase() == own)
        {
            return false;
        }
        message.text.to_lowercase().contains(&own)
    }

    /// Index of the conversation tab named `name`, opening one if needed.
    pub fn open_conversation(&mut self, name: &str, kind: ConversationKind, focus: bool) -> usize {
        if let Some(index) = self.tabs.find_by_name(name) {
            if focus {
                // find_by_name never returns a gap
                let _ = self.tabs.focus(index);
            }
            return index;
        }
        let mut tab = ConversationTab::new(name, kind, self.config.max_messages_in_memory);
        tab.set_show_timestamps(self.config.show_timestamps);
        let (width, height) = self.tab_area();
        tab.resize(width, height);
        info!(name, ?kind, "Opening conversation");
        self.tabs.push(Box::new(tab), focus)
    }

    // --- keyboard ---

    /// Process one batch of keys from the input device.
    ///
    /// Keys go through the alias table first. While paused they feed the
    /// prompt; whatever follows the submitted line is routed normally.
    pub fn feed_keys<S: AsRef<str>>(&mut self, batch: &[S]) {
        let keys = self.router.translate(batch);
        let paste = keys.len() != 1;
        let mut rest = keys.as_slice();
        if self.state == LoopState::Paused {
            let used = self.feed_paused(rest);
            rest = &rest[used..];
            if rest.is_empty() || self.state != LoopState::Running {
                return;
            }
        }
        let dispatches = self.router.route_translated(rest, paste, &self.actions);
        for dispatch in dispatches {
            if let Err(err) = self.execute(dispatch) {
                self.report(&err);
            }
            if self.state != LoopState::Running {
                break;
            }
        }
    }

    /// Feed keys to the paused prompt. Returns how many were consumed.
    fn feed_paused(&mut self, keys: &[String]) -> usize {
        let Some(paused) = self.paused.as_mut() else {
            self.state = LoopState::Running;
            return 0;
        };
        let mut submitted = None;
        let mut used = 0;
        for key in keys {
            used += 1;
            let raw = KeyToken::from_name(key).is_plain();
            if let InputOutcome::Submit(text) = paused.input.do_command(key, raw) {
                submitted = Some(text);
                break;
            }
        }
        if let Some(text) = submitted {
            if let Some(paused) = self.paused.take() {
                if paused.reply.send(text).is_err() {
                    debug!("Prompt answer dropped: nobody is waiting");
                }
            }
            self.state = LoopState::Running;
        }
        used
    }

    /// Capture the next line of input into a prompt.
    ///
    /// Bindings are bypassed: every key goes to the prompt line until Enter.
    /// The line is then sent on the returned channel.
    pub fn pause_for_input(&mut self, prompt: &str) -> Receiver<String> {
        let (tx, rx) = bounded(1);
        self.paused = Some(PausedPrompt {
            prompt: prompt.to_string(),
            input: InputLine::new(),
            reply: tx,
        });
        self.state = LoopState::Paused;
        debug!(prompt, "Paused for input");
        rx
    }

    /// Run one routed piece of a key batch.
    pub fn execute(&mut self, dispatch: Dispatch) -> Result<(), CommandError> {
        match dispatch {
            Dispatch::Literal(text) => self.input_key(&text, true),
            Dispatch::Action(name) => self.run_action(&name),
            Dispatch::ExecCommand(line) => self.execute_command(&line),
            Dispatch::TabNumber(number) => self.go_to_tab_number(number),
            Dispatch::Key(key) => self.input_key(&key, false),
        }
    }

    /// Run a named action.
    pub fn run_action(&mut self, name: &str) -> Result<(), CommandError> {
        let handler = self
            .actions
            .handler(name)
            .ok_or_else(|| CommandError::Failed(format!("Unknown action: {name}")))?;
        trace!(name, "Running action");
        handler(self);
        Ok(())
    }

    /// Run `name args`, with or without the leading `/`.
    pub fn execute_command(&mut self, line: &str) -> Result<(), CommandError> {
        let line = line.strip_prefix('/').unwrap_or(line);
        let (name, args) = match line.split_once(' ') {
            Some((name, args)) => (name, args.trim_start()),
            None => (line, ""),
        };
        let handler = self.commands.handler_for(name)?;
        debug!(name, "Running command");
        handler(self, args)
    }

    /// `M-<n>`: jump to tab `n`, or back to the previous tab if `n` is
    /// already focused.
    pub fn go_to_tab_number(&mut self, number: usize) -> Result<(), CommandError> {
        if number == self.tabs.current_index() {
            self.tabs.focus_previous()?;
            return Ok(());
        }
        match self.tabs.get(number) {
            Some(tab) if !tab.is_placeholder() => {
                self.tabs.focus(number)?;
                Ok(())
            }
            _ => Err(CommandError::NoSuchTab(number.to_string())),
        }
    }

    fn input_key(&mut self, key: &str, raw: bool) -> Result<(), CommandError> {
        match self.tabs.current_mut().on_input(key, raw) {
            InputOutcome::Edited => Ok(()),
            InputOutcome::Submit(text) => self.submit(&text),
            InputOutcome::Complete => {
                self.complete_input();
                Ok(())
            }
        }
    }

    /// Handle a line submitted from the focused tab's input.
    pub fn submit(&mut self, text: &str) -> Result<(), CommandError> {
        if text.is_empty() {
            return Ok(());
        }
        if parse_command_line(text).is_some() {
            return self.execute_command(text);
        }
        // "//text" sends "/text"
        let text = text.strip_prefix('/').unwrap_or(text);
        if self.tabs.current().as_conversation().is_none() {
            return Err(CommandError::Failed(
                "This tab has no conversation; type /help for commands".to_string(),
            ));
        }
        self.send_message(text)
    }

    /// Send `text` to the focused conversation and show it.
    pub fn send_message(&mut self, text: &str) -> Result<(), CommandError> {
        let identity = self.session.own_identity();
        let nick = self.config.own_nick.clone();
        let tab = self
            .tabs
            .current_mut()
            .as_conversation_mut()
            .ok_or_else(|| CommandError::Failed("Not a conversation tab".to_string()))?;
        let id = self.session.send(tab.name(), text);

        let mut message = NewMessage::new(text).nickname(nick);
        if let Some(identity) = identity {
            message = message.identity(identity);
        }
        if let Some(id) = id.clone() {
            message = message.correlation_id(id);
        }
        tab.add_message(message);
        if let Some(id) = id {
            tab.record_sent(id);
        }
        Ok(())
    }

    /// Replace our last message in the focused conversation by `text`.
    pub fn correct_last_message(&mut self, text: &str) -> Result<(), CommandError> {
        let identity = self.session.own_identity();
        let tab = self
            .tabs
            .current_mut()
            .as_conversation_mut()
            .ok_or_else(|| CommandError::Failed("Not a conversation tab".to_string()))?;
        let old_id: CorrelationId = tab
            .last_sent()
            .cloned()
            .ok_or_else(|| CommandError::Failed("No message to correct".to_string()))?;
        tab.log().correctable(&old_id, identity.as_ref())?;
        let new_id = self
            .session
            .send_correction(tab.name(), text, &old_id)
            .unwrap_or_else(|| old_id.clone());
        tab.correct(text, &old_id, new_id.clone(), identity.as_ref(), None, false)?;
        tab.record_sent(new_id);
        Ok(())
    }

    fn complete_input(&mut self) {
        let Some(line) = self.tabs.current().input().map(|i| i.text().to_string()) else {
            return;
        };
        let candidates = self.commands.complete(self, &line);
        let Some(input) = self.tabs.current_mut().input_mut() else {
            return;
        };
        let word = input.word_before_cursor().to_string();
        let needle = word.to_lowercase();
        let matching: Vec<&String> = candidates
            .iter()
            .filter(|c| c.to_lowercase().starts_with(&needle))
            .collect();
        match matching.as_slice() {
            [] => {}
            [only] => {
                input.replace_word_before_cursor(only);
                input.insert_text(" ");
            }
            several => {
                let prefix = common_prefix(several);
                if prefix.chars().count() > word.chars().count() {
                    input.replace_word_before_cursor(&prefix);
                }
                let listed = several
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                self.information(&listed, INFO_INFO);
            }
        }
    }

    /// Show a command failure as one information line.
    pub fn report(&mut self, err: &CommandError) {
        self.information(&err.to_string(), INFO_ERROR);
    }

    // --- geometry ---

    /// New terminal size: every view rewraps at the new width.
    pub fn resize(&mut self, width: u16, height: u16) {
        debug!(width, height, "Resizing");
        self.screen = (width, height);
        let roster = ScreenLayout::compute(width, height, self.info.height(), false);
        self.info.resize(width, roster.tab.height);
        self.resize_tabs();
    }

    /// Size of a conversation area with the strip at its current height.
    pub fn tab_area(&self) -> (u16, u16) {
        let (width, height) = self.screen;
        if width == 0 || height == 0 {
            return (
                crate::view::constants::DEFAULT_WINDOW_WIDTH,
                crate::view::constants::DEFAULT_WINDOW_HEIGHT,
            );
        }
        let layout = ScreenLayout::compute(width, height, self.info.height(), true);
        (layout.tab.width, layout.tab.height)
    }

    fn resize_tabs(&mut self) {
        let (width, height) = self.tab_area();
        for tab in self.tabs.iter_mut() {
            tab.resize(width, height);
        }
    }
}

fn timed_queue(core: &mut Core) -> &mut TimedEventQueue<Core> {
    &mut core.timed
}

fn common_prefix(words: &[&String]) -> String {
    let Some(first) = words.first() else {
        return String::new();
    };
    let mut prefix: &str = first;
    for word in &words[1..] {
        let shared = prefix
            .char_indices()
            .zip(word.chars())
            .take_while(|((_, a), b)| a == b)
            .last()
            .map_or(0, |((i, c), _)| i + c.len_utf8());
        prefix = &prefix[..shared];
    }
    prefix.to_string()
}

#[cfg(test)]
#[path = "core_tests.rs"]
mod tests;
