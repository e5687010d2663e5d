//! Tests for the client context.

use super::*;
use crate::model::message::{CorrelationId, NewMessage};
use crate::session::{event_channel, LoopbackSession};
use crate::tabs::TabKind;
use std::time::Duration;

fn config() -> ResolvedConfig {
    ResolvedConfig {
        own_nick: "alice".to_string(),
        ..ResolvedConfig::default()
    }
}

fn core_with(config: ResolvedConfig) -> Core {
    let (tx, rx) = event_channel();
    let session = LoopbackSession::new(tx, &config.own_nick);
    let mut core = Core::new(config, Box::new(session), rx);
    core.resize(80, 24);
    core
}

fn core() -> Core {
    core_with(config())
}

fn inbound(conversation: &str, text: &str) -> SessionEvent {
    SessionEvent::Message(InboundMessage::new(conversation, text).from_nick("bob"))
}

fn conversation<'a>(core: &'a Core, index: usize) -> &'a ConversationTab {
    core.tabs()
        .get(index)
        .and_then(|t| t.as_conversation())
        .expect("conversation tab")
}

fn texts(core: &Core, index: usize) -> Vec<String> {
    conversation(core, index)
        .log()
        .messages()
        .map(|m| m.text().to_string())
        .collect()
}

fn last_info(core: &Core) -> String {
    core.info()
        .log()
        .last_message()
        .map(|m| m.text().to_string())
        .unwrap_or_default()
}

fn keys(core: &mut Core, batch: &[&str]) {
    core.feed_keys(batch);
}

#[test]
fn starts_on_the_roster_tab() {
    let core = core();
    assert_eq!(core.tabs().len(), 1);
    assert_eq!(core.tabs().current().kind(), TabKind::RosterInfo);
    assert_eq!(core.state(), LoopState::Running);
}

#[test]
fn message_for_unknown_conversation_opens_background_tab() {
    let mut core = core();
    core.handle_session_event(inbound("room", "hi"));

    assert_eq!(core.tabs().len(), 2);
    assert_eq!(core.tabs().current_index(), 0);
    assert_eq!(texts(&core, 1), vec!["hi"]);
    assert_eq!(core.tabs().get(1).unwrap().focus_state(), FocusState::Active);
}

#[test]
fn direct_message_marks_tab_private() {
    let mut core = core();
    core.handle_session_event(SessionEvent::Message(
        InboundMessage::new("bob", "psst").from_nick("bob").direct(true),
    ));
    assert_eq!(core.tabs().get(1).unwrap().focus_state(), FocusState::Private);
    assert_eq!(
        conversation(&core, 1).conversation_kind(),
        ConversationKind::Direct
    );
}

#[test]
fn own_nick_highlights_and_never_downgrades() {
    let mut core = core();
    core.handle_session_event(inbound("room", "hey Alice, look"));
    assert_eq!(core.tabs().get(1).unwrap().focus_state(), FocusState::Highlight);
    assert!(conversation(&core, 1).log().last_message().unwrap().is_highlighted());

    core.handle_session_event(inbound("room", "unrelated"));
    assert_eq!(core.tabs().get(1).unwrap().focus_state(), FocusState::Highlight);
}

#[test]
fn inbound_correction_replaces_in_place() {
    let mut core = core();
    core.handle_session_event(SessionEvent::Message(
        InboundMessage::new("room", "helo")
            .from_nick("bob")
            .id(CorrelationId::new("m1")),
    ));
    core.handle_session_event(inbound("room", "after"));
    core.handle_session_event(SessionEvent::Message(
        InboundMessage::new("room", "hello")
            .from_nick("bob")
            .id(CorrelationId::new("m2"))
            .correcting(CorrelationId::new("m1")),
    ));

    assert_eq!(texts(&core, 1), vec!["hello", "after"]);
    let first = conversation(&core, 1).log().messages().next().unwrap();
    assert_eq!(first.revision_count(), 1);
}

#[test]
fn failed_correction_keeps_text_and_reports() {
    let mut core = core();
    core.handle_session_event(SessionEvent::Message(
        InboundMessage::new("room", "orphan")
            .from_nick("bob")
            .correcting(CorrelationId::new("missing")),
    ));

    assert_eq!(texts(&core, 1), vec!["orphan"]);
    assert!(last_info(&core).starts_with("Unable to correct"));
}

#[test]
fn typed_line_is_sent_and_echoed() {
    let mut core = core();
    core.execute_command("message echo").unwrap();
    assert_eq!(core.tabs().current().name(), "echo");

    keys(&mut core, &["h", "i"]);
    keys(&mut core, &["^J"]);
    assert_eq!(texts(&core, 1), vec!["hi"]);

    assert_eq!(core.drain_session_events(), 1);
    assert_eq!(texts(&core, 1), vec!["hi", "hi"]);
}

#[test]
fn correct_command_revises_last_sent_message() {
    let mut core = core();
    core.execute_command("message echo helo").unwrap();
    core.execute_command("correct hello").unwrap();

    let log = conversation(&core, 1).log();
    let own = log.messages().next().unwrap();
    assert_eq!(own.text(), "hello");
    assert_eq!(own.revision_count(), 1);
    assert_eq!(own.previous_revision().unwrap().text(), "helo");

    // both the echo and its correction come back
    core.drain_session_events();
    assert_eq!(texts(&core, 1), vec!["hello", "hello"]);
}

#[test]
fn correct_without_sent_message_fails() {
    let mut core = core();
    core.execute_command("message echo").unwrap();
    assert!(core.execute_command("correct nothing").is_err());
}

#[test]
fn double_slash_sends_literal_slash() {
    let mut core = core();
    core.execute_command("message echo").unwrap();
    core.submit("//tmp is a path").unwrap();
    assert_eq!(texts(&core, 1), vec!["/tmp is a path"]);
}

#[test]
fn double_slash_me_sends_an_action() {
    let mut core = core();
    core.execute_command("message echo").unwrap();
    core.submit("//me waves").unwrap();
    let log = conversation(&core, 1).log();
    let sent = log.last_message().unwrap();
    assert!(sent.is_action());
    assert_eq!(sent.text(), "waves");
}

#[test]
fn rejected_correction_is_not_sent() {
    let mut core = core();
    core.execute_command("message echo").unwrap();
    let tab = core
        .tabs_mut()
        .get_mut(1)
        .and_then(|t| t.as_conversation_mut())
        .unwrap();
    tab.add_message(
        NewMessage::new("from before")
            .nickname("alice")
            .correlation_id(CorrelationId::new("h1"))
            .history(true),
    );
    tab.record_sent(CorrelationId::new("h1"));

    let err = core.execute_command("correct from now").unwrap_err();
    assert!(err.to_string().contains("h1"));
    assert_eq!(core.drain_session_events(), 0);
    assert_eq!(texts(&core, 1), vec!["from before"]);
}

#[test]
fn unknown_command_is_reported_not_fatal() {
    let mut core = core();
    keys(&mut core, &["/", "n", "o", "p", "e"]);
    keys(&mut core, &["^J"]);
    assert_eq!(last_info(&core), "Unknown command (nope)");
    assert!(core.is_running());
}

#[test]
fn meta_digit_jumps_and_repeats_to_previous() {
    let mut core = core();
    core.handle_session_event(inbound("one", "x"));
    core.handle_session_event(inbound("two", "x"));

    keys(&mut core, &["M-2"]);
    assert_eq!(core.tabs().current_index(), 2);
    keys(&mut core, &["M-2"]);
    assert_eq!(core.tabs().current_index(), 0);
}

#[test]
fn meta_digit_to_missing_tab_is_reported() {
    let mut core = core();
    keys(&mut core, &["M-7"]);
    assert_eq!(core.tabs().current_index(), 0);
    assert_eq!(last_info(&core), "Tab 7 does not exist");
}

#[test]
fn bound_keys_rotate_tabs() {
    let mut core = core();
    core.handle_session_event(inbound("one", "x"));
    keys(&mut core, &["^N"]);
    assert_eq!(core.tabs().current_index(), 1);
    keys(&mut core, &["^P"]);
    assert_eq!(core.tabs().current_index(), 0);
}

#[test]
fn focus_clears_attention_state() {
    let mut core = core();
    core.handle_session_event(inbound("one", "x"));
    keys(&mut core, &["M-e"]);
    assert_eq!(core.tabs().current_index(), 1);
    assert_eq!(core.tabs().current().focus_state(), FocusState::Current);
}

#[test]
fn escaped_unbound_key_is_typed() {
    let mut core = core();
    keys(&mut core, &["M-k"]);
    keys(&mut core, &["M-r"]);
    assert_eq!(core.tabs().current().input().unwrap().text(), "M-r");
}

#[test]
fn runtime_binding_aliases_a_key() {
    let mut core = core();
    core.handle_session_event(inbound("one", "x"));
    core.execute_command("bind ^Y ^N").unwrap();
    keys(&mut core, &["^Y"]);
    assert_eq!(core.tabs().current_index(), 1);

    core.execute_command("bind ^Y").unwrap();
    assert!(!core.router().aliases().contains_key("^Y"));
}

#[test]
fn exec_binding_runs_a_command() {
    let mut core = core();
    core.execute_command("bind M-q _exc_quit").unwrap();
    keys(&mut core, &["M-q"]);
    assert!(!core.is_running());
}

#[test]
fn runkey_dispatches_like_a_typed_key() {
    let mut core = core();
    core.handle_session_event(inbound("one", "x"));
    core.execute_command("runkey ^N").unwrap();
    assert_eq!(core.tabs().current_index(), 1);
}

#[test]
fn win_focuses_by_name_fragment_and_number() {
    let mut core = core();
    core.handle_session_event(inbound("alpha@rooms", "x"));
    core.handle_session_event(inbound("beta@rooms", "x"));

    core.execute_command("w bet").unwrap();
    assert_eq!(core.tabs().current().name(), "beta@rooms");
    core.execute_command("win 1").unwrap();
    assert_eq!(core.tabs().current().name(), "alpha@rooms");
    assert_eq!(core.tabs().previous_index(), 2);
    assert_eq!(
        core.execute_command("win nowhere"),
        Err(CommandError::NoSuchTab("nowhere".to_string()))
    );
}

#[test]
fn win_without_argument_is_a_usage_error() {
    let mut core = core();
    assert!(matches!(
        core.execute_command("win"),
        Err(CommandError::Usage { .. })
    ));
}

#[test]
fn move_tab_by_name_keeps_focus_on_same_tab() {
    let mut core = core();
    for name in ["a", "b", "c"] {
        core.handle_session_event(inbound(name, "x"));
    }
    core.execute_command("win c").unwrap();
    core.execute_command("move_tab c 1").unwrap();

    let names: Vec<&str> = core.tabs().iter().map(|t| t.name()).collect();
    assert_eq!(names, vec!["Roster", "c", "a", "b"]);
    assert_eq!(core.tabs().current().name(), "c");
}

#[test]
fn closing_tab_zero_is_refused() {
    let mut core = core();
    assert!(core.execute_command("close").is_err());
    assert_eq!(core.tabs().len(), 1);
}

#[test]
fn disabling_gaps_collapses_them() {
    let mut core = core_with(ResolvedConfig {
        create_gaps: true,
        ..config()
    });
    for name in ["a", "b", "c"] {
        core.handle_session_event(inbound(name, "x"));
    }
    core.execute_command("close 2").unwrap();
    assert_eq!(core.tabs().len(), 4);
    assert!(core.tabs().get(2).unwrap().is_placeholder());

    core.execute_command("set create_gaps false").unwrap();
    assert_eq!(core.tabs().len(), 3);
    assert!(!core.tabs().gap_mode());
    assert_eq!(core.tabs().get(2).unwrap().name(), "c");
}

#[test]
fn set_rejects_bad_values_and_options() {
    let mut core = core();
    assert!(core.execute_command("set create_gaps maybe").is_err());
    assert!(core.execute_command("set colour red").is_err());
}

#[test]
fn help_lists_commands_and_details_one() {
    let mut core = core();
    core.execute_command("help").unwrap();
    assert!(last_info(&core).starts_with("Available commands:"));
    core.execute_command("help win").unwrap();
    assert!(last_info(&core).starts_with("Usage: /win <number or name>"));
}

#[test]
fn lone_tab_key_completes_command_name() {
    let mut core = core();
    keys(&mut core, &["/", "h", "e"]);
    keys(&mut core, &["^I"]);
    assert_eq!(core.tabs().current().input().unwrap().text(), "/help ");
}

#[test]
fn tab_key_completes_tab_names() {
    let mut core = core();
    core.handle_session_event(inbound("Kitchen", "x"));
    keys(&mut core, &["/", "w", "i", "n", " ", "k", "i"]);
    keys(&mut core, &["^I"]);
    assert_eq!(core.tabs().current().input().unwrap().text(), "/win Kitchen ");
}

#[test]
fn error_information_pops_up_then_shrinks() {
    let mut core = core();
    core.information("first\nsecond\nthird", INFO_ERROR);
    assert!(core.info().is_popped_up());
    assert_eq!(core.timed_events().len(), 1);

    core.information("again", INFO_ERROR);
    // the second popup replaces the first timer
    assert_eq!(core.timed_events().len(), 1);

    let later = Instant::now() + Duration::from_secs(core.config().popup_time + 1);
    assert_eq!(core.check_timed_events(later), 1);
    assert!(!core.info().is_popped_up());
    assert!(core.timed_events().is_empty());
}

#[test]
fn popup_leaves_scrolled_conversation_in_place() {
    let mut core = core();
    for i in 0..60 {
        core.handle_session_event(inbound("room", &format!("line {i}")));
    }
    keys(&mut core, &["^N"]);
    keys(&mut core, &["KEY_PPAGE"]);
    let before = conversation(&core, 1).window().unwrap().pos();
    assert!(before > 0);

    core.information("a\nb\nc\nd", INFO_ERROR);
    assert!(core.info().is_popped_up());
    assert_eq!(conversation(&core, 1).window().unwrap().pos(), before);

    core.shrink_information();
    assert_eq!(conversation(&core, 1).window().unwrap().pos(), before);
}

#[test]
fn popup_raised_by_a_timed_event_cancels_the_old_shrink() {
    let mut core = core();
    core.timed_events_mut()
        .add_delayed(Duration::ZERO, |core: &mut Core| {
            core.information("a\nb\nc\nd", INFO_ERROR);
        });
    core.information("e\nf\ng\nh", INFO_ERROR);
    assert_eq!(core.timed_events().len(), 2);

    let later = Instant::now() + Duration::from_secs(core.config().popup_time + 1);
    assert_eq!(core.check_timed_events(later), 1);
    assert!(core.info().is_popped_up());
    assert_eq!(core.timed_events().len(), 1);
}

#[test]
fn huge_popup_time_is_rejected_and_never_panics() {
    let mut core = core();
    assert!(core
        .execute_command("set popup_time 18446744073709551615")
        .is_err());
    core.execute_command("set popup_time 3600").unwrap();
    assert_eq!(core.config().popup_time, 3600);

    let mut core = core_with(ResolvedConfig {
        popup_time: u64::MAX,
        ..config()
    });
    core.information("a\nb\nc", INFO_ERROR);
    assert!(core.info().is_popped_up());
    assert_eq!(core.timed_events().len(), 1);
}

#[test]
fn tall_information_strip_does_not_panic() {
    let mut core = core_with(ResolvedConfig {
        info_win_height: 12,
        ..config()
    });
    core.information("boom", INFO_ERROR);
    assert_eq!(core.info().height(), 12);
}

#[test]
fn info_kind_does_not_pop_up() {
    let mut core = core();
    core.information("quiet", INFO_INFO);
    assert!(!core.info().is_popped_up());
    assert_eq!(last_info(&core), "quiet");
}

#[test]
fn filtered_information_is_dropped() {
    let mut core = core_with(ResolvedConfig {
        filter_info_messages: vec!["joined".to_string()],
        ..config()
    });
    core.information("bob joined", INFO_INFO);
    assert!(core.info().log().is_empty());
}

#[test]
fn timed_callbacks_can_schedule_more_events() {
    let mut core = core();
    core.timed_events_mut()
        .add_delayed(Duration::ZERO, |core: &mut Core| {
            core.information("tick", INFO_INFO);
            core.timed_events_mut()
                .add_delayed(Duration::from_secs(60), |_: &mut Core| {});
        });
    assert_eq!(core.check_timed_events(Instant::now()), 1);
    assert_eq!(last_info(&core), "tick");
    assert_eq!(core.timed_events().len(), 1);
}

#[test]
fn paused_prompt_bypasses_bindings() {
    let mut core = core();
    let answer = core.pause_for_input("Password: ");
    assert_eq!(core.state(), LoopState::Paused);

    keys(&mut core, &["s", "^N", "x"]);
    assert_eq!(core.tabs().current_index(), 0);
    assert_eq!(core.paused_prompt().unwrap().input().text(), "s^Nx");

    keys(&mut core, &["KEY_BACKSPACE", "^J"]);
    assert_eq!(answer.try_recv().unwrap(), "s^N");
    assert_eq!(core.state(), LoopState::Running);
    assert!(core.paused_prompt().is_none());
}

#[test]
fn keys_after_prompt_submit_reach_the_tab() {
    let mut core = core();
    core.execute_command("message echo").unwrap();
    let answer = core.pause_for_input("Continue? ");

    keys(&mut core, &["y", "^J", "h", "i"]);
    assert_eq!(answer.try_recv().unwrap(), "y");
    assert_eq!(core.state(), LoopState::Running);
    assert_eq!(core.tabs().current().input().unwrap().text(), "hi");
}

#[test]
fn paused_prompt_honours_key_aliases() {
    let mut core = core();
    core.router_mut().set_alias("^Y", "^J");
    let answer = core.pause_for_input("Name: ");

    keys(&mut core, &["o"]);
    keys(&mut core, &["k"]);
    keys(&mut core, &["^Y"]);
    assert_eq!(answer.try_recv().unwrap(), "ok");
    assert!(core.paused_prompt().is_none());
}

#[test]
fn resize_rewraps_conversations() {
    let mut core = core();
    core.handle_session_event(inbound("room", "x"));
    core.resize(120, 40);
    let window = conversation(&core, 1).window().unwrap();
    assert_eq!(window.width(), 120);
    assert_eq!(window.height(), 40 - 2 - 1 - 1);
}

#[test]
fn show_timestamps_can_be_toggled() {
    let mut core = core();
    core.handle_session_event(inbound("room", "x"));
    core.execute_command("set show_timestamps false").unwrap();
    assert!(!core.config().show_timestamps);
    assert!(!conversation(&core, 1).log().show_timestamps());
}

#[test]
fn quit_and_exit_stop_the_loop() {
    for command in ["quit", "exit"] {
        let mut core = core();
        core.execute_command(command).unwrap();
        assert!(!core.is_running());
    }
}

#[test]
fn common_prefix_of_candidates() {
    let a = "/move_tab".to_string();
    let b = "/message".to_string();
    assert_eq!(common_prefix(&[&a, &b]), "/m");
}
