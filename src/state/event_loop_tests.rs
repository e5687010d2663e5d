use super::*;
use crate::config::ResolvedConfig;
use crate::session::{event_channel, InboundMessage, LoopbackSession, SessionEvent};
use crate::state::core::INFO_ERROR;
use crossbeam_channel::Sender;
use std::collections::VecDeque;

/// Replays scripted reads; an exhausted script times out forever.
#[derive(Default)]
struct Script {
    reads: VecDeque<Option<Vec<String>>>,
    timeouts: Vec<Duration>,
}

impl Script {
    fn keys(mut self, keys: &[&str]) -> Self {
        self.reads
            .push_back(Some(keys.iter().map(|k| k.to_string()).collect()));
        self
    }

    fn idle(mut self) -> Self {
        self.reads.push_back(None);
        self
    }
}

impl KeySource for Script {
    fn read_keys(&mut self, timeout: Duration) -> io::Result<Option<Vec<String>>> {
        self.timeouts.push(timeout);
        Ok(self.reads.pop_front().flatten())
    }
}

struct Counting {
    size: (u16, u16),
    draws: usize,
}

impl Counting {
    fn new(width: u16, height: u16) -> Self {
        Self {
            size: (width, height),
            draws: 0,
        }
    }
}

impl Display for Counting {
    fn draw(&mut self, _core: &mut Core) -> io::Result<()> {
        self.draws += 1;
        Ok(())
    }

    fn size(&self) -> io::Result<(u16, u16)> {
        Ok(self.size)
    }
}

fn core() -> (Core, Sender<SessionEvent>) {
    let (tx, rx) = event_channel();
    let session = LoopbackSession::new(tx.clone(), "alice");
    let config = ResolvedConfig {
        own_nick: "alice".to_string(),
        input_timeout_ms: 500,
        ..ResolvedConfig::default()
    };
    (Core::new(config, Box::new(session), rx), tx)
}

#[test]
fn start_sizes_core_and_draws_once() {
    let (mut core, _tx) = core();
    let mut event_loop = EventLoop::new(Script::default(), Counting::new(100, 30));
    event_loop.start(&mut core).unwrap();
    assert_eq!(core.screen_size(), (100, 30));
    assert_eq!(event_loop.display().draws, 1);
}

#[test]
fn one_redraw_per_key_batch() {
    let (mut core, _tx) = core();
    let script = Script::default().keys(&["a", "b", "c"]).keys(&["^N"]);
    let mut event_loop = EventLoop::new(script, Counting::new(80, 24));
    event_loop.start(&mut core).unwrap();

    assert_eq!(event_loop.step(&mut core).unwrap(), Step::Keys);
    assert_eq!(event_loop.step(&mut core).unwrap(), Step::Keys);
    assert_eq!(event_loop.display().draws, 3);
}

#[test]
fn idle_timeout_without_work_does_not_redraw() {
    let (mut core, _tx) = core();
    let mut event_loop = EventLoop::new(Script::default().idle(), Counting::new(80, 24));
    event_loop.start(&mut core).unwrap();

    assert_eq!(
        event_loop.step(&mut core).unwrap(),
        Step::Idle {
            fired: 0,
            redrawn: false
        }
    );
    assert_eq!(event_loop.display().draws, 1);
}

#[test]
fn session_events_are_applied_on_timeout() {
    let (mut core, tx) = core();
    let mut event_loop = EventLoop::new(Script::default().idle(), Counting::new(80, 24));
    event_loop.start(&mut core).unwrap();

    tx.send(SessionEvent::Message(
        InboundMessage::new("room", "hi").from_nick("bob"),
    ))
    .unwrap();
    assert_eq!(
        event_loop.step(&mut core).unwrap(),
        Step::Idle {
            fired: 0,
            redrawn: true
        }
    );
    assert_eq!(core.tabs().len(), 2);
    assert_eq!(event_loop.display().draws, 2);
}

#[test]
fn pending_timer_shortens_the_read_timeout() {
    let (mut core, _tx) = core();
    core.timed_events_mut()
        .add_delayed(Duration::from_millis(50), |_: &mut Core| {});
    let mut event_loop = EventLoop::new(Script::default().idle(), Counting::new(80, 24));
    event_loop.step(&mut core).unwrap();

    let timeout = event_loop.keys.timeouts[0];
    assert!(timeout <= Duration::from_millis(50));
}

#[test]
fn timeout_defaults_to_configured_value() {
    let (mut core, _tx) = core();
    let mut event_loop = EventLoop::new(Script::default().idle(), Counting::new(80, 24));
    event_loop.step(&mut core).unwrap();
    assert_eq!(event_loop.keys.timeouts, vec![Duration::from_millis(500)]);
}

#[test]
fn expired_timers_fire_and_redraw_when_idle() {
    let (mut core, _tx) = core();
    core.set_popup_time(0);
    core.information("one\ntwo\nthree\nfour", INFO_ERROR);
    assert!(core.info().is_popped_up());

    let mut event_loop = EventLoop::new(Script::default().idle(), Counting::new(80, 24));
    let step = event_loop.step(&mut core).unwrap();
    assert_eq!(
        step,
        Step::Idle {
            fired: 1,
            redrawn: true
        }
    );
    assert!(!core.info().is_popped_up());
}

#[test]
fn resize_key_picks_up_new_display_size() {
    let (mut core, _tx) = core();
    let mut event_loop = EventLoop::new(
        Script::default().keys(&["KEY_RESIZE"]),
        Counting::new(80, 24),
    );
    event_loop.start(&mut core).unwrap();

    event_loop.display_mut().size = (132, 50);
    event_loop.step(&mut core).unwrap();
    assert_eq!(core.screen_size(), (132, 50));
    assert_eq!(core.info().roster_window().unwrap().width(), 132);
}

#[test]
fn quit_command_stops_run() {
    let (mut core, _tx) = core();
    let script = Script::default()
        .keys(&["/", "q", "u", "i", "t"])
        .idle()
        .keys(&["^J"]);
    let mut event_loop = EventLoop::new(script, Counting::new(80, 24));
    event_loop.run(&mut core).unwrap();

    assert!(!core.is_running());
    assert!(event_loop.keys.reads.is_empty());
}

#[test]
fn stopped_core_steps_to_stopped() {
    let (mut core, _tx) = core();
    core.quit();
    let mut event_loop = EventLoop::new(Script::default().keys(&["x"]), Counting::new(80, 24));
    assert_eq!(event_loop.step(&mut core).unwrap(), Step::Stopped);
    assert_eq!(event_loop.display().draws, 0);
}
