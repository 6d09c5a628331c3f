//! Dialogue loop integration tests
//!
//! Drives the state machine with a scripted voice interface: no audio
//! hardware, no network.

use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
use std::sync::mpsc::{Receiver, channel};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use vigil_hud::config::VoiceConfig;
use vigil_hud::dialogue::{
    CommandRouter, DialogueEvent, DialogueStatus, DialogueWorker, Speaker,
};
use vigil_hud::llm::Brain;
use vigil_hud::speech::VoiceInterface;
use vigil_hud::vision::VisionState;
use vigil_hud::{Error, Result};

mod common;

/// Voice returning scripted listen results and recording spoken text
struct ScriptedVoice {
    listens: VecDeque<Option<String>>,
    spoken: Arc<Mutex<Vec<String>>>,
}

impl ScriptedVoice {
    fn new(listens: Vec<Option<&str>>) -> (Self, Arc<Mutex<Vec<String>>>) {
        let spoken = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                listens: listens
                    .into_iter()
                    .map(|l| l.map(String::from))
                    .collect(),
                spoken: Arc::clone(&spoken),
            },
            spoken,
        )
    }
}

impl VoiceInterface for ScriptedVoice {
    fn listen(
        &mut self,
        _timeout: Duration,
        _phrase_limit: Duration,
        _stop: &AtomicBool,
    ) -> Result<Option<String>> {
        match self.listens.pop_front() {
            Some(result) => Ok(result),
            None => {
                // Script exhausted: behave like silence
                std::thread::sleep(Duration::from_millis(10));
                Ok(None)
            }
        }
    }

    fn speak(&mut self, text: &str) -> Result<()> {
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Brain that must not be called
struct UnreachableBrain;

impl Brain for UnreachableBrain {
    fn complete(&self, _user_text: &str, _context_labels: &[String]) -> Result<String> {
        Err(Error::Llm("brain should not be reached".to_string()))
    }
}

fn test_config() -> VoiceConfig {
    VoiceConfig {
        listen_timeout: Duration::from_millis(50),
        phrase_limit: Duration::from_millis(100),
        ..VoiceConfig::default()
    }
}

/// Collect events until the predicate matches one, or panic on timeout
fn collect_until(
    rx: &Receiver<DialogueEvent>,
    pred: impl Fn(&DialogueEvent) -> bool,
) -> Vec<DialogueEvent> {
    let mut events = Vec::new();
    let deadline = std::time::Instant::now() + Duration::from_secs(2);
    while std::time::Instant::now() < deadline {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                let done = pred(&event);
                events.push(event);
                if done {
                    return events;
                }
            }
            Err(_) => continue,
        }
    }
    panic!("expected event not observed; saw: {events:?}");
}

fn is_message_from(event: &DialogueEvent, who: Speaker) -> bool {
    matches!(event, DialogueEvent::Message { sender, .. } if *sender == who)
}

#[test]
fn test_full_cycle_transitions() {
    let (voice, spoken) = ScriptedVoice::new(vec![Some("who are you")]);
    let router = CommandRouter::new(Box::new(UnreachableBrain));
    let vision = Arc::new(VisionState::new());
    let (tx, rx) = channel();

    let worker = DialogueWorker::start(
        move || -> Box<dyn VoiceInterface> { Box::new(voice) },
        router,
        vision,
        tx,
        test_config(),
    )
    .unwrap();

    let events = collect_until(&rx, |e| is_message_from(e, Speaker::Assistant));

    // Listening precedes the user message, Processing follows it
    let listening = events
        .iter()
        .position(|e| matches!(e, DialogueEvent::Status(DialogueStatus::Listening)))
        .expect("no Listening status");
    let user_msg = events
        .iter()
        .position(|e| is_message_from(e, Speaker::User))
        .expect("no user message");
    let processing = events
        .iter()
        .position(|e| matches!(e, DialogueEvent::Status(DialogueStatus::Processing)))
        .expect("no Processing status");
    assert!(listening < user_msg);
    assert!(user_msg < processing);

    // Speaking follows, then the response is actually played back
    let _ = collect_until(&rx, |e| {
        matches!(e, DialogueEvent::Status(DialogueStatus::Speaking))
    });
    let _ = collect_until(&rx, |e| {
        matches!(e, DialogueEvent::Status(DialogueStatus::Idle))
    });

    worker.stop();

    let spoken = spoken.lock().unwrap();
    assert_eq!(spoken.len(), 1);
    assert!(spoken[0].contains("Vigil"));
}

#[test]
fn test_listen_timeout_goes_back_to_idle_without_routing() {
    let (voice, spoken) = ScriptedVoice::new(vec![None, None]);
    let router = CommandRouter::new(Box::new(UnreachableBrain));
    let vision = Arc::new(VisionState::new());
    let (tx, rx) = channel();

    let worker = DialogueWorker::start(
        move || -> Box<dyn VoiceInterface> { Box::new(voice) },
        router,
        vision,
        tx,
        test_config(),
    )
    .unwrap();

    // Listening then straight back to Idle
    let events = collect_until(&rx, |e| {
        matches!(e, DialogueEvent::Status(DialogueStatus::Idle))
    });

    assert!(events
        .iter()
        .any(|e| matches!(e, DialogueEvent::Status(DialogueStatus::Listening))));
    assert!(!events
        .iter()
        .any(|e| matches!(e, DialogueEvent::Status(DialogueStatus::Processing))));
    assert!(!events.iter().any(|e| is_message_from(e, Speaker::User)));

    worker.stop();
    assert!(spoken.lock().unwrap().is_empty());
}

#[test]
fn test_greeting_is_spoken_before_first_listen() {
    let (voice, spoken) = ScriptedVoice::new(vec![None]);
    let router = CommandRouter::new(Box::new(UnreachableBrain));
    let vision = Arc::new(VisionState::new());
    let (tx, rx) = channel();

    let config = VoiceConfig {
        greeting: Some("Welcome back. All systems online.".to_string()),
        ..test_config()
    };

    let worker = DialogueWorker::start(
        move || -> Box<dyn VoiceInterface> { Box::new(voice) },
        router,
        vision,
        tx,
        config,
    )
    .unwrap();

    let events = collect_until(&rx, |e| is_message_from(e, Speaker::Assistant));
    let greeting = events
        .iter()
        .find_map(|e| match e {
            DialogueEvent::Message { sender, text, .. } if *sender == Speaker::Assistant => {
                Some(text.clone())
            }
            _ => None,
        })
        .unwrap();
    assert!(greeting.contains("Welcome back"));

    // Greeting is spoken before the first listen cycle starts
    let _ = collect_until(&rx, |e| {
        matches!(e, DialogueEvent::Status(DialogueStatus::Listening))
    });
    worker.stop();
    assert_eq!(*spoken.lock().unwrap(), vec![greeting]);
}

#[test]
fn test_shutdown_keyword_emits_event_but_loop_decides_nothing() {
    let (voice, _) = ScriptedVoice::new(vec![Some("terminate")]);
    let router = CommandRouter::new(Box::new(UnreachableBrain));
    let vision = Arc::new(VisionState::new());
    let (tx, rx) = channel();

    let worker = DialogueWorker::start(
        move || -> Box<dyn VoiceInterface> { Box::new(voice) },
        router,
        vision,
        tx,
        test_config(),
    )
    .unwrap();

    let _ = collect_until(&rx, |e| matches!(e, DialogueEvent::ShutdownRequested));

    worker.stop();
}

#[test]
fn test_scene_answer_uses_latest_detections() {
    let (voice, spoken) = ScriptedVoice::new(vec![Some("what do you see")]);
    let router = CommandRouter::new(Box::new(UnreachableBrain));
    let vision = Arc::new(VisionState::new());
    vision.publish(
        vigil_hud::vision::Frame::from_rgb8(2, 2, vec![0; 12]).unwrap(),
        vec![common::detection("person", 0.9)],
    );
    let (tx, rx) = channel();

    let worker = DialogueWorker::start(
        move || -> Box<dyn VoiceInterface> { Box::new(voice) },
        router,
        Arc::clone(&vision),
        tx,
        test_config(),
    )
    .unwrap();

    let events = collect_until(&rx, |e| is_message_from(e, Speaker::Assistant));
    let answer = events
        .iter()
        .find_map(|e| match e {
            DialogueEvent::Message { sender, text, .. } if *sender == Speaker::Assistant => {
                Some(text.clone())
            }
            _ => None,
        })
        .unwrap();
    assert_eq!(answer, "I see person.");

    worker.stop();
    assert_eq!(*spoken.lock().unwrap(), vec!["I see person.".to_string()]);
}

#[test]
fn test_stop_joins_and_loop_ends() {
    let (voice, _) = ScriptedVoice::new(vec![]);
    let router = CommandRouter::new(Box::new(UnreachableBrain));
    let vision = Arc::new(VisionState::new());
    let (tx, rx) = channel();

    let worker = DialogueWorker::start(
        move || -> Box<dyn VoiceInterface> { Box::new(voice) },
        router,
        vision,
        tx,
        test_config(),
    )
    .unwrap();

    let _ = collect_until(&rx, |e| {
        matches!(e, DialogueEvent::Status(DialogueStatus::Listening))
    });

    worker.stop();

    // Channel drains and disconnects once the thread exits
    let deadline = std::time::Instant::now() + Duration::from_secs(1);
    loop {
        match rx.recv_timeout(Duration::from_millis(50)) {
            Ok(_) => {}
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {
                assert!(
                    std::time::Instant::now() < deadline,
                    "worker did not disconnect after stop"
                );
            }
        }
    }
}
