//! Build pipeline state machine.
//!
//! A build moves through a fixed set of [`State`]s driven by [`Event`]s.
//! Legal moves are listed in one static table ([`transition`]). After each
//! move the machine asks its [`StageHandler`] for the next event and keeps
//! going until the handler has nothing to say, so a single
//! [`StateMachine::accept`] call may cascade through several states.
//!
//! ```text
//! Ready -> Parsing -> Generating -> WithCode -> [Compiling -> WithBinary ->]
//!       [Installing -> Installed ->] Success
//! ```
//!
//! [`Event::Error`] moves any state to [`State::Failure`], which is
//! absorbing. An event the current state does not accept also ends in
//! `Failure` and is reported as [`BuildError::Protocol`].

use std::fmt;
use std::path::PathBuf;

use restcmd_core::{ApiDocument, CommandTree};
use tracing::{debug, info};

use crate::error::BuildError;

/// Pipeline states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Ready,
    Parsing,
    Generating,
    /// Sources are on disk.
    WithCode,
    Compiling,
    /// A binary is on disk.
    WithBinary,
    Installing,
    Installed,
    Success,
    Failure,
}

impl State {
    pub fn as_str(self) -> &'static str {
        match self {
            State::Ready => "Ready",
            State::Parsing => "Parsing",
            State::Generating => "Generating",
            State::WithCode => "WithCode",
            State::Compiling => "Compiling",
            State::WithBinary => "WithBinary",
            State::Installing => "Installing",
            State::Installed => "Installed",
            State::Success => "Success",
            State::Failure => "Failure",
        }
    }

    /// `Success` and `Failure` end a build.
    pub fn is_terminal(self) -> bool {
        matches!(self, State::Success | State::Failure)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload-free tag of an [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    StartParsing,
    FinishParsing,
    StartGenerateCode,
    FinishGenerateCode,
    StartCompile,
    FinishCompile,
    StartInstall,
    FinishInstall,
    End,
    Error,
}

/// Inputs to the state machine.
#[derive(Debug)]
pub enum Event {
    StartParsing { input: PathBuf },
    FinishParsing {
        tree: CommandTree,
        document: ApiDocument,
    },
    StartGenerateCode,
    FinishGenerateCode { root_usage: String },
    StartCompile { binary_name: String },
    FinishCompile,
    StartInstall,
    FinishInstall { path: PathBuf },
    End,
    Error(BuildError),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::StartParsing { .. } => EventKind::StartParsing,
            Event::FinishParsing { .. } => EventKind::FinishParsing,
            Event::StartGenerateCode => EventKind::StartGenerateCode,
            Event::FinishGenerateCode { .. } => EventKind::FinishGenerateCode,
            Event::StartCompile { .. } => EventKind::StartCompile,
            Event::FinishCompile => EventKind::FinishCompile,
            Event::StartInstall => EventKind::StartInstall,
            Event::FinishInstall { .. } => EventKind::FinishInstall,
            Event::End => EventKind::End,
            Event::Error(_) => EventKind::Error,
        }
    }
}

/// The transition table. `None` means `event` is not accepted in `from`.
///
/// [`EventKind::Error`] is handled by the machine before the table is
/// consulted.
pub fn transition(from: State, event: EventKind) -> Option<State> {
    use EventKind as E;
    use State as S;

    match (from, event) {
        (S::Ready, E::StartParsing) => Some(S::Parsing),
        (S::Parsing, E::FinishParsing) => Some(S::Generating),
        (S::Generating, E::FinishGenerateCode) => Some(S::WithCode),
        (S::WithCode, E::StartCompile) => Some(S::Compiling),
        (S::WithCode, E::End) => Some(S::Success),
        (S::Compiling, E::FinishCompile) => Some(S::WithBinary),
        (S::WithBinary, E::StartInstall) => Some(S::Installing),
        (S::WithBinary, E::End) => Some(S::Success),
        (S::Installing, E::FinishInstall) => Some(S::Installed),
        (S::Installed, E::End) => Some(S::Success),
        _ => None,
    }
}

/// Work attached to a state.
pub trait StageHandler {
    /// Runs the work for `state`, which was just entered because of
    /// `event`, and returns the follow-up event. `None` means the state has
    /// no work and the machine stops there.
    fn handle(&mut self, state: State, event: Event) -> Option<Event>;
}

/// Drives a [`StageHandler`] through the transition table.
#[derive(Debug)]
pub struct StateMachine<H> {
    state: State,
    last_event: Option<EventKind>,
    history: Vec<State>,
    handler: H,
}

impl<H: StageHandler> StateMachine<H> {
    pub fn new(handler: H) -> Self {
        Self {
            state: State::Ready,
            last_event: None,
            history: vec![State::Ready],
            handler,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn last_event(&self) -> Option<EventKind> {
        self.last_event
    }

    /// Every state entered so far, starting with `Ready`.
    pub fn history(&self) -> &[State] {
        &self.history
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Feeds `event` and follows handler events until the machine settles.
    ///
    /// Returns the state the machine settled in.
    ///
    /// # Errors
    ///
    /// The error carried by an [`Event::Error`], whether fed directly or
    /// produced by a handler, or [`BuildError::Protocol`] for an event the
    /// current state does not accept. The machine is in
    /// [`State::Failure`] afterwards.
    pub fn accept(&mut self, event: Event) -> Result<State, BuildError> {
        let mut pending = event;
        loop {
            let kind = pending.kind();
            debug!(state = %self.state, event = ?kind, "event received");

            let error = match pending {
                Event::Error(error) => error,
                event => match transition(self.state, kind) {
                    Some(next) => {
                        self.last_event = Some(kind);
                        self.enter(next);
                        match self.handler.handle(next, event) {
                            Some(follow_up) => {
                                pending = follow_up;
                                continue;
                            }
                            None => return Ok(next),
                        }
                    }
                    None => BuildError::Protocol {
                        state: self.state,
                        event: kind,
                    },
                },
            };
            return Err(self.fail(error));
        }
    }

    /// Moves to [`State::Failure`] and hands `error` back.
    pub fn fail(&mut self, error: BuildError) -> BuildError {
        self.last_event = Some(EventKind::Error);
        debug!(state = %self.state, error = %error, "build failed");
        if self.state != State::Failure {
            self.enter(State::Failure);
        }
        error
    }

    fn enter(&mut self, next: State) {
        info!(from = %self.state, to = %next, "state changed");
        self.state = next;
        self.history.push(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use restcmd_codegen::CodegenError;

    /// Handler that records what it saw and answers from a script.
    #[derive(Default)]
    struct Scripted {
        seen: Vec<(State, EventKind)>,
        compile: bool,
        fail_in: Option<State>,
    }

    impl StageHandler for Scripted {
        fn handle(&mut self, state: State, event: Event) -> Option<Event> {
            self.seen.push((state, event.kind()));
            if self.fail_in == Some(state) {
                return Some(Event::Error(BuildError::Generate(
                    CodegenError::MissingContext,
                )));
            }
            match state {
                State::Generating => Some(Event::FinishGenerateCode {
                    root_usage: "petctl".to_string(),
                }),
                State::WithCode if self.compile => Some(Event::StartCompile {
                    binary_name: "petctl".to_string(),
                }),
                State::WithCode => Some(Event::End),
                State::Compiling => Some(Event::FinishCompile),
                State::WithBinary => Some(Event::End),
                _ => None,
            }
        }
    }

    fn parsed() -> Event {
        Event::FinishParsing {
            tree: CommandTree::new(),
            document: ApiDocument::new("Petstore", "1.0.0"),
        }
    }

    const ALL_STATES: [State; 10] = [
        State::Ready,
        State::Parsing,
        State::Generating,
        State::WithCode,
        State::Compiling,
        State::WithBinary,
        State::Installing,
        State::Installed,
        State::Success,
        State::Failure,
    ];

    const ALL_EVENTS: [EventKind; 10] = [
        EventKind::StartParsing,
        EventKind::FinishParsing,
        EventKind::StartGenerateCode,
        EventKind::FinishGenerateCode,
        EventKind::StartCompile,
        EventKind::FinishCompile,
        EventKind::StartInstall,
        EventKind::FinishInstall,
        EventKind::End,
        EventKind::Error,
    ];

    #[test]
    fn test_ready_accepts_only_start_parsing() {
        for event in ALL_EVENTS {
            let expected = (event == EventKind::StartParsing).then_some(State::Parsing);
            assert_eq!(transition(State::Ready, event), expected, "{event:?}");
        }
    }

    #[test]
    fn test_terminal_states_accept_nothing() {
        for state in [State::Success, State::Failure] {
            assert!(state.is_terminal());
            for event in ALL_EVENTS {
                assert_eq!(transition(state, event), None);
            }
        }
    }

    #[test]
    fn test_table_never_targets_failure() {
        for state in ALL_STATES {
            for event in ALL_EVENTS {
                assert_ne!(transition(state, event), Some(State::Failure));
            }
        }
    }

    #[test]
    fn test_cascade_without_compile() {
        let mut machine = StateMachine::new(Scripted::default());
        assert_eq!(
            machine
                .accept(Event::StartParsing {
                    input: PathBuf::from("api.yaml")
                })
                .unwrap(),
            State::Parsing
        );
        assert_eq!(machine.accept(parsed()).unwrap(), State::Success);
        assert_eq!(
            machine.history(),
            [
                State::Ready,
                State::Parsing,
                State::Generating,
                State::WithCode,
                State::Success
            ]
        );
        assert_eq!(machine.last_event(), Some(EventKind::End));
        assert_eq!(
            machine.handler().seen,
            [
                (State::Parsing, EventKind::StartParsing),
                (State::Generating, EventKind::FinishParsing),
                (State::WithCode, EventKind::FinishGenerateCode),
                (State::Success, EventKind::End),
            ]
        );
    }

    #[test]
    fn test_cascade_with_compile() {
        let handler = Scripted {
            compile: true,
            ..Scripted::default()
        };
        let mut machine = StateMachine::new(handler);
        machine
            .accept(Event::StartParsing {
                input: PathBuf::from("api.yaml"),
            })
            .unwrap();
        assert_eq!(machine.accept(parsed()).unwrap(), State::Success);
        assert!(machine.history().contains(&State::Compiling));
        assert!(machine.history().contains(&State::WithBinary));
    }

    #[test]
    fn test_handler_error_forces_failure() {
        let handler = Scripted {
            fail_in: Some(State::Generating),
            ..Scripted::default()
        };
        let mut machine = StateMachine::new(handler);
        machine
            .accept(Event::StartParsing {
                input: PathBuf::from("api.yaml"),
            })
            .unwrap();
        let err = machine.accept(parsed()).unwrap_err();

        assert!(matches!(err, BuildError::Generate(CodegenError::MissingContext)));
        assert_eq!(machine.state(), State::Failure);
        assert_eq!(machine.last_event(), Some(EventKind::Error));
        assert_eq!(machine.history().last(), Some(&State::Failure));
        assert!(!machine.history().contains(&State::WithCode));
    }

    #[test]
    fn test_error_reaches_failure_from_every_working_state() {
        let working = [
            State::Parsing,
            State::Generating,
            State::WithCode,
            State::Compiling,
            State::WithBinary,
        ];
        for fail_in in working {
            let handler = Scripted {
                compile: true,
                fail_in: Some(fail_in),
                ..Scripted::default()
            };
            let mut machine = StateMachine::new(handler);
            let first = machine.accept(Event::StartParsing {
                input: PathBuf::from("api.yaml"),
            });
            let result = match first {
                Ok(_) => machine.accept(parsed()),
                Err(err) => Err(err),
            };

            assert!(result.is_err(), "{fail_in}");
            assert_eq!(machine.state(), State::Failure, "{fail_in}");
            let history = machine.history();
            assert_eq!(history[history.len() - 2], fail_in);
        }

        let mut machine = StateMachine::new(Scripted::default());
        let err = machine
            .accept(Event::Error(BuildError::Parse(CodegenError::MissingServerUrl)))
            .unwrap_err();
        assert!(matches!(err, BuildError::Parse(_)));
        assert_eq!(machine.history(), [State::Ready, State::Failure]);
    }

    #[test]
    fn test_protocol_violation() {
        let mut machine = StateMachine::new(Scripted::default());
        let err = machine.accept(Event::StartGenerateCode).unwrap_err();
        assert!(matches!(
            err,
            BuildError::Protocol {
                state: State::Ready,
                event: EventKind::StartGenerateCode
            }
        ));
        assert_eq!(machine.state(), State::Failure);
        assert_eq!(machine.history(), [State::Ready, State::Failure]);
    }

    #[test]
    fn test_failure_is_absorbing() {
        let mut machine = StateMachine::new(Scripted::default());
        machine.fail(BuildError::Parse(CodegenError::MissingServerUrl));
        let err = machine
            .accept(Event::StartParsing {
                input: PathBuf::from("api.yaml"),
            })
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::Protocol {
                state: State::Failure,
                ..
            }
        ));
        assert_eq!(machine.state(), State::Failure);
        assert_eq!(machine.history(), [State::Ready, State::Failure]);
    }
}
