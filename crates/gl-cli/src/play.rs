use gl_api::{create_lesson_engine, CreateLessonEngineOptions, LessonConfig};
use gl_core::{CharacterProfile, LessonError};
use gl_runtime::{DialogueEngine, EnginePhase, SubmitOutcome};
use gl_scripts::character_or_default;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::{map_cli_io, map_cli_runtime, print_transcript, PlayArgs};

pub(crate) const HELP_LINE: &str = "commands: :help :pause :resume :reset :restart :quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineAction {
    NotHandled,
    Continue,
    Quit,
}

pub(crate) struct PlaySession {
    pub(crate) engine: DialogueEngine,
    pub(crate) module: String,
    pub(crate) lesson: String,
    pub(crate) character: CharacterProfile,
}

impl PlaySession {
    /// Starts the module in the background; the engine reports progress
    /// through its stores.
    pub(crate) fn start(&self) {
        let engine = self.engine.clone();
        let module = self.module.clone();
        let lesson = self.lesson.clone();
        let character = self.character.clone();
        tokio::spawn(async move {
            engine.start_module(&module, &lesson, character).await;
        });
    }

    fn submit(&self, text: String) {
        let engine = self.engine.clone();
        tokio::spawn(async move {
            let outcome = engine.send_student_message(&text).await;
            debug!(?outcome, "reply handled");
            if outcome == SubmitOutcome::Ignored {
                println!("(the tutor is not waiting for an answer right now)");
            }
            if engine.phase().await == EnginePhase::Completed {
                println!("[module complete]");
            }
        });
    }
}

pub(crate) async fn handle_line_cmd(
    raw: &str,
    session: &PlaySession,
    emit: &mut dyn FnMut(String),
) -> LineAction {
    match raw {
        ":help" => {
            emit(HELP_LINE.to_string());
            LineAction::Continue
        }
        ":pause" => {
            session.engine.pause();
            emit("paused".to_string());
            LineAction::Continue
        }
        ":resume" => {
            session.engine.resume();
            emit("resumed".to_string());
            LineAction::Continue
        }
        ":reset" => {
            session.engine.reset().await;
            emit("reset".to_string());
            LineAction::Continue
        }
        ":restart" => {
            session.start();
            emit("restarted".to_string());
            LineAction::Continue
        }
        ":quit" => {
            emit("bye".to_string());
            LineAction::Quit
        }
        _ => LineAction::NotHandled,
    }
}

pub(crate) fn run_play(args: PlayArgs) -> Result<i32, LessonError> {
    let mut config = LessonConfig::from_env()?;
    if let Some(path) = &args.config {
        config.load_overlay(path)?;
    }
    config.log_summary();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(map_cli_runtime)?;
    let result = runtime.block_on(play_session(args, config));
    // A pending stdin read must not keep the process alive.
    runtime.shutdown_background();
    result
}

async fn play_session(args: PlayArgs, config: LessonConfig) -> Result<i32, LessonError> {
    let engine = create_lesson_engine(CreateLessonEngineOptions {
        config,
        registry: None,
        force_offline: args.offline,
    })?;
    let character = character_or_default(&args.character);
    info!(
        module_id = %args.module,
        lesson_id = %args.lesson,
        character = %character.id,
        offline = args.offline,
        "starting play session"
    );
    let title = engine.registry().resolve(&args.module).title.clone();

    println!("Guided Lesson: {}", title);
    println!("with {}", character.name);
    println!("{}", HELP_LINE);

    let printer = tokio::spawn(print_transcript(
        engine.subscribe_dialogue(),
        engine.subscribe_narration(),
    ));
    let session = PlaySession {
        engine,
        module: args.module,
        lesson: args.lesson,
        character,
    };
    session.start();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let Some(line) = lines.next_line().await.map_err(map_cli_io)? else {
            println!("bye");
            break;
        };
        let raw = line.trim();
        if raw.is_empty() {
            continue;
        }

        let mut emit = |line: String| println!("{}", line);
        match handle_line_cmd(raw, &session, &mut emit).await {
            LineAction::Continue => continue,
            LineAction::Quit => break,
            LineAction::NotHandled => {}
        }
        session.submit(raw.to_string());
    }

    printer.abort();
    Ok(0)
}
