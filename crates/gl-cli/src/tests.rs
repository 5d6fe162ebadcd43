use super::*;
use gl_api::{create_lesson_engine, CreateLessonEngineOptions, LessonConfig};
use gl_core::{Script, ScriptStep};
use gl_runtime::EnginePhase;
use gl_scripts::default_character;

fn output_of(run: impl FnOnce(&mut Vec<u8>) -> Result<i32, LessonError>) -> (i32, String) {
    let mut buffer = Vec::new();
    let code = run(&mut buffer).expect("command should succeed");
    (code, String::from_utf8(buffer).expect("output should be utf-8"))
}

fn offline_session(module: &str) -> PlaySession {
    let engine = create_lesson_engine(CreateLessonEngineOptions {
        config: LessonConfig::default(),
        registry: None,
        force_offline: true,
    })
    .expect("engine should build");
    PlaySession {
        engine,
        module: module.to_string(),
        lesson: "grade9-science".to_string(),
        character: default_character(),
    }
}

#[test]
fn play_args_use_defaults() {
    let cli = Cli::try_parse_from(["gl-cli", "play", "--module", "volcanoes"])
        .expect("args should parse");
    let Mode::Play(args) = cli.command else {
        panic!("expected play mode");
    };
    assert_eq!(args.module, "volcanoes");
    assert_eq!(args.lesson, "grade9-science");
    assert_eq!(args.character, gl_scripts::DEFAULT_CHARACTER_ID);
    assert!(!args.offline);
    assert!(args.config.is_none());
}

#[test]
fn play_requires_a_module() {
    assert!(Cli::try_parse_from(["gl-cli", "play"]).is_err());
    assert_ne!(run_cli_from_args(["gl-cli", "play"]), 0);
}

#[test]
fn unknown_subcommand_fails_with_parser_exit_code() {
    assert_eq!(run_cli_from_args(["gl-cli", "explode"]), 2);
}

#[test]
fn modules_lists_every_builtin_module() {
    let registry = ScriptRegistry::builtin();
    let (code, output) = output_of(|buffer| run_modules(&registry, buffer));
    assert_eq!(code, 0);
    for id in ["photosynthesis", "volcanoes", "chemical_bonding", "circulatory_system"] {
        assert!(
            output.lines().any(|line| line.starts_with(&format!("MODULE:{}|", id))),
            "missing {} in {}",
            id,
            output
        );
    }
}

#[test]
fn validate_reports_ok_for_builtin_modules() {
    let registry = ScriptRegistry::builtin();
    let (code, output) = output_of(|buffer| run_validate(&registry, buffer));
    assert_eq!(code, 0);
    assert_eq!(output.trim(), "RESULT:OK");
}

#[test]
fn validate_prints_one_line_per_issue() {
    let registry = ScriptRegistry::from_scripts([
        Script {
            id: "empty".to_string(),
            title: "Empty".to_string(),
            steps: Vec::new(),
        },
        Script {
            id: "valid".to_string(),
            title: "Valid".to_string(),
            steps: vec![ScriptStep::narration(["Hello."]), ScriptStep::complete()],
        },
    ])
    .expect("registry");
    let (code, output) = output_of(|buffer| run_validate(&registry, buffer));
    assert_eq!(code, 1);
    assert_eq!(output.trim(), "ISSUE:empty|-|EMPTY_SCRIPT");
}

#[tokio::test]
async fn line_commands_drive_the_engine() {
    let session = offline_session("volcanoes");
    let mut lines = Vec::new();
    let mut emit = |line: String| lines.push(line);

    assert_eq!(
        handle_line_cmd(":help", &session, &mut emit).await,
        LineAction::Continue
    );
    assert_eq!(
        handle_line_cmd(":pause", &session, &mut emit).await,
        LineAction::Continue
    );
    assert!(session.engine.is_paused());
    assert_eq!(
        handle_line_cmd(":resume", &session, &mut emit).await,
        LineAction::Continue
    );
    assert!(!session.engine.is_paused());
    assert_eq!(
        handle_line_cmd(":reset", &session, &mut emit).await,
        LineAction::Continue
    );
    assert_eq!(session.engine.phase().await, EnginePhase::Idle);
    assert_eq!(
        handle_line_cmd("magma", &session, &mut emit).await,
        LineAction::NotHandled
    );
    assert_eq!(
        handle_line_cmd(":quit", &session, &mut emit).await,
        LineAction::Quit
    );

    assert_eq!(
        lines,
        vec![
            HELP_LINE.to_string(),
            "paused".to_string(),
            "resumed".to_string(),
            "reset".to_string(),
            "bye".to_string(),
        ]
    );
}
