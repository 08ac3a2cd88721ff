//! Key scripts driven through a session with the terminal display.

use elltwo_client::{Command, TerminalDisplay, parse_line};
use elltwo_core::{ClientMessage, ExportFormat, Session};

type ScriptSession = Session<TerminalDisplay<Vec<u8>>, Vec<ClientMessage>>;

const LOAD: &str = r#"{"cmd": "fetch", "content": [
    {"cid": "1", "body": "Body text.", "prev": "0", "next": "-1"},
    {"cid": "0", "body": "Title", "prev": "-1", "next": "1"}
]}"#;

fn session() -> ScriptSession {
    let mut session = Session::new(TerminalDisplay::new(Vec::new()), Vec::new());
    session.on_connected();
    session.handle_frame(LOAD);
    session
}

fn run(session: &mut ScriptSession, script: &str) {
    for line in script.lines() {
        if let Some(command) = parse_line(line, false).unwrap() {
            command.apply(session);
        }
    }
}

fn cmds(session: &ScriptSession) -> Vec<&'static str> {
    session.sink().iter().map(ClientMessage::cmd).collect()
}

#[test]
fn edit_split_and_save() {
    let mut session = session();
    run(
        &mut session,
        "
        # open the title, append, then split into a new cell
        w
        type  and more
        shift+enter
        type second
        esc
        ctrl+s
        ",
    );

    assert_eq!(cmds(&session), ["fetch", "save", "create", "save", "write"]);
    assert_eq!(session.markdown(), "Title and more\n\nsecond\n\nBody text.");
    assert!(!session.is_modified());

    let frame = session.display().frame();
    assert!(frame.starts_with("-- editing --\n"));
    assert!(frame.contains(">*    2  second\n"), "{frame}");
}

#[test]
fn cut_and_paste_reorders() {
    let mut session = session();
    run(&mut session, "shift+x\nshift+v");
    assert_eq!(session.markdown(), "Body text.\n\nTitle");
}

#[test]
fn toggle_and_click() {
    let mut session = session();
    run(&mut session, "toggle\nclick 1\no");
    assert_eq!(session.active().map(|id| id.get()), Some(0));
    assert_eq!(session.store().len(), 2);

    run(&mut session, "toggle\nclick 1");
    assert_eq!(session.active().map(|id| id.get()), Some(1));
}

#[test]
fn markdown_export_and_reload() {
    let mut session = session();
    run(&mut session, "export md\nexport html\nreload\nrevert");

    let exports: Vec<_> = session
        .sink()
        .iter()
        .filter_map(|m| match m {
            ClientMessage::Export(request) => Some((request.format, request.data.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(exports, [(ExportFormat::Md, "Title\n\nBody text.".to_string())]);
    assert_eq!(cmds(&session), ["fetch", "export", "fetch", "revert"]);
}

#[test]
fn quit_is_a_command() {
    assert_eq!(parse_line("quit", false), Ok(Some(Command::Quit)));
}
