//! End-to-end session scenarios against a recording display.

use elltwo_core::{
    CellId, CellRecord, ClientMessage, Display, DocumentMode, EditBuffer, Key, KeyEvent,
    KeydownResult, LoadMode, ServerMessage, Session,
};
use elltwo_core::protocol::{CreateCell, DeleteCell, SaveCell};

#[derive(Debug, Default)]
struct Recorder {
    order: Vec<CellId>,
    rendered: Vec<(CellId, String)>,
    active: Option<CellId>,
    selected: Vec<CellId>,
    navigated: Vec<String>,
    mode: Option<DocumentMode>,
}

impl Display for Recorder {
    fn attach(&mut self, id: CellId, after: Option<CellId>) {
        let at = after
            .and_then(|after| self.order.iter().position(|&c| c == after))
            .map(|ix| ix + 1)
            .unwrap_or(0);
        self.order.insert(at, id);
    }

    fn detach(&mut self, id: CellId) {
        self.order.retain(|&c| c != id);
    }

    fn render(&mut self, id: CellId, text: &str) {
        self.rendered.push((id, text.to_string()));
    }

    fn show_editor(&mut self, _id: CellId, _buffer: &EditBuffer) {}

    fn set_active(&mut self, id: Option<CellId>) {
        self.active = id;
    }

    fn set_selected(&mut self, ids: &[CellId]) {
        self.selected = ids.to_vec();
    }

    fn scroll_into_view(&mut self, _id: CellId) {}

    fn focus(&mut self, _id: CellId) {}

    fn navigate(&mut self, location: &str) {
        self.navigated.push(location.to_string());
    }

    fn set_document_mode(&mut self, mode: DocumentMode) {
        self.mode = Some(mode);
    }

    fn clear(&mut self) {
        self.order.clear();
    }
}

type TestSession = Session<Recorder, Vec<ClientMessage>>;

fn record(cid: i64, body: &str, prev: i64, next: i64) -> CellRecord {
    let link = |raw: i64| (raw >= 0).then_some(CellId(raw));
    CellRecord {
        cid: CellId(cid),
        body: body.to_string(),
        prev: link(prev),
        next: link(next),
    }
}

fn session_with(mode: LoadMode, cells: Vec<CellRecord>) -> TestSession {
    let mut session = Session::new(Recorder::default(), Vec::new());
    session.handle_message(ServerMessage::Load { mode, cells });
    session
}

/// `[1:"a", 2:"b", 3:"c", 4:"d"]`
fn four() -> TestSession {
    session_with(
        LoadMode::Full,
        vec![
            record(1, "a", -1, 2),
            record(2, "b", 1, 3),
            record(3, "c", 2, 4),
            record(4, "d", 3, -1),
        ],
    )
}

fn key(c: &str) -> KeyEvent {
    KeyEvent::plain(Key::character(c))
}

fn shift(c: &str) -> KeyEvent {
    KeyEvent::shift(Key::character(c))
}

fn texts(session: &TestSession) -> Vec<String> {
    session.store().iter().map(|c| c.text.clone()).collect()
}

fn saves(session: &TestSession) -> Vec<SaveCell> {
    session
        .sink()
        .iter()
        .filter_map(|m| match m {
            ClientMessage::Save(save) => Some(save.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn readonly_load_locks_and_activates_first_in_link_order() {
    let session = session_with(
        LoadMode::ReadOnly,
        vec![record(2, "b", 1, -1), record(7, "c", -1, 1), record(1, "a", 7, 2)],
    );
    assert_eq!(session.mode(), DocumentMode::Locked);
    assert_eq!(session.active(), Some(CellId(7)));
    assert_eq!(session.display().active, Some(CellId(7)));
    assert_eq!(session.display().order, vec![CellId(7), CellId(1), CellId(2)]);
    assert_eq!(session.display().mode, Some(DocumentMode::Locked));
}

#[test]
fn locked_document_ignores_mutating_keys() {
    let mut session = session_with(LoadMode::ReadOnly, vec![record(0, "a", -1, 1), record(1, "b", 0, -1)]);
    assert_eq!(session.handle_key(&key("o")), KeydownResult::NotHandled);
    assert_eq!(session.handle_key(&key("w")), KeydownResult::NotHandled);
    assert_eq!(session.handle_key(&shift("x")), KeydownResult::NotHandled);
    assert!(!session.toggle_editing());
    assert_eq!(session.store().len(), 2);
    assert!(session.sink().is_empty());

    assert_eq!(
        session.handle_key(&KeyEvent::plain(Key::ArrowDown)),
        KeydownResult::Handled
    );
    assert_eq!(session.active(), Some(CellId(1)));
}

#[test]
fn exactly_one_active_cell_through_an_editing_run() {
    let mut session = four();
    let script = [
        KeyEvent::plain(Key::ArrowDown),
        key("o"),
        KeyEvent::plain(Key::Escape),
        shift("x"),
        KeyEvent::plain(Key::ArrowUp),
        shift("v"),
        key("w"),
        KeyEvent::shift(Key::Enter),
        KeyEvent::plain(Key::Backspace),
    ];
    for event in &script {
        session.input(event);
        let active = session.active().expect("loaded, non-empty document has an active cell");
        assert!(session.store().contains(active));
        assert_eq!(session.display().active, Some(active));

        let editing: Vec<_> = session.store().iter().filter(|c| c.is_editing()).collect();
        assert!(editing.len() <= 1);
        if let Some(cell) = editing.first() {
            assert_eq!(cell.id, active);
        }
        session.store().validate().unwrap();
    }
}

#[test]
fn insert_after_splices_and_announces() {
    let mut session = session_with(LoadMode::Full, vec![record(1, "a", -1, 2), record(2, "b", 1, -1)]);
    session.handle_key(&key("o"));

    let store = session.store();
    assert_eq!(store.ids(), vec![CellId(1), CellId(3), CellId(2)]);
    assert_eq!(store.prev_of(CellId(2)), Some(CellId(3)));
    assert_eq!(
        session.sink().as_slice(),
        [ClientMessage::Create(CreateCell {
            newid: CellId(3),
            prev: Some(CellId(1)),
            next: Some(CellId(2)),
        })]
    );
    assert_eq!(session.display().order, vec![CellId(1), CellId(3), CellId(2)]);
    assert!(session.is_modified());
}

#[test]
fn copy_then_paste_duplicates_in_order() {
    let mut session = four();
    session.handle_key(&KeyEvent::shift(Key::ArrowDown));
    session.handle_key(&KeyEvent::shift(Key::ArrowDown));
    assert_eq!(session.display().selected, vec![CellId(1), CellId(2), CellId(3)]);

    session.handle_key(&shift("c"));
    assert_eq!(session.clipboard().entries(), ["a", "b", "c"]);

    session.handle_key(&KeyEvent::plain(Key::ArrowDown));
    session.handle_key(&shift("v"));

    assert_eq!(texts(&session), ["a", "b", "c", "d", "a", "b", "c"]);
    let ids = session.store().ids();
    assert_eq!(&ids[4..], [CellId(5), CellId(6), CellId(7)]);
    assert_eq!(session.active(), Some(CellId(7)));
    assert_eq!(session.display().selected, vec![CellId(7)]);

    let saved: Vec<_> = saves(&session).into_iter().map(|s| (s.cid, s.body)).collect();
    assert_eq!(
        saved,
        [
            (CellId(5), "a".to_string()),
            (CellId(6), "b".to_string()),
            (CellId(7), "c".to_string()),
        ]
    );
}

#[test]
fn cut_activates_successor() {
    let mut session = four();
    session.handle_key(&KeyEvent::plain(Key::ArrowDown));
    session.handle_key(&KeyEvent::shift(Key::ArrowDown));
    session.handle_key(&shift("x"));

    assert_eq!(texts(&session), ["a", "d"]);
    assert_eq!(session.active(), Some(CellId(4)));
    assert_eq!(session.clipboard().entries(), ["b", "c"]);

    let deletes: Vec<_> = session
        .sink()
        .iter()
        .filter_map(|m| match m {
            ClientMessage::Delete(d) => Some(d.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(
        deletes,
        [
            DeleteCell {
                cid: CellId(2),
                prev: Some(CellId(1)),
                next: Some(CellId(3)),
            },
            DeleteCell {
                cid: CellId(3),
                prev: Some(CellId(1)),
                next: Some(CellId(4)),
            },
        ]
    );
}

#[test]
fn cut_at_tail_activates_predecessor() {
    let mut session = four();
    for _ in 0..3 {
        session.handle_key(&KeyEvent::plain(Key::ArrowDown));
    }
    session.handle_key(&KeyEvent::shift(Key::ArrowUp));
    session.handle_key(&shift("d"));

    assert_eq!(texts(&session), ["a", "b"]);
    assert_eq!(session.active(), Some(CellId(2)));
    assert!(session.clipboard().is_empty());
}

#[test]
fn cutting_everything_leaves_no_active_cell() {
    let mut session = four();
    for _ in 0..3 {
        session.handle_key(&KeyEvent::shift(Key::ArrowDown));
    }
    session.handle_key(&shift("x"));

    assert!(session.store().is_empty());
    assert_eq!(session.active(), None);
    assert_eq!(session.display().active, None);
    assert!(session.display().order.is_empty());

    // Pasting into the empty document rebuilds it from the head.
    session.handle_key(&shift("v"));
    assert_eq!(texts(&session), ["a", "b", "c", "d"]);
    assert_eq!(session.store().prev_of(session.store().ids()[0]), None);
    session.store().validate().unwrap();
}

#[test]
fn modified_freeze_saves_exactly_once() {
    let mut session = four();
    session.input(&key("w"));
    session.input(&key("!"));
    session.input(&KeyEvent::plain(Key::Escape));
    session.input(&KeyEvent::plain(Key::Escape));

    assert_eq!(
        saves(&session),
        [SaveCell {
            cid: CellId(1),
            body: "a!".into(),
        }]
    );
    assert!(session
        .display()
        .rendered
        .contains(&(CellId(1), "a!".to_string())));

    // Reopening and closing without typing sends nothing further.
    session.input(&key("w"));
    session.input(&KeyEvent::plain(Key::Escape));
    assert_eq!(saves(&session).len(), 1);
}

#[test]
fn unmodified_freeze_sends_nothing() {
    let mut session = four();
    session.input(&key("w"));
    session.input(&KeyEvent::plain(Key::ArrowLeft));
    session.input(&KeyEvent::plain(Key::Escape));
    assert!(session.sink().is_empty());
}

#[test]
fn serve_redirect_only_navigates() {
    let mut session = four();
    session.handle_frame(r#"{"cmd": "serve", "content": "doc.html"}"#);
    assert_eq!(session.display().navigated, ["doc.html"]);
    assert_eq!(session.store().len(), 4);
}

#[test]
fn malformed_frames_change_nothing() {
    let mut session = four();
    session.handle_frame(r#"{"content": []}"#);
    session.handle_frame(r#"{"cmd": "fetch", "content": {"cid": 1}}"#);
    session.handle_frame("]");
    assert_eq!(texts(&session), ["a", "b", "c", "d"]);
    assert_eq!(session.active(), Some(CellId(1)));
}
