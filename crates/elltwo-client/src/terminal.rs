//! Terminal display surface.
//!
//! Keeps a plain view model of what a graphical surface would show and
//! prints it as text after each event.

use std::collections::{BTreeSet, HashMap};
use std::io::{self, Write};

use elltwo_core::{CellId, Display, DocumentMode, EditBuffer, PlainRenderer, Renderer};

#[derive(Debug, Clone, PartialEq, Eq)]
enum View {
    Rendered(String),
    Editor { text: String, caret: usize },
}

pub struct TerminalDisplay<W, R = PlainRenderer> {
    out: W,
    renderer: R,
    order: Vec<CellId>,
    views: HashMap<CellId, View>,
    active: Option<CellId>,
    selected: BTreeSet<CellId>,
    mode: DocumentMode,
    modified: bool,
    redirect: Option<String>,
}

impl<W: Write> TerminalDisplay<W> {
    pub fn new(out: W) -> Self {
        Self::with_renderer(out, PlainRenderer)
    }
}

impl<W: Write, R: Renderer<Output = String>> TerminalDisplay<W, R> {
    pub fn with_renderer(out: W, renderer: R) -> Self {
        Self {
            out,
            renderer,
            order: Vec::new(),
            views: HashMap::new(),
            active: None,
            selected: BTreeSet::new(),
            mode: DocumentMode::default(),
            modified: false,
            redirect: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// The view as text.
    pub fn frame(&self) -> String {
        let mut frame = format!(
            "-- {}{} --\n",
            self.mode.as_str(),
            if self.modified { " [modified]" } else { "" }
        );
        for id in &self.order {
            let active = if self.active == Some(*id) { '>' } else { ' ' };
            let selected = if self.selected.contains(id) { '*' } else { ' ' };
            let body = match self.views.get(id) {
                Some(View::Rendered(text)) => text.clone(),
                Some(View::Editor { text, caret }) => {
                    let split = text
                        .char_indices()
                        .nth(*caret)
                        .map(|(byte, _)| byte)
                        .unwrap_or(text.len());
                    format!("[edit] {}|{}", &text[..split], &text[split..])
                }
                None => String::new(),
            };
            let body = body.replace('\n', "\n         ");
            frame.push_str(&format!("{active}{selected} {:>4}  {body}\n", id.get()));
        }
        if let Some(location) = &self.redirect {
            frame.push_str(&format!("=> {location}\n"));
        }
        frame
    }

    /// Print the current view.
    pub fn draw(&mut self) -> io::Result<()> {
        let frame = self.frame();
        self.out.write_all(frame.as_bytes())?;
        self.out.flush()
    }
}

impl<W: Write, R: Renderer<Output = String>> Display for TerminalDisplay<W, R> {
    fn attach(&mut self, id: CellId, after: Option<CellId>) {
        let at = after
            .and_then(|after| self.order.iter().position(|c| *c == after))
            .map(|ix| ix + 1)
            .unwrap_or(0);
        self.order.insert(at, id);
    }

    fn detach(&mut self, id: CellId) {
        self.order.retain(|c| *c != id);
        self.views.remove(&id);
        self.selected.remove(&id);
    }

    fn render(&mut self, id: CellId, text: &str) {
        self.views
            .insert(id, View::Rendered(self.renderer.render(text)));
    }

    fn show_editor(&mut self, id: CellId, buffer: &EditBuffer) {
        self.views.insert(
            id,
            View::Editor {
                text: buffer.text().to_string(),
                caret: buffer.caret(),
            },
        );
    }

    fn set_active(&mut self, id: Option<CellId>) {
        self.active = id;
    }

    fn set_selected(&mut self, ids: &[CellId]) {
        self.selected = ids.iter().copied().collect();
    }

    fn scroll_into_view(&mut self, _id: CellId) {}

    fn focus(&mut self, _id: CellId) {}

    fn navigate(&mut self, location: &str) {
        self.redirect = Some(location.to_string());
    }

    fn set_document_mode(&mut self, mode: DocumentMode) {
        self.mode = mode;
    }

    fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }

    fn clear(&mut self) {
        self.order.clear();
        self.views.clear();
        self.selected.clear();
        self.active = None;
    }
}
