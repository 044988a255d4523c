use crate::controls::Control;
use crate::editor::Editor;
use crate::export::Exporter;
use crate::fonts::FontBundle;
use crate::rendering::html::HtmlOptions;
use crate::rendering::VisualTree;
use crate::state::DesignState;
use crate::suggest::SuggestionClient;
use crate::{CanvasConfig, Error, Result};
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

enum Command {
    Apply(Control, oneshot::Sender<VisualTree>),
    SetState(DesignState, oneshot::Sender<VisualTree>),
    State(oneshot::Sender<DesignState>),
    Tree(oneshot::Sender<VisualTree>),
    Suggestions(oneshot::Sender<SuggestionView>),
    BeginSuggestions,
    FinishSuggestions(Vec<String>),
    Preview(oneshot::Sender<String>),
    Close(oneshot::Sender<()>),
}

/// What the suggestion widget currently shows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SuggestionView {
    pub items: Vec<String>,
    pub loading: bool,
}

/// An async-friendly editor backed by a dedicated worker thread.
///
/// The worker owns the [`Editor`]; every read and write is a command on its
/// channel, so edits are applied one at a time in arrival order. Suggestion
/// requests and exports run as detached tokio tasks and report back through
/// the same channel. When several suggestion requests overlap, the list that
/// stays visible is the one whose response arrived last.
#[derive(Clone)]
pub struct EditorHandle {
    cmd_tx: Sender<Command>,
    suggester: Arc<SuggestionClient>,
    exporter: Exporter,
}

impl EditorHandle {
    /// Spawn the worker thread with `state` as the initial design.
    pub fn new(state: DesignState, config: CanvasConfig, fonts: FontBundle) -> Result<Self> {
        let suggester = Arc::new(SuggestionClient::from_config(&config)?);
        let exporter = Exporter::new(config.clone(), &fonts)?;

        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        thread::spawn(move || {
            let mut editor = Editor::new(state);
            let font_css = fonts.css;
            let opts = HtmlOptions {
                css_policy: config.css_policy,
                font_css: (!font_css.is_empty()).then_some(font_css.as_str()),
                size: Some((config.viewport.width, config.viewport.height)),
            };

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::Apply(control, resp) => {
                        let _ = resp.send(editor.apply(control).clone());
                    }
                    Command::SetState(state, resp) => {
                        let _ = resp.send(editor.set_state(state).clone());
                    }
                    Command::State(resp) => {
                        let _ = resp.send(editor.state().clone());
                    }
                    Command::Tree(resp) => {
                        let _ = resp.send(editor.tree().clone());
                    }
                    Command::Suggestions(resp) => {
                        let _ = resp.send(SuggestionView {
                            items: editor.panel().suggestions().to_vec(),
                            loading: editor.panel().is_loading(),
                        });
                    }
                    Command::BeginSuggestions => editor.begin_suggestions(),
                    Command::FinishSuggestions(list) => editor.finish_suggestions(list),
                    Command::Preview(resp) => {
                        let _ = resp.send(editor.preview_html(&opts));
                    }
                    Command::Close(resp) => {
                        let _ = resp.send(());
                        break;
                    }
                }
            }
            log::debug!("editor worker stopped");
        });

        Ok(Self { cmd_tx, suggester, exporter })
    }

    async fn call<T>(&self, what: &str, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .map_err(|_| Error::Other(format!("{}: editor worker is gone", what)))?;
        rx.await.map_err(|e| Error::Other(format!("{} canceled: {}", what, e)))
    }

    /// Apply one input event; returns the re-rendered composition.
    pub async fn apply(&self, control: Control) -> Result<VisualTree> {
        self.call("Apply", |tx| Command::Apply(control, tx)).await
    }

    pub async fn set_state(&self, state: DesignState) -> Result<VisualTree> {
        self.call("SetState", |tx| Command::SetState(state, tx)).await
    }

    pub async fn state(&self) -> Result<DesignState> {
        self.call("State", Command::State).await
    }

    pub async fn tree(&self) -> Result<VisualTree> {
        self.call("Tree", Command::Tree).await
    }

    pub async fn suggestions(&self) -> Result<SuggestionView> {
        self.call("Suggestions", Command::Suggestions).await
    }

    /// Live preview document of the current composition.
    pub async fn preview_html(&self) -> Result<String> {
        self.call("Preview", Command::Preview).await
    }

    /// Start a suggestion request for `topic` without waiting for it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn request_suggestions(&self, topic: &str) -> JoinHandle<()> {
        let _ = self.cmd_tx.send(Command::BeginSuggestions);
        let cmd_tx = self.cmd_tx.clone();
        let client = self.suggester.clone();
        let topic = topic.to_string();
        tokio::spawn(async move {
            let list = client.suggest(&topic).await;
            if cmd_tx.send(Command::FinishSuggestions(list)).is_err() {
                log::debug!("suggestions for '{}' arrived after the editor closed", topic);
            }
        })
    }

    /// Export the composition on screen now into `dir`, without waiting.
    /// The task yields the written path, or `None` if the export failed.
    ///
    /// Must be called from within a tokio runtime.
    pub fn export(&self, dir: PathBuf) -> JoinHandle<Option<PathBuf>> {
        let (tx, rx) = oneshot::channel();
        let sent = self.cmd_tx.send(Command::Tree(tx)).is_ok();
        let exporter = self.exporter.clone();
        tokio::spawn(async move {
            let tree = match (sent, rx.await) {
                (true, Ok(tree)) => tree,
                _ => {
                    log::error!("Failed to export image: editor worker is gone");
                    return None;
                }
            };
            exporter.export_to_dir(&tree, &dir).await
        })
    }

    /// Stop the worker thread.
    pub async fn close(self) -> Result<()> {
        self.call("Close", Command::Close).await
    }
}
