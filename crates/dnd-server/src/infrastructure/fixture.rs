//! Widget fixtures: JSON descriptions of a session's widget tree.
//!
//! The replay tool has no real UI, so the widgets a client talks about are
//! described in a JSON file instead:
//!
//! ```json
//! {
//!   "shells": [{
//!     "id": "w1",
//!     "bounds": { "x": 100, "y": 50, "width": 800, "height": 600 },
//!     "children": [
//!       { "id": "w2", "bounds": { "x": 10, "y": 10, "width": 200, "height": 400 },
//!         "drag_source": { "operations": ["copy", "move"], "transfers": ["text"],
//!                          "payload": { "kind": "text", "value": "hello" } } },
//!       { "id": "w7", "bounds": { "x": 300, "y": 10, "width": 200, "height": 400 },
//!         "drop_target": { "operations": ["copy"], "transfers": ["text"] },
//!         "children": [{ "id": "w8", "item": true }] }
//!     ]
//!   }]
//! }
//! ```
//!
//! Transfers are named `text`, `html`, `url`, `file` or `bytes:<name>:<id>`.
//! Every drag source and drop target gets a logging listener for each event
//! kind.  A `payload` installs a `DragSetData` listener that supplies it,
//! `refuse_start` installs a `DragStart` listener that vetoes the drag, and
//! `force_operation` installs `DragEnter`/`DragOver` listeners that pick that
//! operation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dnd_core::domain::endpoints::{DragSource, DropTarget};
use dnd_core::domain::events::{DragSourceEventKind, DropTargetEventKind};
use dnd_core::domain::operation::Operation;
use dnd_core::domain::transfer::{
    ByteArrayTransfer, FileTransfer, HtmlTransfer, TextTransfer, Transfer, TransferPayload,
    UrlTransfer,
};
use dnd_core::domain::widget::{Rectangle, WidgetError, WidgetId, WidgetTree};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("I/O error reading fixture at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid fixture JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Widget(#[from] WidgetError),

    #[error("unknown transfer: {0}")]
    UnknownTransfer(String),

    #[error("unknown operation: {0}")]
    UnknownOperation(String),
}

// ── Fixture schema ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub shells: Vec<WidgetSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WidgetSpec {
    pub id: String,
    #[serde(default)]
    pub bounds: Rectangle,
    /// Marks a tree or table row.  Items carry no endpoints or children.
    #[serde(default)]
    pub item: bool,
    #[serde(default)]
    pub children: Vec<WidgetSpec>,
    #[serde(default)]
    pub drag_source: Option<DragSourceSpec>,
    #[serde(default)]
    pub drop_target: Option<DropTargetSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DragSourceSpec {
    pub operations: Vec<String>,
    #[serde(default)]
    pub transfers: Vec<String>,
    #[serde(default)]
    pub payload: Option<TransferPayload>,
    #[serde(default)]
    pub refuse_start: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DropTargetSpec {
    pub operations: Vec<String>,
    #[serde(default)]
    pub transfers: Vec<String>,
    #[serde(default)]
    pub force_operation: Option<String>,
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Reads and builds the fixture at `path`.
pub fn load_fixture(path: &Path) -> Result<WidgetTree, FixtureError> {
    let content = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let tree = parse_fixture(&content)?;
    info!(path = %path.display(), widgets = tree.len(), "fixture loaded");
    Ok(tree)
}

/// Builds a widget tree from fixture JSON text.
pub fn parse_fixture(json: &str) -> Result<WidgetTree, FixtureError> {
    let fixture: Fixture = serde_json::from_str(json)?;
    build_tree(&fixture)
}

pub fn build_tree(fixture: &Fixture) -> Result<WidgetTree, FixtureError> {
    let mut tree = WidgetTree::new();
    for shell in &fixture.shells {
        let id = WidgetId::new(shell.id.as_str());
        tree.add_shell(id.clone(), shell.bounds)?;
        for child in &shell.children {
            add_widget(&mut tree, &id, child)?;
        }
    }
    Ok(tree)
}

fn add_widget(
    tree: &mut WidgetTree,
    parent: &WidgetId,
    spec: &WidgetSpec,
) -> Result<(), FixtureError> {
    let id = WidgetId::new(spec.id.as_str());
    if spec.item {
        tree.add_item(id, parent)?;
        return Ok(());
    }

    tree.add_control(id.clone(), parent, spec.bounds)?;
    if let Some(source) = &spec.drag_source {
        tree.set_drag_source(&id, build_drag_source(&id, source)?)?;
    }
    if let Some(target) = &spec.drop_target {
        tree.set_drop_target(&id, build_drop_target(&id, target)?)?;
    }
    for child in &spec.children {
        add_widget(tree, &id, child)?;
    }
    Ok(())
}

fn build_drag_source(id: &WidgetId, spec: &DragSourceSpec) -> Result<DragSource, FixtureError> {
    let mut source = DragSource::new(parse_operations(&spec.operations)?)
        .with_transfers(parse_transfers(&spec.transfers)?);

    for kind in [
        DragSourceEventKind::DragStart,
        DragSourceEventKind::DragSetData,
        DragSourceEventKind::DragFinished,
    ] {
        source.add_listener(kind, |event| {
            info!(
                source = %event.source,
                kind = ?event.kind,
                x = event.x,
                y = event.y,
                detail = %event.detail,
                data_type = ?event.data_type,
                "drag source event"
            );
        });
    }

    if spec.refuse_start {
        source.add_listener(DragSourceEventKind::DragStart, |event| event.doit = false);
    }
    if let Some(payload) = spec.payload.clone() {
        source.add_listener(DragSourceEventKind::DragSetData, move |event| {
            event.data = Some(payload.clone());
        });
    }

    debug!(widget = %id, style = %source.style(), "drag source attached");
    Ok(source)
}

fn build_drop_target(id: &WidgetId, spec: &DropTargetSpec) -> Result<DropTarget, FixtureError> {
    let mut target = DropTarget::new(parse_operations(&spec.operations)?)
        .with_transfers(parse_transfers(&spec.transfers)?);

    for kind in [
        DropTargetEventKind::DragEnter,
        DropTargetEventKind::DragLeave,
        DropTargetEventKind::DragOperationChanged,
        DropTargetEventKind::DragOver,
        DropTargetEventKind::DropAccept,
        DropTargetEventKind::Drop,
    ] {
        target.add_listener(kind, |event| {
            info!(
                drop_target = %event.target,
                kind = ?event.kind,
                x = event.x,
                y = event.y,
                detail = %event.detail,
                item = ?event.item,
                data = ?event.data,
                "drop target event"
            );
        });
    }

    if let Some(name) = &spec.force_operation {
        let forced = parse_operation(name)?;
        for kind in [DropTargetEventKind::DragEnter, DropTargetEventKind::DragOver] {
            target.add_listener(kind, move |event| event.detail = forced);
        }
    }

    debug!(widget = %id, style = %target.style(), "drop target attached");
    Ok(target)
}

// ── Name parsing ──────────────────────────────────────────────────────────────

fn parse_operation(name: &str) -> Result<Operation, FixtureError> {
    match name {
        "none" => Ok(Operation::NONE),
        "all" => Ok(Operation::ALL),
        other => match Operation::from_client_value(Some(other)) {
            op if op.is_none() => Err(FixtureError::UnknownOperation(other.to_string())),
            op => Ok(op),
        },
    }
}

fn parse_operations(names: &[String]) -> Result<Operation, FixtureError> {
    names
        .iter()
        .try_fold(Operation::NONE, |mask, name| Ok(mask | parse_operation(name)?))
}

fn parse_transfer(name: &str) -> Result<Arc<dyn Transfer>, FixtureError> {
    let transfer: Arc<dyn Transfer> = match name {
        "text" => Arc::new(TextTransfer),
        "html" => Arc::new(HtmlTransfer),
        "url" => Arc::new(UrlTransfer),
        "file" => Arc::new(FileTransfer),
        other => {
            let unknown = || FixtureError::UnknownTransfer(other.to_string());
            let mut parts = other.splitn(3, ':');
            match (parts.next(), parts.next(), parts.next()) {
                (Some("bytes"), Some(format), Some(type_id)) => {
                    let type_id = type_id.parse::<i32>().map_err(|_| unknown())?;
                    Arc::new(ByteArrayTransfer::new(format, type_id).ok_or_else(unknown)?)
                }
                _ => return Err(unknown()),
            }
        }
    };
    Ok(transfer)
}

fn parse_transfers(names: &[String]) -> Result<Vec<Arc<dyn Transfer>>, FixtureError> {
    names.iter().map(|name| parse_transfer(name)).collect()
}
