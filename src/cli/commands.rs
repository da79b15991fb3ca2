//! Command dispatch

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use clap::CommandFactory;
use tracing::{debug, instrument};

use crate::application::services::{EditorSession, Payload};
use crate::application::ApplicationResult;
use crate::cli::args::{Cli, Commands, ConfigCommands, EditTarget};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Options, Settings};
use crate::domain::{Graph, NodeId, TreeNodeConvert};
use crate::infrastructure::{ServiceContainer, CAPABILITIES};

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Ok(());
    };
    if let Commands::Completion { shell } = command {
        return _completion(*shell);
    }
    let container = ServiceContainer::new(Settings::load()?);
    execute_with(&container, command)
}

/// Runs `command` against the services of `container`.
pub fn execute_with(container: &ServiceContainer, command: &Commands) -> CliResult<()> {
    match command {
        Commands::New { file, id } => _new(container, file, id),
        Commands::Show { file } => _show(container, file),
        Commands::Add {
            target,
            parent,
            id,
            data,
        } => _add(container, target, parent, id, data.as_deref()),
        Commands::Rename { target, key, id } => edit(container, target, |session| {
            let node = session.resolve(key)?;
            session.rename(node, id)?;
            Ok(format!("Renamed '{}' to '{}'", key, id))
        }),
        Commands::Move {
            target,
            key,
            parent,
        } => edit(container, target, |session| {
            let node = session.resolve(key)?;
            let new_parent = session.resolve(parent)?;
            session.move_node(node, new_parent)?;
            Ok(format!("Moved '{}' under '{}'", key, parent))
        }),
        Commands::Remove { target, key } => edit(container, target, |session| {
            let node = session.resolve(key)?;
            let removed = session.remove(node)?;
            Ok(format!("Removed '{}' ({} nodes)", key, removed))
        }),
        Commands::Sort {
            target,
            key,
            recursive,
        } => edit(container, target, |session| {
            let node = match key {
                Some(key) => session.resolve(key)?,
                None => session.root(),
            };
            session.sort(node, *recursive)?;
            Ok(match key {
                Some(key) => format!("Sorted children of '{}'", key),
                None => "Sorted children of the root".to_string(),
            })
        }),
        Commands::Set {
            target,
            option,
            value,
        } => edit(container, target, |session| {
            session.set_option(option, value)?;
            Ok(format!("{} = {}", option, value))
        }),
        Commands::Get { file, option } => _get(container, file, option.as_deref()),
        Commands::Layout { file, scale } => _layout(container, file, *scale),
        Commands::Formats => _formats(),
        Commands::Config { command } => _config(container, command),
        Commands::Completion { shell } => _completion(*shell),
    }
}

#[instrument(skip(container))]
fn _new(container: &ServiceContainer, file: &Path, id: &str) -> CliResult<()> {
    container
        .documents()
        .create(file, id, &container.settings.options)?;
    output::success(&format!("Created {}", file.display()));
    Ok(())
}

#[instrument(skip(container))]
fn _show(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let session = EditorSession::open(container.documents().load(file)?)?;
    output::info(&render_tree(&session));
    Ok(())
}

/// Subtree at the session root, labelled with the keys edits resolve.
fn render_tree(session: &EditorSession) -> String {
    let labels = session.labels();
    let tree = session.tree();
    tree.subtree_string(session.root(), &|idx| {
        let key = label_of(&labels, idx);
        match tree.get_node(idx).map(|node| &node.data) {
            Some(data) if !data.is_null() => format!("{}: {}", key, data),
            _ => key,
        }
    })
    .to_string()
}

#[instrument(skip(container))]
fn _add(
    container: &ServiceContainer,
    target: &EditTarget,
    parent: &str,
    id: &str,
    data: Option<&str>,
) -> CliResult<()> {
    let payload = data.map_or(Payload::Null, parse_payload);
    edit(container, target, |session| {
        let parent_node = session.resolve(parent)?;
        session.add_child(parent_node, id, payload)?;
        Ok(format!("Added '{}' under '{}'", id, parent))
    })
}

/// JSON when it parses, else the text itself.
fn parse_payload(text: &str) -> Payload {
    serde_json::from_str(text).unwrap_or_else(|_| Payload::String(text.to_string()))
}

/// Loads the document, applies `action`, prints the frames when asked and
/// saves. Nothing is written when the action fails.
fn edit<F>(container: &ServiceContainer, target: &EditTarget, action: F) -> CliResult<()>
where
    F: FnOnce(&mut EditorSession) -> ApplicationResult<String>,
{
    let documents = container.documents();
    let mut session = EditorSession::open(documents.load(&target.file)?)?;
    let before = session.labels();
    let message = action(&mut session)?;
    debug!("Edit applied: {}", message);

    if target.frames {
        let labels = frame_labels(before, &session);
        let frames = session.frames(container.settings.animation_steps);
        let total = frames.len();
        for (i, frame) in frames.iter().enumerate() {
            output::header(&format!("frame {}/{}", i + 1, total));
            print_positions(frame, &labels);
        }
    }

    documents.save(
        &target.file,
        session.tree(),
        session.root(),
        session.options(),
    )?;
    output::success(&message);
    Ok(())
}

#[instrument(skip(container))]
fn _get(container: &ServiceContainer, file: &Path, option: Option<&str>) -> CliResult<()> {
    let doc = container.documents().load(file)?;
    match option {
        Some(key) => output::info(&doc.options.get(key)?),
        None => {
            for key in Options::KEYS {
                output::info(&format!("{} = {}", key, doc.options.get(key)?));
            }
        }
    }
    Ok(())
}

#[instrument(skip(container))]
fn _layout(container: &ServiceContainer, file: &Path, scale: Option<f64>) -> CliResult<()> {
    let session = EditorSession::open(container.documents().load(file)?)?;
    let graph = match scale {
        Some(factor) if !(factor.is_finite() && factor > 0.0) => {
            return Err(CliError::InvalidArgs(format!(
                "scale must be a positive number, got {}",
                factor
            )));
        }
        Some(factor) => session.graph().scale(factor),
        None => session.graph().clone(),
    };
    let labels = session.labels();

    output::header(&format!(
        "{:.2} x {:.2} px, radius {}, padding {}",
        graph.width(),
        graph.height(),
        graph.radius(),
        graph.padding()
    ));
    print_positions(&graph, &labels);
    for placed in graph.iter() {
        let (Some(start), Some(end), Some(arrow)) = (
            graph.line_start(placed.node),
            graph.line_end(placed.node),
            graph.arrow_points(placed.node),
        ) else {
            continue;
        };
        output::detail(&format!(
            "{}: line ({:.2}, {:.2}) -> ({:.2}, {:.2}), arrow ({:.2}, {:.2}) ({:.2}, {:.2}) ({:.2}, {:.2})",
            label_of(&labels, placed.node),
            start.x,
            start.y,
            end.x,
            end.y,
            arrow[0].x,
            arrow[0].y,
            arrow[1].x,
            arrow[1].y,
            arrow[2].x,
            arrow[2].y,
        ));
    }
    Ok(())
}

/// Keys after the edit, plus the keys of nodes the edit removed.
fn frame_labels(
    before: BTreeMap<NodeId, String>,
    session: &EditorSession,
) -> BTreeMap<NodeId, String> {
    let mut labels = before;
    labels.extend(session.labels());
    labels
}

fn print_positions(graph: &Graph, labels: &BTreeMap<NodeId, String>) {
    for line in position_lines(graph, labels) {
        output::detail(&line);
    }
}

fn position_lines(graph: &Graph, labels: &BTreeMap<NodeId, String>) -> Vec<String> {
    graph
        .iter()
        .map(|placed| {
            let label = label_of(labels, placed.node);
            match placed.pos {
                Some(pos) => format!("{}: ({:.2}, {:.2})", label, pos.x, pos.y),
                None => format!("{}: -", label),
            }
        })
        .collect()
}

fn label_of(labels: &BTreeMap<NodeId, String>, node: NodeId) -> String {
    labels
        .get(&node)
        .cloned()
        .unwrap_or_else(|| node.to_string())
}

fn _formats() -> CliResult<()> {
    output::header("Export formats");
    for capability in CAPABILITIES {
        if capability.available {
            output::success_detail(&capability.format);
        } else {
            output::failure(&format!("{} (no renderer available)", capability.format));
        }
    }
    Ok(())
}

fn _config(container: &ServiceContainer, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&container.settings.to_toml()?),
        ConfigCommands::Path => match global_config_path() {
            Some(path) => output::info(&path.display()),
            None => output::info("no config directory on this platform"),
        },
    }
    Ok(())
}

fn _completion(shell: clap_complete::Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TreeArena;

    /// root -> [b -> [x = 1], a -> [x = 2]], so sorting changes which x keeps the bare key.
    fn unsorted_session(sort: bool) -> EditorSession {
        let mut tree = TreeArena::new();
        let root = tree.insert_node("root", Payload::Null, None).unwrap();
        let b = tree.insert_node("b", Payload::Null, Some(root)).unwrap();
        let a = tree.insert_node("a", Payload::Null, Some(root)).unwrap();
        tree.insert_node("x", Payload::from(1), Some(b)).unwrap();
        tree.insert_node("x", Payload::from(2), Some(a)).unwrap();
        let mut options = Options::default();
        options.tree.sort = sort;
        EditorSession::new(tree, root, options).unwrap()
    }

    #[test]
    fn test_render_tree_uses_keys_of_sorted_session() {
        let session = unsorted_session(true);

        let rendered = render_tree(&session);

        let bare = session.resolve("x").unwrap();
        assert_eq!(session.tree().node(bare).unwrap().data, Payload::from(2));
        assert!(rendered.contains("x: 2"), "{}", rendered);
        assert!(rendered.contains("x {{{0}}}: 1"), "{}", rendered);
    }

    #[test]
    fn test_render_tree_keeps_document_order_without_sort() {
        let rendered = render_tree(&unsorted_session(false));

        assert!(rendered.contains("x: 1"), "{}", rendered);
        assert!(rendered.contains("x {{{0}}}: 2"), "{}", rendered);
    }

    #[test]
    fn test_frames_label_removed_nodes_by_their_old_keys() {
        let mut session = unsorted_session(false);
        let before = session.labels();
        let b = session.resolve("b").unwrap();
        session.remove(b).unwrap();

        let labels = frame_labels(before, &session);
        let frames = session.frames(3);

        let first = position_lines(&frames[0], &labels);
        assert!(first.iter().any(|line| line.starts_with("b: ")), "{:?}", first);
        assert!(first.iter().any(|line| line.starts_with("x: ")), "{:?}", first);
        for frame in &frames {
            for line in position_lines(frame, &labels) {
                assert!(!line.starts_with('#'), "unlabelled node: {}", line);
            }
        }
    }

    #[test]
    fn test_parse_payload_falls_back_to_text() {
        assert_eq!(parse_payload("3"), serde_json::json!(3));
        assert_eq!(parse_payload(r#"{"a": 1}"#), serde_json::json!({"a": 1}));
        assert_eq!(parse_payload("plain words"), serde_json::json!("plain words"));
    }
}
