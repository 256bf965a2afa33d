//! Queued mutations and how the render thread applies them
//!
//! An [`Update`] owns retained references to everything it targets. Applying
//! it consumes it, so the references are released right after the mutation;
//! cancelling it just drops it, releasing the same references without
//! touching the graph.

use crate::error::{GlintError, Result};
use crate::graph::{NodeGraph, RemoveOutcome};
use crate::node::{NodeHandle, NodeRef};
use crate::property::{PropertyId, PropertyRef, PropertyValue};

/// One queued mutation of the node graph
#[derive(Debug)]
pub enum Update {
    /// Make a freshly created node visible to the render thread
    Insert(NodeHandle),
    /// Set a property through a typed handle (kind checked at enqueue)
    Set {
        property: PropertyRef,
        value: PropertyValue,
    },
    /// Set a property by raw id; the id is resolved at apply
    SetById {
        node: NodeRef,
        id: PropertyId,
        value: PropertyValue,
    },
    AddChild {
        group: NodeRef,
        child: NodeRef,
    },
    RemoveChild {
        group: NodeRef,
        child: NodeRef,
    },
    SetRoot(Option<NodeRef>),
    /// Mark a node for the next reclamation pass
    Destroy(NodeRef),
}

/// Result of applying an update that did not fail
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Applied {
    Done,
    /// The update named something that does not exist; nothing changed
    Skipped,
}

impl Update {
    /// Short label for logs
    pub fn label(&self) -> &'static str {
        match self {
            Update::Insert(_) => "insert",
            Update::Set { .. } => "set",
            Update::SetById { .. } => "set-by-id",
            Update::AddChild { .. } => "add-child",
            Update::RemoveChild { .. } => "remove-child",
            Update::SetRoot(_) => "set-root",
            Update::Destroy(_) => "destroy",
        }
    }

    /// Apply on the render thread, consuming the update
    ///
    /// With `strict` unset, an unknown property id is logged and skipped;
    /// with it set, it is returned as `UnknownProperty`.
    pub fn apply(self, graph: &mut NodeGraph, strict: bool) -> Result<Applied> {
        match self {
            Update::Insert(handle) => {
                graph.insert(handle);
                Ok(Applied::Done)
            }
            Update::Set { property, value } => {
                graph.set_value_direct(&property, value)?;
                Ok(Applied::Done)
            }
            Update::SetById { node, id, value } => {
                match graph.set_value_by_id(node.id(), id, value) {
                    Ok(_) => Ok(Applied::Done),
                    Err(GlintError::UnknownProperty(id)) if !strict => {
                        tracing::warn!(
                            "Update: {:?} node has no property {}, ignoring",
                            node.kind(),
                            id
                        );
                        Ok(Applied::Skipped)
                    }
                    Err(e) => Err(e),
                }
            }
            Update::AddChild { group, child } => {
                graph.add_child(group.id(), child.handle())?;
                Ok(Applied::Done)
            }
            Update::RemoveChild { group, child } => {
                match graph.remove_child(group.id(), child.id())? {
                    RemoveOutcome::Removed => Ok(Applied::Done),
                    RemoveOutcome::Absent => {
                        tracing::debug!("Update: {:?} not a child of {:?}", child.id(), group.id());
                        Ok(Applied::Skipped)
                    }
                }
            }
            Update::SetRoot(root) => {
                graph.set_root(root.as_deref());
                Ok(Applied::Done)
            }
            Update::Destroy(node) => {
                if graph.request_destroy(node.id()) {
                    Ok(Applied::Done)
                } else {
                    Ok(Applied::Skipped)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeKind, NodeRegistry};
    use crate::schema::ids;

    fn setup() -> (NodeGraph, NodeHandle) {
        let mut graph = NodeGraph::new(NodeRegistry::new());
        let group = graph.registry().create(NodeKind::Group);
        Update::Insert(group.clone()).apply(&mut graph, false).unwrap();
        (graph, group)
    }

    #[test]
    fn test_set_releases_after_apply() {
        let (mut graph, group) = setup();
        let w = group.property(ids::W).unwrap();

        let update = Update::Set {
            property: w.retain(),
            value: 64.0f32.into(),
        };
        assert_eq!(w.retain_count(), 1);
        assert_eq!(update.apply(&mut graph, false), Ok(Applied::Done));
        assert_eq!(w.retain_count(), 0);
        assert_eq!(graph.float(&w), Some(64.0));
    }

    #[test]
    fn test_unknown_id_lenient_and_strict() {
        let (mut graph, group) = setup();

        let lenient = Update::SetById {
            node: group.retain(),
            id: ids::FONT_SIZE,
            value: 12.0f32.into(),
        };
        assert_eq!(lenient.apply(&mut graph, false), Ok(Applied::Skipped));

        let strict = Update::SetById {
            node: group.retain(),
            id: ids::FONT_SIZE,
            value: 12.0f32.into(),
        };
        assert_eq!(
            strict.apply(&mut graph, true),
            Err(GlintError::UnknownProperty(ids::FONT_SIZE))
        );
        assert_eq!(group.retain_count(), 0);
    }

    #[test]
    fn test_add_then_remove_restores_count() {
        let (mut graph, group) = setup();
        let child = graph.registry().create(NodeKind::Rect);
        let before = child.retain_count();

        Update::AddChild {
            group: group.retain(),
            child: child.retain(),
        }
        .apply(&mut graph, false)
        .unwrap();
        assert_eq!(child.retain_count(), before + 1);

        Update::RemoveChild {
            group: group.retain(),
            child: child.retain(),
        }
        .apply(&mut graph, false)
        .unwrap();
        assert_eq!(child.retain_count(), before);
        assert_eq!(graph.node(group.id()).unwrap().children().count(), 0);
    }

    #[test]
    fn test_remove_absent_child_is_noop() {
        let (mut graph, group) = setup();
        let stranger = graph.registry().create(NodeKind::Text);

        let outcome = Update::RemoveChild {
            group: group.retain(),
            child: stranger.retain(),
        }
        .apply(&mut graph, false);
        assert_eq!(outcome, Ok(Applied::Skipped));
        assert_eq!(stranger.retain_count(), 0);
    }

    #[test]
    fn test_duplicate_add_keeps_both() {
        let (mut graph, group) = setup();
        let child = graph.registry().create(NodeKind::Rect);

        for _ in 0..2 {
            Update::AddChild {
                group: group.retain(),
                child: child.retain(),
            }
            .apply(&mut graph, false)
            .unwrap();
        }
        assert_eq!(graph.node(group.id()).unwrap().children().count(), 2);
        assert_eq!(child.retain_count(), 2);
    }

    #[test]
    fn test_set_root_and_destroy() {
        let (mut graph, group) = setup();
        Update::SetRoot(Some(group.retain()))
            .apply(&mut graph, false)
            .unwrap();
        assert_eq!(graph.root(), Some(group.id()));

        Update::Destroy(group.retain()).apply(&mut graph, false).unwrap();
        // Still the root
        assert!(graph.reclaim().is_empty());

        Update::SetRoot(None).apply(&mut graph, false).unwrap();
        assert_eq!(graph.reclaim(), vec![group.id()]);
    }
}
