// SPDX-License-Identifier: MIT OR Apache-2.0
//! JSON graph documents: import and export.
//!
//! A document is a map from node type key to an ordered list of node
//! specs. Position metadata is round-tripped but never interpreted.
//!
//! Import runs in two passes so cable entries may reference nodes that
//! appear later in the same document. It is *not* transactional: a
//! failure partway through leaves previously created nodes and cables
//! live.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::engine::Engine;
use crate::error::GraphError;
use crate::node::NodeId;
use crate::port::PortRef;
use crate::types::Value;

/// A parsed graph document: node type key -> ordered node specs.
pub type GraphDoc = IndexMap<String, Vec<NodeSpec>>;

/// One node entry in a graph document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Document-unique integer id
    pub i: u32,
    /// Position metadata (opaque to the runtime)
    pub x: f32,
    /// Position metadata (opaque to the runtime)
    pub y: f32,
    /// Persisted interface data fields
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub data: IndexMap<String, serde_json::Value>,
    /// Output port name -> cable targets, in creation order
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub outputs: IndexMap<String, Vec<CableSpec>>,
}

/// One cable target in a node spec's `outputs` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CableSpec {
    /// Document id of the target node
    pub i: u32,
    /// Target input port name
    pub name: String,
}

impl Engine {
    /// Import a JSON graph document, creating live nodes, interfaces and
    /// cables. Returns the created node ids in document order.
    ///
    /// Not transactional: on error, nodes and cables created so far stay
    /// in the graph.
    pub fn import_json(&mut self, json: &str) -> Result<Vec<NodeId>, GraphError> {
        let doc: GraphDoc = serde_json::from_str(json)?;
        self.import_doc(&doc)
    }

    /// Import an already-parsed graph document. See [`Self::import_json`].
    pub fn import_doc(&mut self, doc: &GraphDoc) -> Result<Vec<NodeId>, GraphError> {
        let mut by_doc_id: IndexMap<u32, NodeId> = IndexMap::new();
        let mut created = Vec::new();

        // Pass 1: instantiate nodes and replay persisted data.
        for (type_key, specs) in doc {
            for spec in specs {
                let id = self.create_node(type_key)?;
                {
                    let node = self.node_mut(id)?;
                    node.position = [spec.x, spec.y];
                    node.doc_id = Some(spec.i);
                }
                by_doc_id.insert(spec.i, id);
                created.push(id);

                if !spec.data.is_empty() {
                    self.set_importing(id, true)?;
                    let replay = self.replay_data(id, &spec.data);
                    self.set_importing(id, false)?;
                    replay?;
                    let behavior = self.behavior_of(id)?;
                    behavior.imported(&mut crate::engine::NodeScope::new(self, id))?;
                }
                tracing::debug!(%type_key, doc_id = spec.i, node = %id, "node imported");
            }
        }

        // Pass 2: resolve cable entries, allowing forward references.
        for (_, specs) in doc {
            for spec in specs {
                let source = by_doc_id[&spec.i];
                for (port_name, targets) in &spec.outputs {
                    for target in targets {
                        let target_node = *by_doc_id.get(&target.i).ok_or_else(|| {
                            GraphError::DanglingCableReference {
                                id: target.i,
                                port: target.name.clone(),
                            }
                        })?;
                        self.connect(
                            PortRef::output(source, port_name),
                            PortRef::input(target_node, &target.name),
                        )
                        .map_err(|err| match err {
                            GraphError::UnknownPort { name, .. } => {
                                GraphError::DanglingCableReference {
                                    id: target.i,
                                    port: name,
                                }
                            }
                            other => other,
                        })?;
                    }
                }
            }
        }

        tracing::debug!(nodes = created.len(), "document imported");
        Ok(created)
    }

    fn replay_data(
        &mut self,
        node: NodeId,
        data: &IndexMap<String, serde_json::Value>,
    ) -> Result<(), GraphError> {
        for (field, literal) in data {
            let value = Value::from_json(literal)?;
            self.data_set(node, field, value)?;
        }
        Ok(())
    }

    /// Export the live graph as a document.
    ///
    /// Document ids assigned by a previous import are preserved; nodes
    /// created outside an import get fresh ids. Persisted data is read
    /// back through the interfaces' bound accessors.
    pub fn export_doc(&self) -> Result<GraphDoc, GraphError> {
        let mut next_id = self
            .nodes()
            .filter_map(|n| n.doc_id())
            .max()
            .map_or(0, |max| max + 1);
        let mut assigned: IndexMap<NodeId, u32> = IndexMap::new();
        for node in self.nodes() {
            let id = node.doc_id().unwrap_or_else(|| {
                let id = next_id;
                next_id += 1;
                id
            });
            assigned.insert(node.id(), id);
        }

        let mut doc = GraphDoc::new();
        for node in self.nodes() {
            let mut data = IndexMap::new();
            for field in node.iface().data_fields() {
                data.insert(field.to_string(), self.data_get(node.id(), field)?.to_json());
            }

            let mut outputs: IndexMap<String, Vec<CableSpec>> = IndexMap::new();
            for port in node.outputs() {
                let mut targets = Vec::new();
                for cable_id in port.cables() {
                    let cable = self
                        .cable(*cable_id)
                        .ok_or(GraphError::CableNotFound(*cable_id))?;
                    targets.push(CableSpec {
                        i: assigned[&cable.target.node],
                        name: cable.target.name.clone(),
                    });
                }
                if !targets.is_empty() {
                    outputs.insert(port.name().to_string(), targets);
                }
            }

            let [x, y] = node.position();
            doc.entry(node.type_key().to_string())
                .or_default()
                .push(NodeSpec {
                    i: assigned[&node.id()],
                    x,
                    y,
                    data,
                    outputs,
                });
        }
        Ok(doc)
    }

    /// Export the live graph as a JSON string.
    pub fn export_json(&self) -> Result<String, GraphError> {
        Ok(serde_json::to_string(&self.export_doc()?)?)
    }
}
