//! Glossgraph property-graph store.
//!
//! A compact in-memory graph tailored to interlinear corpora. The store is a
//! *capability*, not a database product: it exposes exactly the primitives the
//! engines above it consume:
//!
//! 1. **Idempotent node merge**: nodes are keyed by `(label, external id)`;
//!    re-merging refreshes mutable properties and `updated_at` but never
//!    duplicates the node, and `created_at` is set exactly once.
//! 2. **Idempotent relationship merge**: edges are keyed by
//!    `(source, kind, target, order)`, mirroring property-equality `MERGE`
//!    semantics.
//! 3. **Pattern queries**: label membership (bitmaps), exact and substring
//!    property matching, forward/backward adjacency by edge kind.
//!
//! Internals follow the usual compact-graph recipe:
//! - **String interning**: property keys/values and external ids stored once,
//!   referenced by u32 id.
//! - **Columnar node storage**: one column per property key.
//! - **Bitmap indexes**: label membership as Roaring bitmaps for cheap joins.
//! - **Edge-list with indexes**: `(node, kind)` → edge ids in both directions.
//!
//! The `(label, external id)` uniqueness index doubles as the storage-level
//! constraint that makes "merge the same text twice" safe: there is no window
//! in which two merges of the same id can both observe absence, because a
//! merge is a single `&mut self` operation.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};

// ============================================================================
// String Interning
// ============================================================================

/// Interned string id (4 bytes instead of 24+ for `String`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct StrId(u32);

impl StrId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// String interner: maps strings to compact ids and back.
#[derive(Debug)]
pub struct Interner {
    str_to_id: DashMap<String, StrId>,
    id_to_str: DashMap<StrId, String>,
    next_id: AtomicU32,
}

impl Interner {
    pub fn new() -> Self {
        Self {
            str_to_id: DashMap::new(),
            id_to_str: DashMap::new(),
            next_id: AtomicU32::new(0),
        }
    }

    pub fn intern(&self, s: &str) -> StrId {
        if let Some(id) = self.str_to_id.get(s) {
            return *id;
        }
        let id = StrId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.str_to_id.insert(s.to_string(), id);
        self.id_to_str.insert(id, s.to_string());
        id
    }

    /// Look up an existing id without inserting.
    pub fn id_of(&self, s: &str) -> Option<StrId> {
        self.str_to_id.get(s).map(|id| *id)
    }

    pub fn lookup(&self, id: StrId) -> Option<String> {
        self.id_to_str.get(&id).map(|s| s.clone())
    }

    fn snapshot_strings(&self) -> Vec<String> {
        (0..self.next_id.load(Ordering::SeqCst))
            .filter_map(|i| self.id_to_str.get(&StrId(i)).map(|s| s.clone()))
            .collect()
    }

    fn from_strings(strings: Vec<String>) -> Self {
        let interner = Self::new();
        for s in strings {
            interner.intern(&s);
        }
        interner
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Labels and edge kinds
// ============================================================================

/// Closed node-label set of the corpus schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeLabel {
    Text,
    Section,
    Phrase,
    Word,
    Morpheme,
    Gloss,
}

impl NodeLabel {
    pub const ALL: [NodeLabel; 6] = [
        NodeLabel::Text,
        NodeLabel::Section,
        NodeLabel::Phrase,
        NodeLabel::Word,
        NodeLabel::Morpheme,
        NodeLabel::Gloss,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeLabel::Text => "Text",
            NodeLabel::Section => "Section",
            NodeLabel::Phrase => "Phrase",
            NodeLabel::Word => "Word",
            NodeLabel::Morpheme => "Morpheme",
            NodeLabel::Gloss => "Gloss",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "Text" => Some(NodeLabel::Text),
            "Section" => Some(NodeLabel::Section),
            "Phrase" => Some(NodeLabel::Phrase),
            "Word" => Some(NodeLabel::Word),
            "Morpheme" => Some(NodeLabel::Morpheme),
            "Gloss" => Some(NodeLabel::Gloss),
            _ => None,
        }
    }
}

impl std::fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed relationship-type set.
///
/// `ComposedOf` is the only kind carrying an `order` value; it is the single
/// place linear word sequence is recorded (node insertion order is not part
/// of the contract).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Ownership: Text→Section, Section→Phrase, Section→Word.
    Has,
    /// Phrase→Word, ordered.
    ComposedOf,
    /// Word→Morpheme.
    MadeOf,
    /// Gloss→Word or Gloss→Morpheme.
    Analyzes,
}

impl EdgeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeKind::Has => "HAS",
            EdgeKind::ComposedOf => "COMPOSED_OF",
            EdgeKind::MadeOf => "MADE_OF",
            EdgeKind::Analyzes => "ANALYZES",
        }
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Node storage (columnar)
// ============================================================================

/// Resolved, owner-friendly view of one node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeView {
    pub node: u32,
    pub label: NodeLabel,
    pub id: String,
    pub props: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct NodeStore {
    labels: Vec<NodeLabel>,
    external_ids: Vec<StrId>,
    created_at: Vec<DateTime<Utc>>,
    updated_at: Vec<DateTime<Utc>>,
    /// Property columns: key → (node → value).
    props: HashMap<StrId, HashMap<u32, StrId>>,
    /// Label membership bitmaps.
    label_index: HashMap<NodeLabel, RoaringBitmap>,
    /// Uniqueness constraint: `(label, external id)` → node.
    id_index: HashMap<(NodeLabel, StrId), u32>,
}

impl NodeStore {
    fn len(&self) -> usize {
        self.labels.len()
    }
}

// ============================================================================
// Edge storage
// ============================================================================

/// A directed, typed relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub kind: EdgeKind,
    pub source: u32,
    pub target: u32,
    /// Position payload; present exactly on [`EdgeKind::ComposedOf`] edges.
    pub order: Option<i64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct EdgeStore {
    edges: Vec<Edge>,
    forward: HashMap<(u32, EdgeKind), Vec<u32>>,
    backward: HashMap<(u32, EdgeKind), Vec<u32>>,
}

impl EdgeStore {
    fn len(&self) -> usize {
        self.edges.len()
    }

    fn merge(&mut self, edge: Edge) -> MergedEdge {
        if let Some(ids) = self.forward.get(&(edge.source, edge.kind)) {
            for &id in ids {
                if self.edges[id as usize] == edge {
                    return MergedEdge {
                        edge: id,
                        created: false,
                    };
                }
            }
        }

        let id = self.edges.len() as u32;
        self.forward
            .entry((edge.source, edge.kind))
            .or_default()
            .push(id);
        self.backward
            .entry((edge.target, edge.kind))
            .or_default()
            .push(id);
        self.edges.push(edge);
        MergedEdge {
            edge: id,
            created: true,
        }
    }
}

/// Result of a node merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergedNode {
    pub node: u32,
    pub created: bool,
}

/// Result of an edge merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergedEdge {
    pub edge: u32,
    pub created: bool,
}

/// Per-label node counts plus the total relationship count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub texts: u64,
    pub sections: u64,
    pub phrases: u64,
    pub words: u64,
    pub morphemes: u64,
    pub glosses: u64,
    pub relationships: u64,
}

// ============================================================================
// GraphStore
// ============================================================================

const SNAPSHOT_MAGIC: &[u8; 4] = b"GLSG";
const SNAPSHOT_VERSION: u32 = 1;

/// The complete corpus graph.
#[derive(Debug)]
pub struct GraphStore {
    interner: Interner,
    nodes: NodeStore,
    edges: EdgeStore,
}

impl GraphStore {
    pub fn new() -> Self {
        Self {
            interner: Interner::new(),
            nodes: NodeStore::default(),
            edges: EdgeStore::default(),
        }
    }

    // ========================================================================
    // Write primitives
    // ========================================================================

    /// Merge a node by `(label, external id)`.
    ///
    /// Creation sets `created_at`; every merge (including the first) refreshes
    /// `updated_at` and applies `props`: `Some(value)` sets the property,
    /// `None` clears it. Properties not mentioned are left untouched.
    pub fn merge_node(
        &mut self,
        label: NodeLabel,
        id: &str,
        props: &[(&str, Option<&str>)],
    ) -> MergedNode {
        let id_sym = self.interner.intern(id);
        let now = Utc::now();

        let (node, created) = match self.nodes.id_index.get(&(label, id_sym)) {
            Some(&node) => (node, false),
            None => {
                let node = self.nodes.len() as u32;
                self.nodes.labels.push(label);
                self.nodes.external_ids.push(id_sym);
                self.nodes.created_at.push(now);
                self.nodes.updated_at.push(now);
                self.nodes.label_index.entry(label).or_default().insert(node);
                self.nodes.id_index.insert((label, id_sym), node);
                (node, true)
            }
        };

        self.nodes.updated_at[node as usize] = now;
        for (key, value) in props {
            let key_sym = self.interner.intern(key);
            match value {
                Some(v) => {
                    let value_sym = self.interner.intern(v);
                    self.nodes
                        .props
                        .entry(key_sym)
                        .or_default()
                        .insert(node, value_sym);
                }
                None => {
                    if let Some(col) = self.nodes.props.get_mut(&key_sym) {
                        col.remove(&node);
                    }
                }
            }
        }

        MergedNode { node, created }
    }

    /// Merge a relationship, idempotent on `(source, kind, target, order)`.
    pub fn merge_edge(
        &mut self,
        source: u32,
        kind: EdgeKind,
        target: u32,
        order: Option<i64>,
    ) -> Result<MergedEdge> {
        let node_count = self.nodes.len() as u32;
        if source >= node_count {
            return Err(anyhow!("unknown source node {source}"));
        }
        if target >= node_count {
            return Err(anyhow!("unknown target node {target}"));
        }
        Ok(self.edges.merge(Edge {
            kind,
            source,
            target,
            order,
        }))
    }

    /// Destructive corpus-wide wipe. Returns the stats of what was deleted.
    pub fn wipe(&mut self) -> GraphStats {
        let stats = self.stats();
        *self = GraphStore::new();
        stats
    }

    // ========================================================================
    // Query primitives
    // ========================================================================

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn label_count(&self, label: NodeLabel) -> u64 {
        self.nodes
            .label_index
            .get(&label)
            .map(|bm| bm.len())
            .unwrap_or(0)
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            texts: self.label_count(NodeLabel::Text),
            sections: self.label_count(NodeLabel::Section),
            phrases: self.label_count(NodeLabel::Phrase),
            words: self.label_count(NodeLabel::Word),
            morphemes: self.label_count(NodeLabel::Morpheme),
            glosses: self.label_count(NodeLabel::Gloss),
            relationships: self.edges.len() as u64,
        }
    }

    /// Nodes carrying `label`, as a bitmap of internal ids.
    pub fn nodes_with_label(&self, label: NodeLabel) -> RoaringBitmap {
        self.nodes
            .label_index
            .get(&label)
            .cloned()
            .unwrap_or_default()
    }

    /// Resolve a node by its external id.
    pub fn node_by_id(&self, label: NodeLabel, id: &str) -> Option<u32> {
        let id_sym = self.interner.id_of(id)?;
        self.nodes.id_index.get(&(label, id_sym)).copied()
    }

    pub fn label_of(&self, node: u32) -> Option<NodeLabel> {
        self.nodes.labels.get(node as usize).copied()
    }

    pub fn external_id(&self, node: u32) -> Option<String> {
        let sym = self.nodes.external_ids.get(node as usize)?;
        self.interner.lookup(*sym)
    }

    pub fn prop(&self, node: u32, key: &str) -> Option<String> {
        let key_sym = self.interner.id_of(key)?;
        let value_sym = self.nodes.props.get(&key_sym)?.get(&node)?;
        self.interner.lookup(*value_sym)
    }

    pub fn created_at(&self, node: u32) -> Option<DateTime<Utc>> {
        self.nodes.created_at.get(node as usize).copied()
    }

    pub fn updated_at(&self, node: u32) -> Option<DateTime<Utc>> {
        self.nodes.updated_at.get(node as usize).copied()
    }

    /// Resolve a node into human-readable strings.
    pub fn node_view(&self, node: u32) -> Option<NodeView> {
        let label = self.label_of(node)?;
        let id = self.external_id(node)?;

        let mut props = BTreeMap::new();
        for (key_sym, col) in &self.nodes.props {
            if let Some(value_sym) = col.get(&node) {
                let (Some(key), Some(value)) = (
                    self.interner.lookup(*key_sym),
                    self.interner.lookup(*value_sym),
                ) else {
                    continue;
                };
                props.insert(key, value);
            }
        }

        Some(NodeView {
            node,
            label,
            id,
            props,
            created_at: self.created_at(node)?,
            updated_at: self.updated_at(node)?,
        })
    }

    /// Nodes of `label` whose property `key` equals `value` exactly.
    pub fn nodes_with_prop_eq(&self, label: NodeLabel, key: &str, value: &str) -> RoaringBitmap {
        let mut out = RoaringBitmap::new();
        let (Some(key_sym), Some(value_sym)) = (self.interner.id_of(key), self.interner.id_of(value))
        else {
            return out;
        };
        let Some(col) = self.nodes.props.get(&key_sym) else {
            return out;
        };
        let members = self.nodes.label_index.get(&label);
        for (&node, &v) in col {
            if v == value_sym && members.map(|bm| bm.contains(node)).unwrap_or(false) {
                out.insert(node);
            }
        }
        out
    }

    /// Nodes of `label` where **any** of the listed properties contains
    /// `needle` as a substring.
    ///
    /// Matching is case-sensitive: concordance search inherits the exact
    /// contract of the interchange data, where case is linguistically
    /// meaningful (e.g. gloss conventions distinguish `pl` from `PL`).
    pub fn nodes_with_prop_containing(
        &self,
        label: NodeLabel,
        keys: &[&str],
        needle: &str,
    ) -> RoaringBitmap {
        let mut out = RoaringBitmap::new();
        if needle.is_empty() {
            return out;
        }
        let Some(members) = self.nodes.label_index.get(&label) else {
            return out;
        };
        for key in keys {
            let Some(key_sym) = self.interner.id_of(key) else {
                continue;
            };
            let Some(col) = self.nodes.props.get(&key_sym) else {
                continue;
            };
            for (&node, &value_sym) in col {
                if !members.contains(node) || out.contains(node) {
                    continue;
                }
                let Some(value) = self.interner.lookup(value_sym) else {
                    continue;
                };
                if value.contains(needle) {
                    out.insert(node);
                }
            }
        }
        out
    }

    /// Outgoing edge ids for `(source, kind)`.
    pub fn outgoing(&self, source: u32, kind: EdgeKind) -> &[u32] {
        self.edges
            .forward
            .get(&(source, kind))
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
    }

    /// Incoming edge ids for `(target, kind)`.
    pub fn incoming(&self, target: u32, kind: EdgeKind) -> &[u32] {
        self.edges
            .backward
            .get(&(target, kind))
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
    }

    pub fn edge(&self, id: u32) -> Option<&Edge> {
        self.edges.edges.get(id as usize)
    }

    /// All edges with their ids, in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (u32, &Edge)> {
        self.edges
            .edges
            .iter()
            .enumerate()
            .map(|(i, e)| (i as u32, e))
    }

    /// Targets reachable from `source` via `kind`.
    pub fn targets(&self, source: u32, kind: EdgeKind) -> RoaringBitmap {
        let mut out = RoaringBitmap::new();
        for &id in self.outgoing(source, kind) {
            out.insert(self.edges.edges[id as usize].target);
        }
        out
    }

    /// Sources reaching `target` via `kind`.
    pub fn sources(&self, target: u32, kind: EdgeKind) -> RoaringBitmap {
        let mut out = RoaringBitmap::new();
        for &id in self.incoming(target, kind) {
            out.insert(self.edges.edges[id as usize].source);
        }
        out
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    /// Serialize to the binary snapshot format (`.glsg`).
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let interner_bytes = bincode::serialize(&self.interner.snapshot_strings())?;
        let graph_bytes = bincode::serialize(&(&self.nodes, &self.edges))?;

        let mut out = Vec::new();
        out.extend_from_slice(SNAPSHOT_MAGIC);
        out.extend_from_slice(&SNAPSHOT_VERSION.to_le_bytes());
        out.extend_from_slice(&(interner_bytes.len() as u64).to_le_bytes());
        out.extend_from_slice(&interner_bytes);
        out.extend_from_slice(&(graph_bytes.len() as u64).to_le_bytes());
        out.extend_from_slice(&graph_bytes);
        Ok(out)
    }

    /// Deserialize from the binary snapshot format.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 8 || &bytes[0..4] != SNAPSHOT_MAGIC {
            return Err(anyhow!("not a glossgraph snapshot"));
        }
        let version = u32::from_le_bytes(bytes[4..8].try_into()?);
        if version != SNAPSHOT_VERSION {
            return Err(anyhow!("unsupported snapshot version: {version}"));
        }

        let mut offset = 8usize;
        let read_len = |bytes: &[u8], offset: &mut usize| -> Result<usize> {
            let end = *offset + 8;
            if bytes.len() < end {
                return Err(anyhow!("truncated snapshot"));
            }
            let len = u64::from_le_bytes(bytes[*offset..end].try_into()?) as usize;
            *offset = end;
            Ok(len)
        };

        let interner_len = read_len(bytes, &mut offset)?;
        if bytes.len() < offset + interner_len {
            return Err(anyhow!("truncated snapshot"));
        }
        let strings: Vec<String> = bincode::deserialize(&bytes[offset..offset + interner_len])?;
        offset += interner_len;

        let graph_len = read_len(bytes, &mut offset)?;
        if bytes.len() < offset + graph_len {
            return Err(anyhow!("truncated snapshot"));
        }
        let (nodes, edges): (NodeStore, EdgeStore) =
            bincode::deserialize(&bytes[offset..offset + graph_len])?;

        Ok(Self {
            interner: Interner::from_strings(strings),
            nodes,
            edges,
        })
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}
