//! Widget registry - kind name → constructor.
//!
//! Lets a host build a node tree from data. Each constructor receives the
//! kind's props as a JSON value, deserializes them into the matching
//! `*Props` record and calls the factory.
//!
//! ```ignore
//! let spec: NodeSpec = serde_json::from_str(r#"{
//!     "kind": "panel",
//!     "props": {"name": "root", "width": 40, "height": 10,
//!               "layout": {"type": "grid", "rows": ["*"], "columns": ["12", "*"]}},
//!     "children": [
//!         {"kind": "label", "props": {"name": "title", "text": "Tasks"}},
//!         {"kind": "button", "props": {"name": "ok", "label": "OK"}, "layout": {"column": 1}}
//!     ]
//! }"#)?;
//! let root = Registry::with_defaults().build(&mut tree, &spec)?;
//! ```

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{NodeId, UiTree};
use crate::error::{Error, Result};
use crate::layout::LayoutProps;
use crate::primitives::{self, table};

/// Builds one node of a kind from its JSON props.
pub type Constructor = Box<dyn Fn(&mut UiTree, Value) -> Result<NodeId>>;

/// Data description of a node and its children.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSpec {
    pub kind: String,
    pub props: Value,
    /// Constraint used when this node is added to its parent.
    pub layout: LayoutProps,
    pub children: Vec<NodeSpec>,
}

/// Kind name → constructor table.
#[derive(Default)]
pub struct Registry {
    constructors: HashMap<String, Constructor>,
}

/// Deserialize kind props, treating a missing value as all defaults.
fn props<P: DeserializeOwned>(value: Value) -> Result<P> {
    let value = match value {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    Ok(serde_json::from_value(value)?)
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in primitive.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("panel", |tree, v| Ok(primitives::panel(tree, props(v)?)));
        registry.register("label", |tree, v| Ok(primitives::label(tree, props(v)?)));
        registry.register("button", |tree, v| Ok(primitives::button(tree, props(v)?)));
        registry.register("text_input", |tree, v| Ok(primitives::text_input(tree, props(v)?)));
        registry.register("dropdown", |tree, v| Ok(primitives::dropdown(tree, props(v)?)));
        registry.register("data_table", |tree, v| table::data_table(tree, props(v)?));
        registry.register("tree_view", |tree, v| Ok(primitives::tree_view(tree, props(v)?)));
        registry
    }

    /// Add or replace the constructor for `kind`.
    pub fn register<F>(&mut self, kind: impl Into<String>, constructor: F)
    where
        F: Fn(&mut UiTree, Value) -> Result<NodeId> + 'static,
    {
        let kind = kind.into();
        if self.constructors.insert(kind.clone(), Box::new(constructor)).is_some() {
            debug!(kind = %kind, "constructor replaced");
        }
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    /// Registered kind names, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Create a single node.
    pub fn create(&self, tree: &mut UiTree, kind: &str, props: Value) -> Result<NodeId> {
        let constructor = self
            .constructors
            .get(kind)
            .ok_or_else(|| Error::UnknownKind(kind.to_string()))?;
        constructor(tree, props)
    }

    /// Create `spec` and its children, attaching each child with its layout
    /// constraint. On failure nothing built so far stays in the tree.
    pub fn build(&self, tree: &mut UiTree, spec: &NodeSpec) -> Result<NodeId> {
        let id = self.create(tree, &spec.kind, spec.props.clone())?;
        for child in &spec.children {
            if let Err(e) = self.attach(tree, id, child) {
                warn!(kind = %spec.kind, error = %e, "building subtree failed");
                tree.discard(id);
                return Err(e);
            }
        }
        Ok(id)
    }

    fn attach(&self, tree: &mut UiTree, parent: NodeId, child: &NodeSpec) -> Result<()> {
        let child_id = self.build(tree, child)?;
        if let Err(e) = tree.add_child(parent, child_id, child.layout) {
            tree.discard(child_id);
            return Err(e);
        }
        Ok(())
    }
}
