//! Copy-on-write removal of field paths from schemas.
//!
//! Canonical component schemas are never touched: pruning returns a new tree
//! and expands `$ref` nodes into private copies only along the pruned path.

use grpc_openapi_core::descriptor::FieldPath;
use tracing::warn;

use crate::schema::{Components, Schema};

/// Prunes property paths, resolving references against a component set.
#[derive(Debug, Clone, Copy)]
pub struct Pruner<'a> {
    components: &'a Components,
}

impl<'a> Pruner<'a> {
    /// Pruner resolving `$ref` nodes in `components`.
    #[must_use]
    pub fn new(components: &'a Components) -> Self {
        Self { components }
    }

    /// Remove the property at `path` (proto field names) from `schema`.
    ///
    /// Returns `None` when the removal leaves an object with no properties,
    /// or when `path` is empty. A path that does not exist in `schema`
    /// returns an identical copy; in particular, pruning twice equals
    /// pruning once.
    #[must_use]
    pub fn prune(&self, schema: &Schema, path: &[String]) -> Option<Schema> {
        let (head, rest) = path.split_first()?;

        if let Some(name) = schema.ref_name() {
            let Some(target) = self.components.get(name) else {
                warn!(reference = name, "cannot prune through unknown component");
                return Some(schema.clone());
            };
            return match self.prune(target, path) {
                Some(pruned) if pruned == *target => Some(schema.clone()),
                other => other,
            };
        }

        if !schema.one_of.is_empty() {
            return self.prune_alternatives(schema, path);
        }

        let Some(child) = schema.properties.get(head) else {
            return Some(schema.clone());
        };
        let replacement = if rest.is_empty() {
            None
        } else {
            self.prune(child, rest)
        };
        if replacement.as_ref() == Some(child) {
            return Some(schema.clone());
        }

        let mut pruned = schema.clone();
        match replacement {
            Some(child) => {
                pruned.properties.insert(head.clone(), child);
            }
            None => {
                pruned.properties.remove(head);
                pruned.required.retain(|r| r != head);
            }
        }
        (!pruned.properties.is_empty()).then_some(pruned)
    }

    /// Remove every path in turn.
    #[must_use]
    pub fn prune_all(&self, schema: &Schema, paths: &[FieldPath]) -> Option<Schema> {
        paths.iter().try_fold(schema.clone(), |current, path| {
            self.prune(&current, path.segments())
        })
    }

    fn prune_alternatives(&self, schema: &Schema, path: &[String]) -> Option<Schema> {
        let mut changed = false;
        let mut kept = Vec::with_capacity(schema.one_of.len());
        for alternative in &schema.one_of {
            match self.prune(alternative, path) {
                Some(pruned) => {
                    changed |= pruned != *alternative;
                    kept.push(pruned);
                }
                None => changed = true,
            }
        }
        if !changed {
            return Some(schema.clone());
        }
        match kept.len() {
            0 => None,
            1 => kept.pop(),
            _ => Some(Schema {
                one_of: kept,
                ..schema.clone()
            }),
        }
    }
}
