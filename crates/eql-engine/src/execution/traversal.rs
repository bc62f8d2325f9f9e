//! Per-level traversal cursors.
//!
//! Each `traverse` block of a query becomes one [`TraversalCursor`] owned
//! by its parent (the driver owns the top-level cursors). A cursor holds
//! the `(node, edge)` pairs fetched for the current source node, a position
//! into them, and its nested cursors. Sibling cursors advance like an
//! odometer with the rightmost digit fastest, which yields rows in stable
//! depth-first order.

use crate::execution::condition::eval;
use crate::execution::condition::CondExpr;
use crate::execution::ExecutionContext;
use crate::graph::EdgeData;
use crate::graph::NodeData;
use crate::Error;

#[derive(Debug)]
pub(crate) struct TraversalCursor {
    level: usize,
    spec: String,
    cond: Option<CondExpr>,
    children: Vec<TraversalCursor>,
    nodes: Vec<NodeData>,
    edges: Vec<EdgeData>,
    pos: usize,
}

impl TraversalCursor {
    pub fn new(
        level: usize,
        spec: String,
        cond: Option<CondExpr>,
        children: Vec<TraversalCursor>,
    ) -> Self {
        Self {
            level,
            spec,
            cond,
            children,
            nodes: Vec::new(),
            edges: Vec::new(),
            pos: 0,
        }
    }

    /// Fetch the `(node, edge)` pairs for a new source node, apply this
    /// level's where clause, and make the first pair current (recursively
    /// sourcing all nested cursors).
    ///
    /// A `None` source propagates nil: the level and all its descendants
    /// stay empty. An empty post-filter list raises
    /// [`Error::EmptyTraversal`] unless nil traversal is allowed.
    pub fn set_source(
        &mut self,
        ctx: &mut ExecutionContext<'_>,
        source: Option<&NodeData>,
    ) -> Result<(), Error> {
        self.nodes.clear();
        self.edges.clear();
        self.pos = 0;

        if let Some(source) = source {
            let (nodes, edges) = ctx.graph.traverse_multi(
                &ctx.part,
                source.key(),
                source.kind(),
                &self.spec,
                false,
            )?;

            let node_attrs = &ctx.attrs_nodes[self.level];
            let edge_attrs = &ctx.attrs_edges[self.level];

            for (node, edge) in nodes.into_iter().zip(edges) {
                let node = if node_attrs.is_empty() {
                    node
                } else {
                    ctx.graph
                        .fetch_node_part(&ctx.part, node.key(), node.kind(), node_attrs)?
                        .unwrap_or(node)
                };
                let edge = if edge_attrs.is_empty() {
                    edge
                } else {
                    ctx.graph
                        .fetch_edge_part(&ctx.part, edge.key(), edge.kind(), edge_attrs)?
                        .unwrap_or(edge)
                };

                if let Some(cond) = &self.cond {
                    let env = ctx.env();
                    if !eval(cond, &env, Some(&node), Some(&edge))?.to_bool() {
                        continue;
                    }
                }

                self.nodes.push(node);
                self.edges.push(edge);
            }

            if self.nodes.is_empty() && !ctx.allow_nil {
                return Err(Error::EmptyTraversal);
            }
        }

        self.write_current(ctx)
    }

    /// Write the current pair into the row slots and re-source all nested
    /// cursors from it. Past the end of the list (only reachable with nil
    /// traversal), this level and all descendants are written as nil.
    fn write_current(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), Error> {
        if self.pos < self.nodes.len() {
            let node = self.nodes[self.pos].clone();
            ctx.row_nodes[self.level] = Some(node.clone());
            ctx.row_edges[self.level] = Some(self.edges[self.pos].clone());
            for child in &mut self.children {
                child.set_source(ctx, Some(&node))?;
            }
        } else {
            ctx.row_nodes[self.level] = None;
            ctx.row_edges[self.level] = None;
            for child in &mut self.children {
                child.set_source(ctx, None)?;
            }
        }
        Ok(())
    }

    /// Whether this level or any descendant can still produce another pair
    /// for the current source.
    pub fn has_more(&self) -> bool {
        self.pos + 1 < self.nodes.len() || self.children.iter().any(TraversalCursor::has_more)
    }

    /// Move to the next pair combination. Descendants advance first
    /// (rightmost sibling fastest); once they are exhausted this level's
    /// own cursor moves and the subtree restarts.
    pub fn advance(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<bool, Error> {
        if advance_siblings(&mut self.children, ctx)? {
            return Ok(true);
        }
        if self.pos + 1 < self.nodes.len() {
            self.pos += 1;
            self.write_current(ctx)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Restart this subtree at its first combination.
    pub fn rewind(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), Error> {
        self.pos = 0;
        self.write_current(ctx)
    }
}

/// Odometer step over a sibling list: advance the rightmost sibling that
/// has pairs left and rewind everything to its right.
pub(crate) fn advance_siblings(
    cursors: &mut [TraversalCursor],
    ctx: &mut ExecutionContext<'_>,
) -> Result<bool, Error> {
    for i in (0..cursors.len()).rev() {
        if cursors[i].has_more() {
            let advanced = cursors[i].advance(ctx)?;
            debug_assert!(advanced, "has_more guarantees an advance");
            for cursor in &mut cursors[i + 1..] {
                cursor.rewind(ctx)?;
            }
            return Ok(true);
        }
    }
    Ok(false)
}
