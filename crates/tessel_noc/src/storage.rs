//! The NoC topology: routers at physical positions joined by directed links.

use crate::error::NocError;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identity of a router in a [`NocStorage`].
pub type NocRouterId = NodeIndex;

/// Identity of a link in a [`NocStorage`].
pub type NocLinkId = EdgeIndex;

/// A router and the tile it sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NocRouter {
    /// ID given by the user or the mesh builder.
    pub user_id: u32,
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
    /// Die layer.
    pub layer: usize,
}

/// A directed link between two routers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NocLink {
    /// Link bandwidth in bits per second.
    pub bandwidth: f64,
}

/// The routers and links of a network-on-chip.
#[derive(Clone, Debug, Default)]
pub struct NocStorage {
    graph: DiGraph<NocRouter, NocLink>,
    by_user_id: HashMap<u32, NocRouterId>,
}

impl NocStorage {
    /// An empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// A `width` x `height` mesh on layer 0 with links in both directions
    /// between neighbours. Router `y * width + x` sits at `(x, y)`.
    pub fn mesh(width: usize, height: usize, bandwidth: f64) -> Self {
        let mut noc = Self::new();
        let mut ids = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let router = NocRouter {
                    user_id: (y * width + x) as u32,
                    x: x as i32,
                    y: y as i32,
                    layer: 0,
                };
                let id = noc.graph.add_node(router);
                noc.by_user_id.insert(router.user_id, id);
                ids.push(id);
            }
        }
        let link = NocLink { bandwidth };
        for y in 0..height {
            for x in 0..width {
                let here = ids[y * width + x];
                if x + 1 < width {
                    let right = ids[y * width + x + 1];
                    noc.graph.add_edge(here, right, link);
                    noc.graph.add_edge(right, here, link);
                }
                if y + 1 < height {
                    let up = ids[(y + 1) * width + x];
                    noc.graph.add_edge(here, up, link);
                    noc.graph.add_edge(up, here, link);
                }
            }
        }
        noc
    }

    /// Adds a router. User IDs must be unique.
    pub fn add_router(&mut self, router: NocRouter) -> Result<NocRouterId, NocError> {
        if self.by_user_id.contains_key(&router.user_id) {
            return Err(NocError::DuplicateRouter(router.user_id));
        }
        let id = self.graph.add_node(router);
        self.by_user_id.insert(router.user_id, id);
        Ok(id)
    }

    /// Adds a directed link from `src` to `dst`.
    pub fn add_link(&mut self, src: NocRouterId, dst: NocRouterId, link: NocLink) -> NocLinkId {
        self.graph.add_edge(src, dst, link)
    }

    /// The router with ID `id`.
    pub fn router(&self, id: NocRouterId) -> &NocRouter {
        &self.graph[id]
    }

    /// Looks up a router by its user ID.
    pub fn router_by_user_id(&self, user_id: u32) -> Result<NocRouterId, NocError> {
        self.by_user_id
            .get(&user_id)
            .copied()
            .ok_or(NocError::UnknownRouter(user_id))
    }

    /// The link with ID `id`.
    pub fn link(&self, id: NocLinkId) -> &NocLink {
        &self.graph[id]
    }

    /// Source and sink routers of a link.
    pub fn link_ends(&self, id: NocLinkId) -> Option<(NocRouterId, NocRouterId)> {
        self.graph.edge_endpoints(id)
    }

    /// Outgoing links of `router` with their sink routers, in insertion order.
    pub fn outgoing(&self, router: NocRouterId) -> Vec<(NocLinkId, NocRouterId)> {
        let mut links: Vec<(NocLinkId, NocRouterId)> = self
            .graph
            .edges_directed(router, Direction::Outgoing)
            .map(|e| (e.id(), e.target()))
            .collect();
        links.sort_by_key(|(id, _)| id.index());
        links
    }

    /// Number of routers.
    pub fn num_routers(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of links.
    pub fn num_links(&self) -> usize {
        self.graph.edge_count()
    }
}
