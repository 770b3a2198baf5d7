// Graph Builder Module - Directed graph of utilized balances annotated with capacities

use crate::{
    capacity::CapacityEngine,
    snapshot::Snapshot,
    types::{AccountId, Amount},
};
use num_traits::Zero;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;

/// Account node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountNode {
    /// Account key
    pub account: AccountId,
    /// Organization flag
    pub organization: bool,
}

/// Edge `from -> to`: `from` holds `utilized` of `to`'s tokens and could
/// currently transfer `capacity` to `to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtilizationEdge {
    /// Amount of `to` tokens held by `from`
    pub utilized: Amount,
    /// Transfer limit `from -> to`
    pub capacity: Amount,
}

/// Inspection graph
#[derive(Debug, Default)]
pub struct UtilizationGraph {
    graph: DiGraph<AccountNode, UtilizationEdge>,
    nodes: HashMap<AccountId, NodeIndex>,
}

/// Aggregate figures over a graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphSummary {
    /// Number of accounts
    pub node_count: usize,
    /// Number of utilization edges
    pub edge_count: usize,
    /// Sum of utilized amounts
    pub total_utilized: Amount,
    /// Sum of capacities
    pub total_capacity: Amount,
}

impl UtilizationGraph {
    /// Build the graph from a snapshot.
    ///
    /// Every `(from, to)` pair with `from != to` drawn from the trust and
    /// balance rows of `from` gets its capacity computed; only pairs with a
    /// strictly positive utilized balance become edges.
    pub fn build(snapshot: &Snapshot) -> Self {
        let engine = CapacityEngine::new(snapshot);
        let mut graph = Self::default();

        for from in engine.sources() {
            for to in engine.counterparties(from) {
                let trust = snapshot.trust.get(from, to);
                let capacity = engine.transfer_limit(from, to, trust);
                let utilized = snapshot.balances.get(from, to);
                if utilized.is_zero() {
                    continue;
                }

                let from_idx = graph.find_or_create_node(from, snapshot.is_organization(from));
                let to_idx = graph.find_or_create_node(to, snapshot.is_organization(to));
                graph
                    .graph
                    .add_edge(from_idx, to_idx, UtilizationEdge { utilized, capacity });
            }
        }

        tracing::info!(
            "Built utilization graph: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        graph
    }

    /// Find existing node or create new one for an account
    pub fn find_or_create_node(&mut self, account: &AccountId, organization: bool) -> NodeIndex {
        if let Some(idx) = self.nodes.get(account) {
            return *idx;
        }
        let idx = self.graph.add_node(AccountNode {
            account: account.clone(),
            organization,
        });
        self.nodes.insert(account.clone(), idx);
        idx
    }

    /// Underlying petgraph graph, for external analytics
    pub fn inner(&self) -> &DiGraph<AccountNode, UtilizationEdge> {
        &self.graph
    }

    /// Node for an account, if it has any edge
    pub fn node(&self, account: &AccountId) -> Option<NodeIndex> {
        self.nodes.get(account).copied()
    }

    /// Edge weight for `from -> to`
    pub fn edge(&self, from: &AccountId, to: &AccountId) -> Option<&UtilizationEdge> {
        let edge = self.graph.find_edge(self.node(from)?, self.node(to)?)?;
        self.graph.edge_weight(edge)
    }

    /// Number of accounts
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Incoming and outgoing utilized totals for an account
    pub fn node_flows(&self, account: &AccountId) -> (Amount, Amount) {
        let mut incoming = Amount::zero();
        let mut outgoing = Amount::zero();
        if let Some(node) = self.node(account) {
            for edge in self.graph.edges_directed(node, Direction::Incoming) {
                incoming += &edge.weight().utilized;
            }
            for edge in self.graph.edges_directed(node, Direction::Outgoing) {
                outgoing += &edge.weight().utilized;
            }
        }
        (incoming, outgoing)
    }

    /// Totals over the whole graph
    pub fn summary(&self) -> GraphSummary {
        let mut total_utilized = Amount::zero();
        let mut total_capacity = Amount::zero();
        for edge in self.graph.edge_references() {
            total_utilized += &edge.weight().utilized;
            total_capacity += &edge.weight().capacity;
        }
        GraphSummary {
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            total_utilized,
            total_capacity,
        }
    }
}
