//! Route computation over the chain topology
//!
//! Treats the parent/child tree as an undirected graph and finds the hop
//! sequence between two chains with a breadth-first search over a
//! predecessor map. The topology is a rooted tree, so the BFS path is
//! unique and minimal in hop count.

use crate::error::{TransferError, TransferResult};
use crate::ledger::ChainMap;

use std::collections::{HashMap, VecDeque};

/// Compute the chain-name sequence from `from` to `to`
///
/// Returns a single-element path when `from == to`. Fails with
/// `ChainNotFound` for unknown endpoints and `RouteNotFound` when the
/// chains are not connected.
pub fn find_path(chains: &ChainMap, from: &str, to: &str) -> TransferResult<Vec<String>> {
    if !chains.contains_key(from) {
        return Err(TransferError::ChainNotFound(from.to_string()));
    }
    if !chains.contains_key(to) {
        return Err(TransferError::ChainNotFound(to.to_string()));
    }

    if from == to {
        return Ok(vec![from.to_string()]);
    }

    let mut predecessor: HashMap<&str, &str> = HashMap::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    queue.push_back(from);
    predecessor.insert(from, from);

    while let Some(current) = queue.pop_front() {
        if current == to {
            break;
        }

        let chain = &chains[current];
        let neighbors = chain
            .parent
            .iter()
            .chain(chain.children.iter())
            .map(String::as_str);

        for neighbor in neighbors {
            // Neighbors referencing chains absent from the snapshot are skipped
            if chains.contains_key(neighbor) && !predecessor.contains_key(neighbor) {
                predecessor.insert(neighbor, current);
                queue.push_back(neighbor);
            }
        }
    }

    if !predecessor.contains_key(to) {
        return Err(TransferError::RouteNotFound {
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    // Reconstruct from the predecessor map
    let mut path = vec![to.to_string()];
    let mut cursor = to;
    while cursor != from {
        cursor = predecessor[cursor];
        path.push(cursor.to_string());
    }
    path.reverse();

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Chain;

    fn tree(edges: &[(&str, Option<&str>)]) -> ChainMap {
        let mut chains: ChainMap = edges
            .iter()
            .map(|(name, parent)| {
                (
                    name.to_string(),
                    Chain {
                        name: name.to_string(),
                        address: format!("chain:{}", name),
                        parent: parent.map(str::to_string),
                        children: Vec::new(),
                    },
                )
            })
            .collect();

        for (name, parent) in edges {
            if let Some(parent) = parent {
                let child = name.to_string();
                chains.get_mut(*parent).unwrap().children.push(child);
            }
        }

        chains
    }

    fn sample() -> ChainMap {
        tree(&[
            ("main", None),
            ("account", Some("main")),
            ("nft", Some("main")),
            ("apps", Some("account")),
        ])
    }

    #[test]
    fn same_chain_is_single_element() {
        let path = find_path(&sample(), "main", "main").unwrap();
        assert_eq!(path, vec!["main"]);
    }

    #[test]
    fn direct_child() {
        let path = find_path(&sample(), "main", "nft").unwrap();
        assert_eq!(path, vec!["main", "nft"]);
    }

    #[test]
    fn path_through_root() {
        let path = find_path(&sample(), "nft", "apps").unwrap();
        assert_eq!(path, vec!["nft", "main", "account", "apps"]);
    }

    #[test]
    fn path_upward() {
        let path = find_path(&sample(), "apps", "main").unwrap();
        assert_eq!(path, vec!["apps", "account", "main"]);
    }

    #[test]
    fn path_length_equals_tree_distance() {
        let chains = sample();
        for (from, to, distance) in [
            ("main", "account", 1usize),
            ("main", "apps", 2),
            ("nft", "account", 2),
            ("nft", "apps", 3),
        ] {
            let path = find_path(&chains, from, to).unwrap();
            assert_eq!(path.len(), distance + 1, "{} -> {}", from, to);
        }
    }

    #[test]
    fn prefix_names_do_not_collide() {
        // "main" is a prefix of "mainnet"; the BFS must keep them distinct
        let chains = tree(&[
            ("main", None),
            ("mainnet", Some("main")),
            ("net", Some("mainnet")),
        ]);
        let path = find_path(&chains, "main", "net").unwrap();
        assert_eq!(path, vec!["main", "mainnet", "net"]);
    }

    #[test]
    fn unknown_endpoint_fails() {
        let err = find_path(&sample(), "main", "ghost").unwrap_err();
        assert!(matches!(err, TransferError::ChainNotFound(_)));
    }

    #[test]
    fn disconnected_chains_fail_with_route_not_found() {
        let mut chains = sample();
        chains.insert(
            "island".to_string(),
            Chain {
                name: "island".to_string(),
                address: "chain:island".to_string(),
                parent: None,
                children: Vec::new(),
            },
        );

        let err = find_path(&chains, "main", "island").unwrap_err();
        assert!(matches!(err, TransferError::RouteNotFound { .. }));
    }
}
