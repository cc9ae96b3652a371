//! The overlay graph.
//!
//! The tracker keeps a random graph of mutually connected peers layered
//! over the swarms. Edges are symmetric references between peers: if `Q` is
//! a neighbor of `P` under neighbor id `n`, then `P` is a neighbor of `Q`
//! under the *same* `n`; the id names the edge, not a direction. Peers are
//! kept in an arena keyed by peer id and edges are stored as plain
//! `peer_id → {nid, ip, port}` entries, never as in-memory back-pointers,
//! so removing a peer is a table sweep rather than a pointer chase.
//!
//! The pieces:
//!
//! - [`sim_peer::SimPeer`]: everything the tracker knows about one peer,
//!   including its neighbor table and the inverse `nid → peer_id` index.
//! - [`network::Network`]: the arena plus the wiring operations
//!   (`init_peer`, `connect`, `rand_connect`, `disconnect`) and the swarm
//!   queries.
//! - [`path_finder`]: the level-expansion search producing simple paths
//!   through the overlay for tracking codes.
//! - [`repository::InMemoryNetwork`]: the thread-safe wrapper the handlers
//!   talk to. All mutation serializes through its write lock; tracking-code
//!   crypto runs on data copied out of the lock.
pub mod network;
pub mod path_finder;
pub mod repository;
pub mod sim_peer;
