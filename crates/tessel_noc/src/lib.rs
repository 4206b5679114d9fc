//! Network-on-chip model and turn-model routing.
//!
//! A [`NocStorage`] holds routers placed on fabric tiles and the directed
//! links between them. A [`RoutingAlgorithm`] turns a flow between two
//! routers into the list of links it uses:
//!
//! ```
//! use tessel_noc::{NocStorage, RoutingAlgorithm};
//!
//! let noc = NocStorage::mesh(3, 3, 1.0e9);
//! let src = noc.router_by_user_id(0).unwrap();
//! let dst = noc.router_by_user_id(8).unwrap();
//! let algo = RoutingAlgorithm::from_name("west_first_routing").unwrap();
//! let route = algo.route_flow(&noc, src, dst, 0).unwrap();
//! assert_eq!(route.len(), 4);
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod routing;
pub mod storage;

pub use error::NocError;
pub use routing::{RoutingAlgorithm, TurnDirection};
pub use storage::{NocLink, NocLinkId, NocRouter, NocRouterId, NocStorage};
