//! Turn-model routing algorithms.
//!
//! Every algorithm walks a flow from its source router to its destination
//! one hop at a time. At each router it computes the directions its turn
//! restrictions allow, picks one, and follows an outgoing link that moves in
//! that direction to a router not yet visited. Adaptive algorithms choose
//! between legal directions with a hash of the flow and position, so the same
//! flow always takes the same path.

use crate::error::NocError;
use crate::storage::{NocLinkId, NocRouterId, NocStorage};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tessel_common::ContentHash;

/// A step direction in the mesh.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum TurnDirection {
    /// Decreasing x (west).
    Left,
    /// Increasing x (east).
    Right,
    /// Increasing y (north).
    Up,
    /// Decreasing y (south).
    Down,
}

impl TurnDirection {
    fn is_vertical(self) -> bool {
        matches!(self, TurnDirection::Up | TurnDirection::Down)
    }

    /// Returns `true` if moving from `(x0, y0)` to `(x1, y1)` goes this way.
    fn matches(self, (x0, y0): (i32, i32), (x1, y1): (i32, i32)) -> bool {
        match self {
            TurnDirection::Left => x1 < x0,
            TurnDirection::Right => x1 > x0,
            TurnDirection::Up => y1 > y0,
            TurnDirection::Down => y1 < y0,
        }
    }
}

/// The supported routing algorithms.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingAlgorithm {
    /// Dimension order: all x hops, then all y hops.
    #[default]
    Xy,
    /// West hops first; afterwards any minimal direction except west.
    WestFirst,
    /// North hops last; before that any minimal direction except north.
    NorthLast,
    /// West and south hops first, then east and north.
    NegativeFirst,
    /// Column-parity turn restrictions.
    OddEven,
}

impl RoutingAlgorithm {
    /// Names accepted by [`RoutingAlgorithm::from_name`].
    pub const NAMES: &'static [&'static str] = &[
        "xy_routing",
        "west_first_routing",
        "north_last_routing",
        "negative_first_routing",
        "odd_even_routing",
    ];

    /// Parses an algorithm name such as `west_first_routing`.
    pub fn from_name(name: &str) -> Result<Self, NocError> {
        match name {
            "xy_routing" => Ok(RoutingAlgorithm::Xy),
            "west_first_routing" => Ok(RoutingAlgorithm::WestFirst),
            "north_last_routing" => Ok(RoutingAlgorithm::NorthLast),
            "negative_first_routing" => Ok(RoutingAlgorithm::NegativeFirst),
            "odd_even_routing" => Ok(RoutingAlgorithm::OddEven),
            _ => Err(NocError::UnknownAlgorithm {
                name: name.to_string(),
                supported: Self::NAMES.join(", "),
            }),
        }
    }

    /// The canonical name.
    pub fn name(self) -> &'static str {
        match self {
            RoutingAlgorithm::Xy => "xy_routing",
            RoutingAlgorithm::WestFirst => "west_first_routing",
            RoutingAlgorithm::NorthLast => "north_last_routing",
            RoutingAlgorithm::NegativeFirst => "negative_first_routing",
            RoutingAlgorithm::OddEven => "odd_even_routing",
        }
    }

    /// Directions the algorithm allows at `curr` for a flow from `src` to `dst`.
    pub fn legal_directions(self, noc: &NocStorage, src: NocRouterId, curr: NocRouterId, dst: NocRouterId) -> Vec<TurnDirection> {
        use TurnDirection::*;

        let (sx, _) = position(noc, src);
        let (cx, cy) = position(noc, curr);
        let (dx, dy) = position(noc, dst);
        let horizontal = match dx.cmp(&cx) {
            std::cmp::Ordering::Less => Some(Left),
            std::cmp::Ordering::Greater => Some(Right),
            std::cmp::Ordering::Equal => None,
        };
        let vertical = match dy.cmp(&cy) {
            std::cmp::Ordering::Less => Some(Down),
            std::cmp::Ordering::Greater => Some(Up),
            std::cmp::Ordering::Equal => None,
        };

        let mut legal = Vec::with_capacity(2);
        match self {
            RoutingAlgorithm::Xy => legal.extend(horizontal.or(vertical)),
            RoutingAlgorithm::WestFirst => {
                if horizontal == Some(Left) {
                    legal.push(Left);
                } else {
                    legal.extend(horizontal);
                    legal.extend(vertical);
                }
            }
            RoutingAlgorithm::NorthLast => {
                legal.extend(horizontal);
                if vertical == Some(Down) {
                    legal.push(Down);
                }
                if legal.is_empty() && vertical == Some(Up) {
                    legal.push(Up);
                }
            }
            RoutingAlgorithm::NegativeFirst => {
                legal.extend(horizontal.filter(|&d| d == Left));
                legal.extend(vertical.filter(|&d| d == Down));
                if legal.is_empty() {
                    legal.extend(horizontal);
                    legal.extend(vertical);
                }
            }
            RoutingAlgorithm::OddEven => match horizontal {
                None => legal.extend(vertical),
                Some(Right) => match vertical {
                    None => legal.push(Right),
                    Some(v) => {
                        // North/south turns out of an eastbound path only in odd columns.
                        if cx % 2 != 0 || cx == sx {
                            legal.push(v);
                        }
                        if dx % 2 != 0 || dx - cx != 1 {
                            legal.push(Right);
                        }
                    }
                },
                Some(_) => {
                    legal.push(Left);
                    if cx % 2 == 0 {
                        legal.extend(vertical);
                    }
                }
            },
        }
        legal
    }

    /// Picks one of `legal`. `None` only when `legal` is empty.
    pub fn select_direction(
        self,
        noc: &NocStorage,
        legal: &[TurnDirection],
        src: NocRouterId,
        dst: NocRouterId,
        curr: NocRouterId,
        flow: u32,
    ) -> Option<TurnDirection> {
        match legal {
            [] => return None,
            [only] => return Some(*only),
            _ => {}
        }
        let (cx, cy) = position(noc, curr);
        let (dx, dy) = position(noc, dst);
        let delta_x = u64::from(dx.abs_diff(cx));
        let delta_y = u64::from(dy.abs_diff(cy));
        let hash = u64::from(flow_hash(src, dst, curr, flow));
        let share = |delta: u64| delta * (u64::from(u32::MAX) / (delta_x + delta_y).max(1));

        match self {
            RoutingAlgorithm::Xy => legal.first().copied(),
            RoutingAlgorithm::WestFirst => {
                if hash < share(delta_x) {
                    pick(legal, |d| d == TurnDirection::Right)
                } else {
                    pick(legal, |d| d != TurnDirection::Right)
                }
            }
            RoutingAlgorithm::NorthLast => {
                if hash < share(delta_y) {
                    pick(legal, |d| d == TurnDirection::Down)
                } else {
                    pick(legal, |d| d != TurnDirection::Down)
                }
            }
            RoutingAlgorithm::NegativeFirst | RoutingAlgorithm::OddEven => {
                if hash < share(delta_y) {
                    pick(legal, |d| d.is_vertical())
                } else {
                    pick(legal, |d| !d.is_vertical())
                }
            }
        }
    }

    /// Routes flow `flow` from `src` to `dst` and returns the links taken.
    pub fn route_flow(self, noc: &NocStorage, src: NocRouterId, dst: NocRouterId, flow: u32) -> Result<Vec<NocLinkId>, NocError> {
        let no_route = || NocError::NoRoute {
            src: noc.router(src).user_id,
            dst: noc.router(dst).user_id,
            algorithm: self.name(),
        };
        let mut route = Vec::new();
        let mut visited = HashSet::from([src]);
        let mut curr = src;

        while curr != dst {
            let legal = self.legal_directions(noc, src, curr, dst);
            let direction = self
                .select_direction(noc, &legal, src, dst, curr, flow)
                .ok_or_else(no_route)?;
            let here = position(noc, curr);
            let (link, next) = noc
                .outgoing(curr)
                .into_iter()
                .find(|&(_, next)| !visited.contains(&next) && direction.matches(here, position(noc, next)))
                .ok_or_else(no_route)?;
            visited.insert(next);
            route.push(link);
            curr = next;
        }
        log::trace!(
            "{}: flow {flow} from {} to {} takes {} hops",
            self.name(),
            noc.router(src).user_id,
            noc.router(dst).user_id,
            route.len()
        );
        Ok(route)
    }
}

impl fmt::Display for RoutingAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// First direction satisfying `wanted`, or the first legal one.
fn pick(legal: &[TurnDirection], wanted: impl Fn(TurnDirection) -> bool) -> Option<TurnDirection> {
    legal.iter().copied().find(|&d| wanted(d)).or(legal.first().copied())
}

fn position(noc: &NocStorage, id: NocRouterId) -> (i32, i32) {
    let r = noc.router(id);
    (r.x, r.y)
}

fn flow_hash(src: NocRouterId, dst: NocRouterId, curr: NocRouterId, flow: u32) -> u32 {
    let mut bytes = Vec::with_capacity(16);
    for v in [src.index() as u32, dst.index() as u32, curr.index() as u32, flow] {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    let hash = ContentHash::from_bytes(&bytes);
    let b = hash.as_bytes();
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [RoutingAlgorithm; 5] = [
        RoutingAlgorithm::Xy,
        RoutingAlgorithm::WestFirst,
        RoutingAlgorithm::NorthLast,
        RoutingAlgorithm::NegativeFirst,
        RoutingAlgorithm::OddEven,
    ];

    fn router(noc: &NocStorage, x: usize, y: usize, width: usize) -> NocRouterId {
        noc.router_by_user_id((y * width + x) as u32).unwrap()
    }

    fn hops(noc: &NocStorage, route: &[NocLinkId]) -> Vec<(i32, i32)> {
        route
            .iter()
            .map(|&l| {
                let (_, dst) = noc.link_ends(l).unwrap();
                position(noc, dst)
            })
            .collect()
    }

    #[test]
    fn names_round_trip() {
        for (name, algo) in RoutingAlgorithm::NAMES.iter().zip(ALL) {
            assert_eq!(RoutingAlgorithm::from_name(name).unwrap(), algo);
            assert_eq!(algo.to_string(), *name);
        }
        let err = RoutingAlgorithm::from_name("bfs").unwrap_err().to_string();
        assert!(err.contains("\"bfs\""));
        assert!(err.contains("xy_routing, west_first_routing"));
    }

    #[test]
    fn xy_goes_horizontal_first() {
        let noc = NocStorage::mesh(4, 4, 1.0);
        let src = router(&noc, 0, 0, 4);
        let dst = router(&noc, 3, 2, 4);
        let route = RoutingAlgorithm::Xy.route_flow(&noc, src, dst, 0).unwrap();
        assert_eq!(hops(&noc, &route), vec![(1, 0), (2, 0), (3, 0), (3, 1), (3, 2)]);
    }

    #[test]
    fn turn_restrictions() {
        use TurnDirection::*;
        let noc = NocStorage::mesh(4, 4, 1.0);
        let at = |x, y| router(&noc, x, y, 4);

        // Destination to the north-west.
        let (src, dst) = (at(2, 1), at(0, 3));
        assert_eq!(RoutingAlgorithm::WestFirst.legal_directions(&noc, src, src, dst), vec![Left]);
        assert_eq!(RoutingAlgorithm::NorthLast.legal_directions(&noc, src, src, dst), vec![Left]);
        assert_eq!(RoutingAlgorithm::NegativeFirst.legal_directions(&noc, src, src, dst), vec![Left]);

        // Destination to the north-east.
        let (src, dst) = (at(0, 0), at(2, 3));
        assert_eq!(RoutingAlgorithm::WestFirst.legal_directions(&noc, src, src, dst), vec![Right, Up]);
        assert_eq!(RoutingAlgorithm::NorthLast.legal_directions(&noc, src, src, dst), vec![Right]);
        assert_eq!(RoutingAlgorithm::NegativeFirst.legal_directions(&noc, src, src, dst), vec![Right, Up]);

        // Destination straight north: north-last finally allows north.
        let (src, dst) = (at(1, 0), at(1, 3));
        assert_eq!(RoutingAlgorithm::NorthLast.legal_directions(&noc, src, src, dst), vec![Up]);

        // Odd-even: no turn out of an eastbound path in an even column.
        let (src, curr, dst) = (at(0, 0), at(2, 0), at(3, 2));
        assert_eq!(RoutingAlgorithm::OddEven.legal_directions(&noc, src, curr, dst), vec![Right]);
        let curr = at(1, 0);
        assert_eq!(RoutingAlgorithm::OddEven.legal_directions(&noc, src, curr, dst), vec![Up, Right]);
    }

    #[test]
    fn every_algorithm_routes_minimally() {
        let noc = NocStorage::mesh(4, 4, 1.0);
        for algo in ALL {
            for s in 0..16u32 {
                for d in 0..16u32 {
                    let src = noc.router_by_user_id(s).unwrap();
                    let dst = noc.router_by_user_id(d).unwrap();
                    let route = algo.route_flow(&noc, src, dst, s * 16 + d).unwrap();
                    let (sx, sy) = position(&noc, src);
                    let (dx, dy) = position(&noc, dst);
                    assert_eq!(route.len() as u32, sx.abs_diff(dx) + sy.abs_diff(dy), "{algo} {s}->{d}");
                    if let Some(&last) = route.last() {
                        assert_eq!(noc.link_ends(last).unwrap().1, dst);
                    }
                }
            }
        }
    }

    #[test]
    fn adaptive_choice_is_repeatable() {
        let noc = NocStorage::mesh(5, 5, 1.0);
        let src = router(&noc, 0, 0, 5);
        let dst = router(&noc, 4, 4, 5);
        for algo in [RoutingAlgorithm::WestFirst, RoutingAlgorithm::NegativeFirst, RoutingAlgorithm::OddEven] {
            let a = algo.route_flow(&noc, src, dst, 11).unwrap();
            let b = algo.route_flow(&noc, src, dst, 11).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn disconnected_destination_fails() {
        let mut noc = NocStorage::mesh(2, 1, 1.0);
        let island = noc
            .add_router(crate::storage::NocRouter {
                user_id: 99,
                x: 5,
                y: 0,
                layer: 0,
            })
            .unwrap();
        let src = noc.router_by_user_id(0).unwrap();
        let err = RoutingAlgorithm::Xy.route_flow(&noc, src, island, 0).unwrap_err();
        assert!(matches!(err, NocError::NoRoute { src: 0, dst: 99, .. }));
    }

    #[test]
    fn serde_names() {
        let json = serde_json::to_string(&RoutingAlgorithm::NegativeFirst).unwrap();
        assert_eq!(json, "\"negative_first\"");
    }
}
