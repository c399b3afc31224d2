//! Sailing routes between ports, and the matcher that resolves an
//! (origin, destination) pair against the catalog in either direction.

use std::collections::HashMap;

use serde::Serialize;
use smallvec::SmallVec;
use thiserror::Error;

use crate::coords::{WorldPoint, path_length};
use crate::location::{LocationCatalog, LocationId};

/// Inline-capacity list for route waypoints; most routes fit without a heap
/// allocation.
pub type WaypointList = SmallVec<[WorldPoint; 8]>;

/// A charted route between two ports.
///
/// Waypoints are the open-water turns only; the endpoints' navigation
/// waypoints are prepended/appended on demand by [`SeaRoute::full_path`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeaRoute {
    pub start: LocationId,
    pub end: LocationId,
    pub waypoints: WaypointList,
}

impl SeaRoute {
    #[must_use]
    pub fn new(start: LocationId, end: LocationId, waypoints: WaypointList) -> Self {
        Self {
            start,
            end,
            waypoints,
        }
    }

    /// Whether this route joins the two ports, in either direction.
    #[must_use]
    pub fn connects(&self, a: LocationId, b: LocationId) -> bool {
        (self.start == a && self.end == b) || (self.start == b && self.end == a)
    }

    /// The drawable path in stored direction: start waypoint, turns, end
    /// waypoint. An uncharted endpoint contributes nothing; check
    /// [`Self::is_displayable`] before drawing.
    #[must_use]
    pub fn full_path(&self, locations: &LocationCatalog) -> WaypointList {
        let mut path = WaypointList::new();
        if let Some(point) = locations.nav_waypoint(self.start) {
            path.push(point);
        }
        path.extend(self.waypoints.iter().copied());
        if let Some(point) = locations.nav_waypoint(self.end) {
            path.push(point);
        }
        path
    }

    /// Planar length of the full path.
    #[must_use]
    pub fn distance(&self, locations: &LocationCatalog) -> f64 {
        path_length(&self.full_path(locations))
    }

    /// True when both endpoints are charted, i.e. the full path really spans
    /// port to port.
    #[must_use]
    pub fn is_displayable(&self, locations: &LocationCatalog) -> bool {
        locations.nav_waypoint(self.start).is_some() && locations.nav_waypoint(self.end).is_some()
    }
}

/// A catalog hit: the route plus whether its stored direction is opposite to
/// the order the caller asked for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteMatch {
    pub route: SeaRoute,
    pub reversed: bool,
}

impl RouteMatch {
    /// The drawable path oriented origin-first.
    #[must_use]
    pub fn oriented_path(&self, locations: &LocationCatalog) -> WaypointList {
        let mut path = self.route.full_path(locations);
        if self.reversed {
            path.reverse();
        }
        path
    }

    /// Length is direction-independent; delegate to the stored route.
    #[must_use]
    pub fn distance(&self, locations: &LocationCatalog) -> f64 {
        self.route.distance(locations)
    }
}

/// Errors raised when the route table violates catalog invariants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteCatalogError {
    #[error("route endpoints must differ (port {0:?})")]
    IdenticalEndpoints(LocationId),
    #[error("route references unknown port {0:?}")]
    UnknownEndpoint(LocationId),
    #[error("duplicate route between {a:?} and {b:?}")]
    DuplicatePair { a: LocationId, b: LocationId },
}

/// Immutable registry of routes, at most one per unordered endpoint pair.
#[derive(Debug, Clone, Default)]
pub struct RouteCatalog {
    routes: Vec<SeaRoute>,
    by_pair: HashMap<(LocationId, LocationId), usize>,
}

fn pair_key(a: LocationId, b: LocationId) -> (LocationId, LocationId) {
    if a <= b { (a, b) } else { (b, a) }
}

impl RouteCatalog {
    /// Build the catalog, failing fast on malformed or duplicate routes.
    ///
    /// # Errors
    ///
    /// Returns an error if a route's endpoints are equal, reference an
    /// unknown port, or repeat an already-registered pair.
    pub fn build(
        routes: Vec<SeaRoute>,
        locations: &LocationCatalog,
    ) -> Result<Self, RouteCatalogError> {
        let mut by_pair = HashMap::with_capacity(routes.len());
        for (index, route) in routes.iter().enumerate() {
            if route.start == route.end {
                return Err(RouteCatalogError::IdenticalEndpoints(route.start));
            }
            for endpoint in [route.start, route.end] {
                if locations.get(endpoint).is_none() {
                    return Err(RouteCatalogError::UnknownEndpoint(endpoint));
                }
            }
            let key = pair_key(route.start, route.end);
            if by_pair.insert(key, index).is_some() {
                return Err(RouteCatalogError::DuplicatePair { a: key.0, b: key.1 });
            }
        }
        Ok(Self { routes, by_pair })
    }

    /// Find the route joining `origin` and `destination`, whichever way it
    /// was charted. `None` means "no route", a reported condition the caller
    /// skips gracefully.
    #[must_use]
    pub fn find(&self, origin: LocationId, destination: LocationId) -> Option<RouteMatch> {
        if origin == destination {
            return None;
        }
        let index = *self.by_pair.get(&pair_key(origin, destination))?;
        let route = &self.routes[index];
        Some(RouteMatch {
            route: route.clone(),
            reversed: route.start != origin,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SeaRoute> {
        self.routes.iter()
    }
}
