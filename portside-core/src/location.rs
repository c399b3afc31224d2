//! Ports the assistant knows about.
//!
//! The catalog is built once from the tables in [`crate::data`] and never
//! mutated afterwards. An unknown/unset port is expressed as a failed
//! lookup, never as a placeholder entry, so no caller can mistake it for a
//! real route endpoint.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coords::WorldPoint;

/// Stable numeric key the host data table uses to reference a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(pub u16);

/// A named port with its dock, cargo point, and sailing waypoint.
///
/// `nav_waypoint` is the open-water point route lines attach to. Ports not
/// yet fully charted have none; that is a valid, permanent state and such
/// ports simply render without navigation lines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PortLocation {
    pub id: LocationId,
    pub name: &'static str,
    /// Where the player disembarks.
    pub dock: WorldPoint,
    /// Where cargo is picked up or handed over.
    pub cargo: WorldPoint,
    pub nav_waypoint: Option<WorldPoint>,
}

/// Errors raised when the port table violates catalog invariants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocationCatalogError {
    #[error("duplicate port id {0:?}")]
    DuplicateId(LocationId),
    #[error("duplicate port name {0:?}")]
    DuplicateName(&'static str),
}

/// Immutable registry of ports, queryable by id and by name.
#[derive(Debug, Clone, Default)]
pub struct LocationCatalog {
    by_id: HashMap<LocationId, PortLocation>,
    by_name: HashMap<&'static str, LocationId>,
}

impl LocationCatalog {
    /// Build the catalog, failing fast on duplicate ids or names.
    ///
    /// # Errors
    ///
    /// Returns an error if two ports share an id or a name.
    pub fn build(ports: &[PortLocation]) -> Result<Self, LocationCatalogError> {
        let mut by_id = HashMap::with_capacity(ports.len());
        let mut by_name = HashMap::with_capacity(ports.len());
        for port in ports {
            if by_id.insert(port.id, *port).is_some() {
                return Err(LocationCatalogError::DuplicateId(port.id));
            }
            if by_name.insert(port.name, port.id).is_some() {
                return Err(LocationCatalogError::DuplicateName(port.name));
            }
        }
        Ok(Self { by_id, by_name })
    }

    #[must_use]
    pub fn get(&self, id: LocationId) -> Option<&PortLocation> {
        self.by_id.get(&id)
    }

    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&PortLocation> {
        self.by_name.get(name).and_then(|id| self.by_id.get(id))
    }

    /// Navigation waypoint for a port, when the port exists and is charted.
    #[must_use]
    pub fn nav_waypoint(&self, id: LocationId) -> Option<WorldPoint> {
        self.get(id).and_then(|port| port.nav_waypoint)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PortLocation> {
        self.by_id.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port(id: u16, name: &'static str) -> PortLocation {
        PortLocation {
            id: LocationId(id),
            name,
            dock: WorldPoint::sea(100, 100),
            cargo: WorldPoint::sea(101, 100),
            nav_waypoint: Some(WorldPoint::sea(90, 90)),
        }
    }

    #[test]
    fn lookup_by_id_and_name_agree() {
        let catalog = LocationCatalog::build(&[port(1, "Saltmarsh Quay"), port(2, "Ember Bay")])
            .unwrap();
        let by_id = catalog.get(LocationId(2)).unwrap();
        let by_name = catalog.by_name("Ember Bay").unwrap();
        assert_eq!(by_id.id, by_name.id);
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn unknown_port_is_a_failed_lookup() {
        let catalog = LocationCatalog::build(&[port(1, "Saltmarsh Quay")]).unwrap();
        assert!(catalog.get(LocationId(99)).is_none());
        assert!(catalog.by_name("Nowhere").is_none());
        assert!(catalog.nav_waypoint(LocationId(99)).is_none());
    }

    #[test]
    fn duplicate_id_fails_construction() {
        let err = LocationCatalog::build(&[port(1, "Saltmarsh Quay"), port(1, "Ember Bay")])
            .unwrap_err();
        assert_eq!(err, LocationCatalogError::DuplicateId(LocationId(1)));
    }

    #[test]
    fn duplicate_name_fails_construction() {
        let err = LocationCatalog::build(&[port(1, "Saltmarsh Quay"), port(2, "Saltmarsh Quay")])
            .unwrap_err();
        assert_eq!(err, LocationCatalogError::DuplicateName("Saltmarsh Quay"));
    }

    #[test]
    fn uncharted_port_has_no_nav_waypoint() {
        let mut uncharted = port(3, "Lantern Isle");
        uncharted.nav_waypoint = None;
        let catalog = LocationCatalog::build(&[uncharted]).unwrap();
        assert!(catalog.get(LocationId(3)).is_some());
        assert!(catalog.nav_waypoint(LocationId(3)).is_none());
    }
}
