//! Built-in port and route tables shipped with the assistant.
//!
//! Charted in code rather than external assets so the map can only change
//! via reviewed commits. Waypoints were traced by sailing each leg and
//! noting the open-water turns.

use smallvec::smallvec;

use crate::coords::WorldPoint;
use crate::location::{LocationCatalog, LocationCatalogError, LocationId, PortLocation};
use crate::route::{RouteCatalog, RouteCatalogError, SeaRoute};

pub const SALTMARSH_QUAY: LocationId = LocationId(1);
pub const GULLWING_HARBOR: LocationId = LocationId(2);
pub const IRONREEF_DOCKS: LocationId = LocationId(3);
pub const CALDERA_LANDING: LocationId = LocationId(4);
pub const MISTRAL_POINT: LocationId = LocationId(5);
pub const WHALEBACK_WHARF: LocationId = LocationId(6);
pub const EMBER_BAY: LocationId = LocationId(7);
pub const LANTERN_ISLE: LocationId = LocationId(8);

const PORTS: [PortLocation; 8] = [
    PortLocation {
        id: SALTMARSH_QUAY,
        name: "Saltmarsh Quay",
        dock: WorldPoint::sea(1712, 2288),
        cargo: WorldPoint::sea(1718, 2292),
        nav_waypoint: Some(WorldPoint::sea(1700, 2270)),
    },
    PortLocation {
        id: GULLWING_HARBOR,
        name: "Gullwing Harbor",
        dock: WorldPoint::sea(1980, 2450),
        cargo: WorldPoint::sea(1986, 2446),
        nav_waypoint: Some(WorldPoint::sea(1965, 2430)),
    },
    PortLocation {
        id: IRONREEF_DOCKS,
        name: "Ironreef Docks",
        dock: WorldPoint::sea(2340, 2210),
        cargo: WorldPoint::sea(2334, 2204),
        nav_waypoint: Some(WorldPoint::sea(2320, 2195)),
    },
    PortLocation {
        id: CALDERA_LANDING,
        name: "Caldera Landing",
        dock: WorldPoint::sea(2610, 2520),
        cargo: WorldPoint::sea(2604, 2526),
        nav_waypoint: Some(WorldPoint::sea(2590, 2505)),
    },
    PortLocation {
        id: MISTRAL_POINT,
        name: "Mistral Point",
        dock: WorldPoint::sea(1850, 2790),
        cargo: WorldPoint::sea(1844, 2786),
        nav_waypoint: Some(WorldPoint::sea(1835, 2770)),
    },
    PortLocation {
        id: WHALEBACK_WHARF,
        name: "Whaleback Wharf",
        dock: WorldPoint::sea(2190, 2850),
        cargo: WorldPoint::sea(2196, 2856),
        nav_waypoint: Some(WorldPoint::sea(2175, 2830)),
    },
    PortLocation {
        id: EMBER_BAY,
        name: "Ember Bay",
        dock: WorldPoint::sea(2750, 2050),
        cargo: WorldPoint::sea(2756, 2046),
        nav_waypoint: Some(WorldPoint::sea(2735, 2035)),
    },
    // Lantern Isle's approach has not been charted yet; tasks touching it
    // stay listed but render without navigation lines.
    PortLocation {
        id: LANTERN_ISLE,
        name: "Lantern Isle",
        dock: WorldPoint::sea(2980, 2700),
        cargo: WorldPoint::sea(2986, 2704),
        nav_waypoint: None,
    },
];

/// Build the shipped port catalog.
///
/// # Errors
///
/// Returns an error if the built-in table violates catalog invariants.
pub fn builtin_locations() -> Result<LocationCatalog, LocationCatalogError> {
    LocationCatalog::build(&PORTS)
}

/// Build the shipped route catalog over a port catalog.
///
/// # Errors
///
/// Returns an error if the built-in table violates catalog invariants.
pub fn builtin_routes(locations: &LocationCatalog) -> Result<RouteCatalog, RouteCatalogError> {
    RouteCatalog::build(
        vec![
            SeaRoute::new(
                SALTMARSH_QUAY,
                GULLWING_HARBOR,
                smallvec![WorldPoint::sea(1780, 2330), WorldPoint::sea(1880, 2395)],
            ),
            SeaRoute::new(
                SALTMARSH_QUAY,
                IRONREEF_DOCKS,
                smallvec![
                    WorldPoint::sea(1850, 2150),
                    WorldPoint::sea(2100, 2120),
                    WorldPoint::sea(2250, 2160),
                ],
            ),
            SeaRoute::new(
                SALTMARSH_QUAY,
                MISTRAL_POINT,
                smallvec![WorldPoint::sea(1760, 2480), WorldPoint::sea(1800, 2650)],
            ),
            SeaRoute::new(
                GULLWING_HARBOR,
                CALDERA_LANDING,
                smallvec![WorldPoint::sea(2150, 2480), WorldPoint::sea(2400, 2510)],
            ),
            SeaRoute::new(
                GULLWING_HARBOR,
                WHALEBACK_WHARF,
                smallvec![WorldPoint::sea(2040, 2620), WorldPoint::sea(2120, 2740)],
            ),
            SeaRoute::new(
                IRONREEF_DOCKS,
                EMBER_BAY,
                smallvec![WorldPoint::sea(2480, 2120), WorldPoint::sea(2620, 2060)],
            ),
            SeaRoute::new(
                CALDERA_LANDING,
                EMBER_BAY,
                smallvec![WorldPoint::sea(2680, 2380), WorldPoint::sea(2730, 2200)],
            ),
            SeaRoute::new(MISTRAL_POINT, WHALEBACK_WHARF, smallvec![WorldPoint::sea(1990, 2820)]),
            SeaRoute::new(CALDERA_LANDING, LANTERN_ISLE, smallvec![WorldPoint::sea(2790, 2600)]),
        ],
        locations,
    )
}
