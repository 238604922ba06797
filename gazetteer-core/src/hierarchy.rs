//! The derived administrative hierarchy: countries, settlements, districts.
//!
//! A [`Hierarchy`] is rebuilt from scratch on every ingestion run and is
//! read-only afterwards, so it can be shared across threads behind an `Arc`
//! while index pushes are still running.

use crate::{Point, Polygon};

/// A district nested inside a settlement.
#[derive(Debug, Clone, PartialEq)]
pub struct District {
    /// Value of the boundary's `name` tag.
    pub name: String,
    /// Assembled boundary.
    pub polygon: Polygon,
}

/// A settlement (city, town, village) with its districts.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    /// Value of the boundary's `name` tag.
    pub name: String,
    /// Value of the boundary's `place` tag, e.g. `city`.
    pub place: String,
    /// Assembled boundary.
    pub polygon: Polygon,
    /// Districts attached in candidate order.
    pub districts: Vec<District>,
}

/// A country with its settlements.
#[derive(Debug, Clone, PartialEq)]
pub struct Country {
    /// Value of the boundary's `name` tag.
    pub name: String,
    /// Assembled boundary.
    pub polygon: Polygon,
    /// Settlements attached in candidate order.
    pub settlements: Vec<Settlement>,
}

/// The full tree produced by one ingestion run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Hierarchy {
    /// Countries matching the configured import country.
    pub countries: Vec<Country>,
}

/// The smallest administrative entity enclosing a point, with the names of
/// its ancestors.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "level", rename_all = "snake_case"))]
pub enum Place {
    /// The point lies inside a district.
    District {
        /// District name.
        name: String,
        /// Enclosing settlement name.
        settlement: String,
        /// Enclosing country name.
        country: String,
    },
    /// The point lies inside a settlement but none of its districts.
    Settlement {
        /// Settlement name.
        name: String,
        /// Settlement `place` tag value.
        place: String,
        /// Enclosing country name.
        country: String,
    },
    /// The point lies inside a country but none of its settlements.
    Country {
        /// Country name.
        name: String,
    },
}

impl Place {
    /// Name of the matched entity itself.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::District { name, .. }
            | Self::Settlement { name, .. }
            | Self::Country { name } => name,
        }
    }
}

impl Hierarchy {
    /// Number of settlements across all countries.
    #[must_use]
    pub fn settlement_count(&self) -> usize {
        self.countries
            .iter()
            .map(|country| country.settlements.len())
            .sum()
    }

    /// Number of districts across all settlements.
    #[must_use]
    pub fn district_count(&self) -> usize {
        self.countries
            .iter()
            .flat_map(|country| &country.settlements)
            .map(|settlement| settlement.districts.len())
            .sum()
    }

    /// Find the smallest entity whose polygon contains `point`.
    ///
    /// Walks countries, then their settlements, then districts, using the
    /// full point-in-polygon test at every level. The first match at each
    /// level wins.
    #[must_use]
    pub fn locate(&self, point: &Point) -> Option<Place> {
        let country = self
            .countries
            .iter()
            .find(|country| country.polygon.contains(point))?;
        let Some(settlement) = country
            .settlements
            .iter()
            .find(|settlement| settlement.polygon.contains(point))
        else {
            return Some(Place::Country {
                name: country.name.clone(),
            });
        };
        let place = settlement
            .districts
            .iter()
            .find(|district| district.polygon.contains(point))
            .map_or_else(
                || Place::Settlement {
                    name: settlement.name.clone(),
                    place: settlement.place.clone(),
                    country: country.name.clone(),
                },
                |district| Place::District {
                    name: district.name.clone(),
                    settlement: settlement.name.clone(),
                    country: country.name.clone(),
                },
            );
        Some(place)
    }
}
