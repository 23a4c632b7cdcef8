//! Coordinate reference system types shared by all sn7meta crates.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, Sn7Error};

/// Coordinate Reference System identified by EPSG code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Crs {
    pub epsg: u32,
    pub name: String,
}

impl Default for Crs {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl Crs {
    pub fn new(epsg: u32, name: impl Into<String>) -> Self {
        Self { epsg, name: name.into() }
    }

    /// WGS 84 (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::new(4326, "WGS 84")
    }

    /// Authority string accepted by PROJ, e.g. `EPSG:32613`
    pub fn authority(&self) -> String {
        format!("EPSG:{}", self.epsg)
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{} ({})", self.epsg, self.name)
    }
}

/// Hemisphere of a UTM zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Hemisphere {
    #[default]
    North,
    South,
}

impl Hemisphere {
    fn epsg_base(&self) -> u32 {
        match self {
            Hemisphere::North => 32600,
            Hemisphere::South => 32700,
        }
    }

    fn suffix(&self) -> char {
        match self {
            Hemisphere::North => 'N',
            Hemisphere::South => 'S',
        }
    }
}

/// A validated WGS 84 / UTM zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UtmZone {
    zone: u8,
    hemisphere: Hemisphere,
}

impl UtmZone {
    /// Create a zone, rejecting numbers outside 1-60
    pub fn new(zone: u32, hemisphere: Hemisphere) -> Result<Self> {
        if !(1..=60).contains(&zone) {
            return Err(Sn7Error::UnsupportedZone { zone });
        }
        Ok(Self { zone: zone as u8, hemisphere })
    }

    /// Northern-hemisphere zone, the SpaceNet7 filename convention
    pub fn north(zone: u32) -> Result<Self> {
        Self::new(zone, Hemisphere::North)
    }

    pub fn zone(&self) -> u32 {
        u32::from(self.zone)
    }

    pub fn hemisphere(&self) -> Hemisphere {
        self.hemisphere
    }

    /// EPSG code: 326xx for northern zones, 327xx for southern zones
    pub fn epsg(&self) -> u32 {
        self.hemisphere.epsg_base() + self.zone()
    }

    pub fn crs(&self) -> Crs {
        Crs::new(self.epsg(), format!("WGS 84 / UTM zone {}", self))
    }
}

impl Default for UtmZone {
    /// Zone 13N, the zone of the reference SpaceNet7 chips
    fn default() -> Self {
        Self { zone: 13, hemisphere: Hemisphere::North }
    }
}

impl fmt::Display for UtmZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.zone, self.hemisphere.suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_northern_epsg() {
        let zone = UtmZone::north(13).unwrap();
        assert_eq!(zone.epsg(), 32613);
        assert_eq!(zone.crs().authority(), "EPSG:32613");
        assert_eq!(zone.to_string(), "13N");
    }

    #[test]
    fn test_southern_epsg() {
        let zone = UtmZone::new(5, Hemisphere::South).unwrap();
        assert_eq!(zone.epsg(), 32705);
        assert_eq!(zone.crs().name, "WGS 84 / UTM zone 5S");
    }

    #[test]
    fn test_zone_out_of_range() {
        assert!(matches!(UtmZone::north(0), Err(Sn7Error::UnsupportedZone { zone: 0 })));
        assert!(matches!(UtmZone::north(61), Err(Sn7Error::UnsupportedZone { zone: 61 })));
        assert!(UtmZone::north(60).is_ok());
    }
}
