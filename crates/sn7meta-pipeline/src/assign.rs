//! AOI assignment
//!
//! Chips are matched to AOIs either by identifier (the `aoi_id` parsed from
//! the filename) or spatially (chip centroid strictly inside the AOI
//! boundary). AOIs are only compared with chips in the same CRS. When several
//! AOIs match, the [`OverlapPolicy`] decides.

use sn7meta_core::config::{AoiStrategy, OverlapPolicy};
use sn7meta_core::error::{Result, Sn7Error};
use sn7meta_core::models::{AoiPolygon, ChipGeometry, EnrichedChipRecord, ParsedChipIdentifier};
use sn7meta_geo::AoiIndex;
use std::collections::{BTreeMap, HashMap};

/// A parsed row with its resolved footprint, ready for assignment
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedChip {
    pub row_index: usize,
    pub filename: String,
    pub building_id: i64,
    pub chip: ParsedChipIdentifier,
    pub geometry: ChipGeometry,
}

/// AOI boundaries grouped by the EPSG code they are expressed in
#[derive(Debug, Clone, Default)]
pub struct AoiCatalog {
    by_crs: BTreeMap<u32, Vec<AoiPolygon>>,
}

impl AoiCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add AOIs expressed in `epsg`, after any already present
    pub fn extend(&mut self, epsg: u32, aois: Vec<AoiPolygon>) {
        self.by_crs.entry(epsg).or_default().extend(aois);
    }

    /// AOIs in table order for one CRS
    pub fn get(&self, epsg: u32) -> &[AoiPolygon] {
        self.by_crs.get(&epsg).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every AOI, grouped by CRS
    pub fn all(&self) -> Vec<AoiPolygon> {
        self.by_crs.values().flatten().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.by_crs.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Associates resolved chips with AOIs
pub struct AoiAssigner<'a> {
    strategy: AoiStrategy,
    overlap: OverlapPolicy,
    catalog: Option<&'a AoiCatalog>,
    by_id: HashMap<(u32, &'a str), Vec<usize>>,
    indexes: HashMap<u32, AoiIndex<'a>>,
}

impl<'a> AoiAssigner<'a> {
    /// Prepare lookups over `catalog`; `None` means no AOI source exists
    pub fn new(strategy: AoiStrategy, overlap: OverlapPolicy, catalog: Option<&'a AoiCatalog>) -> Self {
        let mut by_id: HashMap<(u32, &'a str), Vec<usize>> = HashMap::new();
        let mut indexes = HashMap::new();

        if let Some(catalog) = catalog {
            for (&epsg, aois) in &catalog.by_crs {
                match strategy {
                    AoiStrategy::Identifier => {
                        for (idx, aoi) in aois.iter().enumerate() {
                            by_id.entry((epsg, aoi.aoi_id.as_str())).or_default().push(idx);
                        }
                    }
                    AoiStrategy::Spatial => {
                        indexes.insert(epsg, AoiIndex::new(aois));
                    }
                }
            }
        }

        Self { strategy, overlap, catalog, by_id, indexes }
    }

    /// Assign one chip, returning one record (or several under `all`)
    pub fn assign_one(&self, chip: &ResolvedChip) -> Result<Vec<EnrichedChipRecord>> {
        let Some(catalog) = self.catalog else {
            return Ok(vec![enrich(chip, None, None)]);
        };

        let epsg = chip.geometry.crs.epsg;
        let aois = catalog.get(epsg);
        let matches: Vec<&AoiPolygon> = match self.strategy {
            AoiStrategy::Identifier => self
                .by_id
                .get(&(epsg, chip.chip.aoi_id.as_str()))
                .map(|idxs| idxs.iter().map(|&i| &aois[i]).collect())
                .unwrap_or_default(),
            AoiStrategy::Spatial => self
                .indexes
                .get(&epsg)
                .map(|index| index.containing(&chip.geometry.centroid).into_iter().map(|i| &aois[i]).collect())
                .unwrap_or_default(),
        };

        match matches.as_slice() {
            [] => {
                // Identifier joins keep the key; spatial misses have none
                let key = match self.strategy {
                    AoiStrategy::Identifier => Some(chip.chip.aoi_id.clone()),
                    AoiStrategy::Spatial => None,
                };
                Ok(vec![enrich(chip, None, key)])
            }
            [only] => Ok(vec![enrich(chip, Some(*only), None)]),
            [first, ..] => match self.overlap {
                OverlapPolicy::First => Ok(vec![enrich(chip, Some(*first), None)]),
                OverlapPolicy::All => Ok(matches.iter().map(|aoi| enrich(chip, Some(*aoi), None)).collect()),
                OverlapPolicy::Reject => Err(Sn7Error::AmbiguousAoi {
                    count: matches.len(),
                    aoi_ids: matches.iter().map(|a| a.aoi_id.as_str()).collect::<Vec<_>>().join(", "),
                }),
            },
        }
    }
}

fn enrich(chip: &ResolvedChip, aoi: Option<&AoiPolygon>, key: Option<String>) -> EnrichedChipRecord {
    EnrichedChipRecord {
        row_index: chip.row_index,
        building_id: chip.building_id,
        chip: chip.chip.clone(),
        geometry: chip.geometry.clone(),
        aoi_id: aoi.map(|a| a.aoi_id.clone()).or(key),
        aoi_name: aoi.map(|a| a.name.clone()),
        aoi_geometry: aoi.map(|a| a.boundary.clone()),
    }
}
