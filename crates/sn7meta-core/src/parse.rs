//! SpaceNet7 chip filename parser
//!
//! Filenames follow the fixed pattern
//! `<mosaic-prefix>_mosaic_L<zoom>-<tileX>E-<tileY>N_<utmX>_<utmY>_<utmZone>`,
//! where the mosaic prefix embeds a `YYYY_MM` acquisition month, e.g.
//! `global_monthly_2018_01_mosaic_L15-0331E-1257N_1327_3160_13`.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{Result, Sn7Error};
use crate::models::ParsedChipIdentifier;

const MOSAIC_SEPARATOR: &str = "_mosaic_";
const ZOOM_MARKER: char = 'L';

static YEAR_MONTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})_(\d{2})").expect("year/month pattern is valid"));

/// Parse one chip filename into a [`ParsedChipIdentifier`].
///
/// Leading directories and a trailing file extension are ignored. Parsing is
/// pure: the same input always yields an identical identifier.
pub fn parse_chip_filename(filename: &str) -> Result<ParsedChipIdentifier> {
    let name = strip_path_and_extension(filename);

    let segments: Vec<&str> = name.split(MOSAIC_SEPARATOR).collect();
    let (mosaic, chip) = match segments.as_slice() {
        [mosaic, chip] if !mosaic.is_empty() && !chip.is_empty() => (*mosaic, *chip),
        [_] => return Err(Sn7Error::malformed(filename, "missing '_mosaic_' separator")),
        [_, _] => return Err(Sn7Error::malformed(filename, "empty mosaic or chip segment")),
        _ => return Err(Sn7Error::malformed(filename, "'_mosaic_' separator appears more than once")),
    };

    let (year, month) = parse_year_month(filename, mosaic)?;

    let chip_core = chip
        .strip_prefix(ZOOM_MARKER)
        .ok_or_else(|| Sn7Error::malformed(filename, "chip segment does not start with 'L'"))?;

    let (zoom_token, rest) = chip_core
        .split_once('-')
        .ok_or_else(|| Sn7Error::malformed(filename, "missing '-' after zoom level"))?;
    let zoom = parse_number(filename, "zoom", zoom_token)?;

    let tokens: Vec<&str> = rest.split(['-', '_']).collect();
    let [tile_e, tile_n, utm_x, utm_y, utm_zone] = tokens.as_slice() else {
        return Err(Sn7Error::malformed(
            filename,
            format!("expected 5 tile/UTM tokens, found {}", tokens.len()),
        ));
    };

    let tile_x = tile_e
        .strip_suffix('E')
        .ok_or_else(|| Sn7Error::malformed(filename, "tile column must end with 'E'"))
        .and_then(|t| parse_number(filename, "tile_x", t))?;
    let tile_y = tile_n
        .strip_suffix('N')
        .ok_or_else(|| Sn7Error::malformed(filename, "tile row must end with 'N'"))
        .and_then(|t| parse_number(filename, "tile_y", t))?;

    Ok(ParsedChipIdentifier {
        mosaic: mosaic.to_string(),
        year,
        month,
        chip_id: chip.to_string(),
        zoom,
        tile_x,
        tile_y,
        utm_x: parse_number(filename, "utm_x", utm_x)?,
        utm_y: parse_number(filename, "utm_y", utm_y)?,
        utm_zone: parse_number(filename, "utm_zone", utm_zone)?,
        aoi_id: mosaic.to_string(),
    })
}

fn strip_path_and_extension(filename: &str) -> &str {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    match base.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            stem
        }
        _ => base,
    }
}

fn parse_year_month(filename: &str, mosaic: &str) -> Result<(i32, u32)> {
    let captures = YEAR_MONTH
        .captures(mosaic)
        .ok_or_else(|| Sn7Error::malformed(filename, "mosaic segment has no YYYY_MM date"))?;

    let year: i32 = captures[1]
        .parse()
        .map_err(|_| Sn7Error::malformed(filename, "year is not numeric"))?;
    let month: u32 = captures[2]
        .parse()
        .map_err(|_| Sn7Error::malformed(filename, "month is not numeric"))?;

    if !(1..=12).contains(&month) {
        return Err(Sn7Error::malformed(filename, format!("month {} is outside 1-12", month)));
    }

    Ok((year, month))
}

fn parse_number(filename: &str, field: &str, token: &str) -> Result<u32> {
    token.parse::<u32>().map_err(|_| {
        Sn7Error::malformed(filename, format!("{} '{}' is not a non-negative integer", field, token))
    })
}
