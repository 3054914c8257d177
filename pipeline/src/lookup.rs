//! Static reference data used by the pipeline: the affix list for station
//! name normalization, manual coordinate and line fixes for records the
//! automatic passes cannot resolve, and the district key table.

use common::types::DistrictId;

/// Affixes stripped from raw station names, in application order. Longer
/// variants come before their prefixes so that e.g. "Bahnhof Berlin " wins
/// over "Bahnhof ".
pub const NAME_AFFIXES: [&str; 6] = [
    "U-Bahnhof ",
    "S-Bahnhof ",
    "Bahnhöfe Berlin ",
    "Bahnhof Berlin ",
    "Bahnhof ",
    "Berlin-",
];

/// Stations whose coordinates never resolve through the station join in the
/// source data. Applied after the join and unconditionally.
pub const COORDINATE_OVERRIDES: [(&str, f64, f64); 12] = [
    ("Ostkreuz", 52.50278, 13.46917),
    ("Warschauer Straße", 52.50580, 13.44880),
    ("Schlesisches Tor", 52.50055, 13.44178),
    ("Gesundbrunnen", 52.54874, 13.38857),
    ("Jungfernheide", 52.53048, 13.29947),
    ("Westkreuz", 52.50117, 13.28333),
    ("Südkreuz", 52.47553, 13.36540),
    ("Ostbahnhof", 52.51050, 13.43457),
    ("Potsdamer Platz", 52.50935, 13.37567),
    ("Hauptbahnhof", 52.52493, 13.36963),
    ("Friedrichstraße", 52.52033, 13.38692),
    ("Zoologischer Garten", 52.50715, 13.33212),
];

/// Known gaps where the canonical line cannot be derived from the source
/// data. Applied unconditionally after the line-format filter.
pub const LINE_CORRECTIONS: [(&str, &str); 3] = [
    ("Grenzallee", "U7"),
    ("Museumsinsel", "U5"),
    ("Brandenburger Tor", "U5"),
];

/// The twelve administrative districts in canonical order, keyed by their
/// official two-digit codes.
pub const DISTRICTS: [(&str, DistrictId); 12] = [
    ("Mitte", DistrictId(1)),
    ("Friedrichshain-Kreuzberg", DistrictId(2)),
    ("Pankow", DistrictId(3)),
    ("Charlottenburg-Wilmersdorf", DistrictId(4)),
    ("Spandau", DistrictId(5)),
    ("Steglitz-Zehlendorf", DistrictId(6)),
    ("Tempelhof-Schöneberg", DistrictId(7)),
    ("Neukölln", DistrictId(8)),
    ("Treptow-Köpenick", DistrictId(9)),
    ("Marzahn-Hellersdorf", DistrictId(10)),
    ("Lichtenberg", DistrictId(11)),
    ("Reinickendorf", DistrictId(12)),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn district_ids_cover_01_through_12() {
        let mut codes: Vec<String> = DISTRICTS.iter().map(|(_, id)| id.as_code()).collect();
        codes.sort();
        let expected: Vec<String> = (1..=12).map(|n| format!("{:02}", n)).collect();
        assert_eq!(codes, expected);
    }

    #[test]
    fn district_names_are_unique() {
        let mut names: Vec<&str> = DISTRICTS.iter().map(|(name, _)| *name).collect();
        names.sort();
        let len_before = names.len();
        names.dedup();
        assert_eq!(names.len(), len_before);
    }

    #[test]
    fn ostkreuz_override_is_present() {
        let (_, lat, lon) = COORDINATE_OVERRIDES.iter()
            .find(|(name, _, _)| *name == "Ostkreuz")
            .unwrap();
        assert_eq!((*lat, *lon), (52.50278, 13.46917));
    }
}
