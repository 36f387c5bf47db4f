//! DDMM.mmmmmm ↔ decimal-degree coordinate conversion.
//!
//! Latitude uses 2-digit degrees, longitude uses 3-digit degrees; both carry
//! 6 fractional minute digits on the wire. Hemisphere is a literal sign
//! character (`N`/`S`, `E`/`W`), never folded into the numeric sign.

/// Hemisphere sign for a latitude field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatSign {
    North,
    South,
}

/// Hemisphere sign for a longitude field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LonSign {
    East,
    West,
}

impl LatSign {
    pub fn as_char(self) -> char {
        match self {
            LatSign::North => 'N',
            LatSign::South => 'S',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'N' => Some(LatSign::North),
            'S' => Some(LatSign::South),
            _ => None,
        }
    }
}

impl LonSign {
    pub fn as_char(self) -> char {
        match self {
            LonSign::East => 'E',
            LonSign::West => 'W',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'E' => Some(LonSign::East),
            'W' => Some(LonSign::West),
            _ => None,
        }
    }
}

/// Convert decimal latitude to (`DDMM.mmmmmm`, sign).
pub fn lat_to_ddmm(decimal: f64) -> (String, LatSign) {
    let sign = if decimal < 0.0 { LatSign::South } else { LatSign::North };
    (ddmm(decimal.abs(), 2), sign)
}

/// Convert decimal longitude to (`DDDMM.mmmmmm`, sign).
pub fn lon_to_ddmm(decimal: f64) -> (String, LonSign) {
    let sign = if decimal < 0.0 { LonSign::West } else { LonSign::East };
    (ddmm(decimal.abs(), 3), sign)
}

fn ddmm(abs_decimal: f64, degree_digits: usize) -> String {
    let degrees = abs_decimal.trunc() as u32;
    let minutes = (abs_decimal - degrees as f64) * 60.0;
    format!("{degrees:0width$}{minutes:09.6}", width = degree_digits)
}

/// Convert a `DDMM.mmmmmm` / `DDDMM.mmmmmm` field plus hemisphere sign back
/// to signed decimal degrees.
pub fn ddmm_to_decimal(deg_min: &str, is_latitude: bool) -> Option<f64> {
    let degree_digits = if is_latitude { 2 } else { 3 };
    if deg_min.len() < degree_digits + 1 {
        return None;
    }
    let degrees: f64 = deg_min[..degree_digits].parse().ok()?;
    let minutes: f64 = deg_min[degree_digits..].parse().ok()?;
    Some(degrees + minutes / 60.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lat_round_trip_north() {
        let (ddmm, sign) = lat_to_ddmm(53.918_210);
        assert_eq!(sign, LatSign::North);
        let back = ddmm_to_decimal(&ddmm, true).unwrap();
        assert!((back - 53.918_210).abs() < 1e-6);
    }

    #[test]
    fn lon_round_trip_negative_is_west() {
        let (ddmm, sign) = lon_to_ddmm(-27.540_165);
        assert_eq!(sign, LonSign::West);
        let back = ddmm_to_decimal(&ddmm, false).unwrap();
        assert!((back - 27.540_165).abs() < 1e-6);
    }

    #[test]
    fn scenario_extended_data_latitude() {
        // 5355.09260;N → 53 + 55.09260/60
        let dec = ddmm_to_decimal("5355.09260", true).unwrap();
        assert!((dec - 53.9182).abs() < 1e-4);
    }

    #[test]
    fn scenario_extended_data_longitude() {
        // 02732.40990;E → 27 + 32.40990/60
        let dec = ddmm_to_decimal("02732.40990", false).unwrap();
        assert!((dec - 27.5402).abs() < 1e-4);
    }

    #[test]
    fn degree_padding_widths() {
        let (ddmm, _) = lat_to_ddmm(5.0);
        assert!(ddmm.starts_with("05"));
        let (ddmm, _) = lon_to_ddmm(5.0);
        assert!(ddmm.starts_with("005"));
    }
}
