//! Position variant family.
//!
//! The tag of each channel's position is stored in the index block; only the
//! payload is written in the locations field group.

use std::io::{Read, Write};

use byteorder::{ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};
use crate::primitives::{
    read_counted_pod_vec, read_f64, read_string, write_f64, write_pod_vec, write_string,
};
use crate::scratch::Scratch;

pub const POSITION_GENERIC: u8 = 0;
pub const POSITION_GEOGRAPHIC: u8 = 1;
pub const POSITION_UTM: u8 = 2;
pub const POSITION_CARTESIAN: u8 = 3;
pub const POSITION_NODAL: u8 = 4;

/// Free-form coordinate vector with a datum label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenericLoc {
    pub datum: String,
    pub coords: Vec<f64>,
}

/// Latitude/longitude position with elevation, depth, and sensor orientation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoLoc {
    pub datum: String,
    pub lat: f64,
    pub lon: f64,
    pub el: f64,
    pub dep: f64,
    pub az: f64,
    pub inc: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UtmLoc {
    pub datum: String,
    pub zone: i8,
    /// `b'N'` or `b'S'`.
    pub hemisphere: u8,
    pub easting: f64,
    pub northing: f64,
    pub el: f64,
    pub dep: f64,
    pub az: f64,
    pub inc: f64,
}

impl Default for UtmLoc {
    fn default() -> Self {
        Self {
            datum: String::new(),
            zone: 0,
            hemisphere: b'N',
            easting: 0.0,
            northing: 0.0,
            el: 0.0,
            dep: 0.0,
            az: 0.0,
            inc: 0.0,
        }
    }
}

/// Local Cartesian position relative to an origin `(ox, oy, oz)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XyLoc {
    pub datum: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub ox: f64,
    pub oy: f64,
    pub oz: f64,
    pub az: f64,
    pub inc: f64,
}

/// Position along a nodal array (e.g. fiber distance).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NodalLoc {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Position {
    Generic(GenericLoc),
    Geographic(GeoLoc),
    Utm(UtmLoc),
    Cartesian(XyLoc),
    Nodal(NodalLoc),
}

impl Default for Position {
    fn default() -> Self {
        Self::Geographic(GeoLoc::default())
    }
}

impl Position {
    pub const FAMILY: &'static str = "position";

    pub fn tag(&self) -> u8 {
        match self {
            Self::Generic(_) => POSITION_GENERIC,
            Self::Geographic(_) => POSITION_GEOGRAPHIC,
            Self::Utm(_) => POSITION_UTM,
            Self::Cartesian(_) => POSITION_CARTESIAN,
            Self::Nodal(_) => POSITION_NODAL,
        }
    }

    /// Fails with `UnknownVariantTag` if `tag` is not a position tag.
    pub fn check_tag(tag: u8) -> Result<()> {
        if tag <= POSITION_NODAL {
            Ok(())
        } else {
            Err(Error::UnknownVariantTag {
                family: Self::FAMILY,
                tag,
            })
        }
    }

    pub fn encode<W: Write>(&self, w: &mut W) -> Result<()> {
        match self {
            Self::Generic(loc) => {
                write_string(w, &loc.datum)?;
                write_pod_vec(w, &loc.coords)?;
            }
            Self::Geographic(loc) => {
                write_string(w, &loc.datum)?;
                for v in [loc.lat, loc.lon, loc.el, loc.dep, loc.az, loc.inc] {
                    write_f64(w, v)?;
                }
            }
            Self::Utm(loc) => {
                write_string(w, &loc.datum)?;
                w.write_i8(loc.zone)?;
                w.write_u8(loc.hemisphere)?;
                for v in [loc.easting, loc.northing, loc.el, loc.dep, loc.az, loc.inc] {
                    write_f64(w, v)?;
                }
            }
            Self::Cartesian(loc) => {
                write_string(w, &loc.datum)?;
                for v in [loc.x, loc.y, loc.z, loc.ox, loc.oy, loc.oz, loc.az, loc.inc] {
                    write_f64(w, v)?;
                }
            }
            Self::Nodal(loc) => {
                for v in [loc.x, loc.y, loc.z] {
                    write_f64(w, v)?;
                }
            }
        }
        Ok(())
    }

    pub fn decode<R: Read>(tag: u8, r: &mut R, scratch: &mut Scratch) -> Result<Self> {
        let pos = match tag {
            POSITION_GENERIC => Self::Generic(GenericLoc {
                datum: read_string(r, scratch)?,
                coords: read_counted_pod_vec(r, "generic position")?,
            }),
            POSITION_GEOGRAPHIC => {
                let datum = read_string(r, scratch)?;
                let [lat, lon, el, dep, az, inc] = read_f64s(r)?;
                Self::Geographic(GeoLoc {
                    datum,
                    lat,
                    lon,
                    el,
                    dep,
                    az,
                    inc,
                })
            }
            POSITION_UTM => {
                let datum = read_string(r, scratch)?;
                let zone = r.read_i8()?;
                let hemisphere = r.read_u8()?;
                let [easting, northing, el, dep, az, inc] = read_f64s(r)?;
                Self::Utm(UtmLoc {
                    datum,
                    zone,
                    hemisphere,
                    easting,
                    northing,
                    el,
                    dep,
                    az,
                    inc,
                })
            }
            POSITION_CARTESIAN => {
                let datum = read_string(r, scratch)?;
                let [x, y, z, ox, oy, oz, az, inc] = read_f64s(r)?;
                Self::Cartesian(XyLoc {
                    datum,
                    x,
                    y,
                    z,
                    ox,
                    oy,
                    oz,
                    az,
                    inc,
                })
            }
            POSITION_NODAL => {
                let [x, y, z] = read_f64s(r)?;
                Self::Nodal(NodalLoc { x, y, z })
            }
            _ => {
                return Err(Error::UnknownVariantTag {
                    family: Self::FAMILY,
                    tag,
                })
            }
        };
        Ok(pos)
    }
}

fn read_f64s<R: Read, const N: usize>(r: &mut R) -> Result<[f64; N]> {
    let mut out = [0.0; N];
    for v in &mut out {
        *v = read_f64(r)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn tags_are_distinct_and_checked() {
        let all = [
            Position::Generic(GenericLoc::default()),
            Position::Geographic(GeoLoc::default()),
            Position::Utm(UtmLoc::default()),
            Position::Cartesian(XyLoc::default()),
            Position::Nodal(NodalLoc::default()),
        ];
        for (i, p) in all.iter().enumerate() {
            assert_eq!(p.tag() as usize, i);
            Position::check_tag(p.tag()).unwrap();
        }
        assert!(Position::check_tag(5).is_err());
    }

    #[test]
    fn utm_payload_round_trips() {
        let p = Position::Utm(UtmLoc {
            datum: "WGS84".into(),
            zone: 10,
            hemisphere: b'S',
            easting: 500_000.0,
            northing: 4_649_776.2,
            el: 12.5,
            dep: 0.0,
            az: 90.0,
            inc: 0.0,
        });
        let mut buf = Vec::new();
        p.encode(&mut buf).unwrap();
        let back = Position::decode(p.tag(), &mut Cursor::new(&buf), &mut Scratch::new()).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn decode_rejects_unknown_tag() {
        let err = Position::decode(42, &mut Cursor::new(Vec::<u8>::new()), &mut Scratch::new()).unwrap_err();
        assert!(matches!(err, Error::UnknownVariantTag { family: "position", tag: 42 }));
    }
}
