//! Spatial values and the `PointProperty` descriptor.
//!
//! Neo4j supports two families of POINT values: points on a Cartesian
//! plane (`cartesian`, `cartesian-3d`) and points on the WGS-84
//! ellipsoid (`wgs-84`, `wgs-84-3d`). A [`NeomodelPoint`] always knows
//! its CRS, and coordinate accessors are gated on it: `x`/`y`/`z` only
//! exist for Cartesian points, `longitude`/`latitude`/`height` only for
//! geographic ones.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::model::Value;
use crate::properties::{PropertyOptions, PropertyType};
use crate::{Error, Result};

// ============================================================================
// Coordinate Reference Systems
// ============================================================================

/// Coordinate Reference Systems accepted by Neo4j POINT values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Crs {
    Cartesian,
    Cartesian3d,
    Wgs84,
    Wgs843d,
}

impl Crs {
    pub const ALL: [Crs; 4] = [Crs::Cartesian, Crs::Cartesian3d, Crs::Wgs84, Crs::Wgs843d];

    pub fn as_str(&self) -> &'static str {
        match self {
            Crs::Cartesian => "cartesian",
            Crs::Cartesian3d => "cartesian-3d",
            Crs::Wgs84 => "wgs-84",
            Crs::Wgs843d => "wgs-84-3d",
        }
    }

    /// The SRID this CRS is tagged with on the wire.
    pub fn srid(&self) -> i64 {
        match self {
            Crs::Cartesian => 7203,
            Crs::Cartesian3d => 9157,
            Crs::Wgs84 => 4326,
            Crs::Wgs843d => 4979,
        }
    }

    pub fn from_srid(srid: i64) -> Result<Crs> {
        match srid {
            7203 => Ok(Crs::Cartesian),
            9157 => Ok(Crs::Cartesian3d),
            4326 => Ok(Crs::Wgs84),
            4979 => Ok(Crs::Wgs843d),
            other => Err(Error::Spatial(format!(
                "Invalid SRID({other}). Expected one of 7203, 9157, 4326, 4979"
            ))),
        }
    }

    pub fn is_3d(&self) -> bool {
        matches!(self, Crs::Cartesian3d | Crs::Wgs843d)
    }

    pub fn is_cartesian(&self) -> bool {
        matches!(self, Crs::Cartesian | Crs::Cartesian3d)
    }

    pub fn is_geographic(&self) -> bool {
        matches!(self, Crs::Wgs84 | Crs::Wgs843d)
    }

    fn acceptable() -> String {
        Crs::ALL
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Crs {
    type Err = Error;

    fn from_str(s: &str) -> Result<Crs> {
        match s {
            "cartesian" => Ok(Crs::Cartesian),
            "cartesian-3d" => Ok(Crs::Cartesian3d),
            "wgs-84" => Ok(Crs::Wgs84),
            "wgs-84-3d" => Ok(Crs::Wgs843d),
            other => Err(Error::Spatial(format!(
                "Invalid CRS({other}). Expected one of {}",
                Crs::acceptable()
            ))),
        }
    }
}

// ============================================================================
// NeomodelPoint
// ============================================================================

/// A POINT value tagged with its CRS.
///
/// The variant fixes both the coordinate family and the dimensionality,
/// so a point can never hold coordinates that disagree with its CRS.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PointRepr", into = "PointRepr")]
pub enum NeomodelPoint {
    Cartesian { x: f64, y: f64 },
    Cartesian3d { x: f64, y: f64, z: f64 },
    Wgs84 { longitude: f64, latitude: f64 },
    Wgs843d { longitude: f64, latitude: f64, height: f64 },
}

impl NeomodelPoint {
    pub fn cartesian(x: f64, y: f64) -> Self {
        NeomodelPoint::Cartesian { x, y }
    }

    pub fn cartesian_3d(x: f64, y: f64, z: f64) -> Self {
        NeomodelPoint::Cartesian3d { x, y, z }
    }

    pub fn wgs84(longitude: f64, latitude: f64) -> Self {
        NeomodelPoint::Wgs84 { longitude, latitude }
    }

    pub fn wgs84_3d(longitude: f64, latitude: f64, height: f64) -> Self {
        NeomodelPoint::Wgs843d { longitude, latitude, height }
    }

    /// Build a point from a bare coordinate sequence.
    ///
    /// Without an explicit CRS the arity decides: 2 coordinates are
    /// `cartesian`, 3 are `cartesian-3d`. With an explicit geographic
    /// CRS the sequence is read as `(longitude, latitude[, height])`.
    pub fn from_coords(coords: &[f64], crs: Option<Crs>) -> Result<Self> {
        if coords.len() < 2 || coords.len() > 3 {
            return Err(Error::Spatial(format!(
                "Invalid vector dimensions. Expected 2 or 3, received {}",
                coords.len()
            )));
        }
        let crs = match crs {
            Some(c) => {
                if c.is_3d() != (coords.len() == 3) {
                    return Err(Error::Spatial(format!(
                        "Invalid vector dimensions({}) for given CRS({c})",
                        coords.len()
                    )));
                }
                c
            }
            None => {
                if coords.len() == 3 { Crs::Cartesian3d } else { Crs::Cartesian }
            }
        };
        Ok(match crs {
            Crs::Cartesian => NeomodelPoint::cartesian(coords[0], coords[1]),
            Crs::Cartesian3d => NeomodelPoint::cartesian_3d(coords[0], coords[1], coords[2]),
            Crs::Wgs84 => NeomodelPoint::wgs84(coords[0], coords[1]),
            Crs::Wgs843d => NeomodelPoint::wgs84_3d(coords[0], coords[1], coords[2]),
        })
    }

    /// Build a point from wire data: an SRID plus coordinates in wire
    /// axis order.
    pub fn from_srid_coords(srid: i64, coords: &[f64]) -> Result<Self> {
        let crs = Crs::from_srid(srid)?;
        Self::from_coords(coords, Some(crs))
    }

    pub fn crs(&self) -> Crs {
        match self {
            NeomodelPoint::Cartesian { .. } => Crs::Cartesian,
            NeomodelPoint::Cartesian3d { .. } => Crs::Cartesian3d,
            NeomodelPoint::Wgs84 { .. } => Crs::Wgs84,
            NeomodelPoint::Wgs843d { .. } => Crs::Wgs843d,
        }
    }

    pub fn srid(&self) -> i64 {
        self.crs().srid()
    }

    /// Coordinates in wire axis order: `[x, y[, z]]` for Cartesian
    /// points, `[longitude, latitude[, height]]` for geographic ones.
    pub fn coords(&self) -> SmallVec<[f64; 3]> {
        match *self {
            NeomodelPoint::Cartesian { x, y } => SmallVec::from_slice(&[x, y]),
            NeomodelPoint::Cartesian3d { x, y, z } => SmallVec::from_slice(&[x, y, z]),
            NeomodelPoint::Wgs84 { longitude, latitude } => SmallVec::from_slice(&[longitude, latitude]),
            NeomodelPoint::Wgs843d { longitude, latitude, height } => {
                SmallVec::from_slice(&[longitude, latitude, height])
            }
        }
    }

    fn invalid_coordinate(&self, coordinate: &str) -> Error {
        Error::Spatial(format!(
            "Invalid coordinate (\"{coordinate}\") for points defined over {}",
            self.crs()
        ))
    }

    pub fn x(&self) -> Result<f64> {
        match *self {
            NeomodelPoint::Cartesian { x, .. } | NeomodelPoint::Cartesian3d { x, .. } => Ok(x),
            _ => Err(self.invalid_coordinate("x")),
        }
    }

    pub fn y(&self) -> Result<f64> {
        match *self {
            NeomodelPoint::Cartesian { y, .. } | NeomodelPoint::Cartesian3d { y, .. } => Ok(y),
            _ => Err(self.invalid_coordinate("y")),
        }
    }

    pub fn z(&self) -> Result<f64> {
        match *self {
            NeomodelPoint::Cartesian3d { z, .. } => Ok(z),
            _ => Err(self.invalid_coordinate("z")),
        }
    }

    pub fn longitude(&self) -> Result<f64> {
        match *self {
            NeomodelPoint::Wgs84 { longitude, .. } | NeomodelPoint::Wgs843d { longitude, .. } => {
                Ok(longitude)
            }
            _ => Err(self.invalid_coordinate("longitude")),
        }
    }

    pub fn latitude(&self) -> Result<f64> {
        match *self {
            NeomodelPoint::Wgs84 { latitude, .. } | NeomodelPoint::Wgs843d { latitude, .. } => {
                Ok(latitude)
            }
            _ => Err(self.invalid_coordinate("latitude")),
        }
    }

    pub fn height(&self) -> Result<f64> {
        match *self {
            NeomodelPoint::Wgs843d { height, .. } => Ok(height),
            _ => Err(self.invalid_coordinate("height")),
        }
    }
}

// ============================================================================
// Named-coordinate construction
// ============================================================================

/// Builds a point from named coordinates.
///
/// Exactly one coordinate family may be used: `x`/`y`[/`z`] or
/// `longitude`/`latitude`[/`height`]. Mixing the families or supplying
/// neither fails, as does an explicit CRS whose dimensionality
/// disagrees with the coordinates actually given.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointBuilder {
    crs: Option<Crs>,
    x: Option<f64>,
    y: Option<f64>,
    z: Option<f64>,
    longitude: Option<f64>,
    latitude: Option<f64>,
    height: Option<f64>,
}

impl NeomodelPoint {
    pub fn build() -> PointBuilder {
        PointBuilder::default()
    }
}

impl PointBuilder {
    pub fn crs(mut self, crs: Crs) -> Self {
        self.crs = Some(crs);
        self
    }

    pub fn x(mut self, x: f64) -> Self {
        self.x = Some(x);
        self
    }

    pub fn y(mut self, y: f64) -> Self {
        self.y = Some(y);
        self
    }

    pub fn z(mut self, z: f64) -> Self {
        self.z = Some(z);
        self
    }

    pub fn longitude(mut self, longitude: f64) -> Self {
        self.longitude = Some(longitude);
        self
    }

    pub fn latitude(mut self, latitude: f64) -> Self {
        self.latitude = Some(latitude);
        self
    }

    pub fn height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    pub fn finish(self) -> Result<NeomodelPoint> {
        let cartesian = [self.x, self.y, self.z].iter().any(Option::is_some);
        let geographic = [self.longitude, self.latitude, self.height]
            .iter()
            .any(Option::is_some);
        if cartesian && geographic {
            return Err(Error::Spatial(
                "Invalid instantiation via arguments. A Point can be defined either by \
                 x,y,z coordinates OR longitude,latitude,height but not a combination of \
                 these terms"
                    .to_string(),
            ));
        }
        if !cartesian && !geographic {
            return Err(Error::Spatial(
                "Invalid instantiation via no arguments. A Point needs values either in \
                 x,y,z or longitude,latitude,height coordinates"
                    .to_string(),
            ));
        }

        let (first, second, third, inferred) = if cartesian {
            (self.x, self.y, self.z, (Crs::Cartesian, Crs::Cartesian3d))
        } else {
            (self.longitude, self.latitude, self.height, (Crs::Wgs84, Crs::Wgs843d))
        };
        let (Some(first), Some(second)) = (first, second) else {
            return Err(Error::Spatial(
                "Invalid instantiation via arguments. A Point needs both of its planar \
                 coordinates"
                    .to_string(),
            ));
        };
        let mut coords: SmallVec<[f64; 3]> = SmallVec::from_slice(&[first, second]);
        if let Some(third) = third {
            coords.push(third);
        }
        let crs = self
            .crs
            .unwrap_or(if third.is_some() { inferred.1 } else { inferred.0 });
        NeomodelPoint::from_coords(&coords, Some(crs))
    }
}

impl fmt::Display for NeomodelPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            NeomodelPoint::Cartesian { x, y } => {
                write!(f, "point({{srid: 7203, x: {x}, y: {y}}})")
            }
            NeomodelPoint::Cartesian3d { x, y, z } => {
                write!(f, "point({{srid: 9157, x: {x}, y: {y}, z: {z}}})")
            }
            NeomodelPoint::Wgs84 { longitude, latitude } => {
                write!(f, "point({{srid: 4326, longitude: {longitude}, latitude: {latitude}}})")
            }
            NeomodelPoint::Wgs843d { longitude, latitude, height } => write!(
                f,
                "point({{srid: 4979, longitude: {longitude}, latitude: {latitude}, height: {height}}})"
            ),
        }
    }
}

/// Wire shape of a POINT: SRID plus coordinates in wire axis order.
#[derive(Serialize, Deserialize)]
struct PointRepr {
    srid: i64,
    coordinates: SmallVec<[f64; 3]>,
}

impl From<NeomodelPoint> for PointRepr {
    fn from(point: NeomodelPoint) -> Self {
        PointRepr { srid: point.srid(), coordinates: point.coords() }
    }
}

impl TryFrom<PointRepr> for NeomodelPoint {
    type Error = Error;

    fn try_from(repr: PointRepr) -> Result<Self> {
        NeomodelPoint::from_srid_coords(repr.srid, &repr.coordinates)
    }
}

// ============================================================================
// PointProperty
// ============================================================================

/// Descriptor for POINT-valued properties, pinned to one CRS.
#[derive(Debug, Clone)]
pub struct PointProperty {
    options: PropertyOptions,
    crs: Crs,
}

impl PointProperty {
    /// A point property must know its CRS to validate values.
    pub fn new(crs: Crs) -> Self {
        PointProperty { options: PropertyOptions::default(), crs }
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    crate::properties::property_builder_methods!();
}

impl PropertyType for PointProperty {
    fn options(&self) -> &PropertyOptions {
        &self.options
    }

    fn type_name(&self) -> &'static str {
        "point"
    }

    fn setup(&self) -> std::result::Result<(), String> {
        if let Some(default) = self.options.literal_default() {
            if !matches!(default, Value::Point(_)) {
                return Err(format!(
                    "Invalid default value. Expected NeomodelPoint, received {}",
                    default.type_name()
                ));
            }
        }
        Ok(())
    }

    fn inflate(&self, value: &Value) -> std::result::Result<Value, String> {
        let point = match value {
            Value::Point(p) => p,
            other => {
                return Err(format!(
                    "Invalid datatype to inflate. Expected POINT datatype, received {}",
                    other.type_name()
                ));
            }
        };
        if point.crs() != self.crs {
            return Err(format!(
                "Invalid CRS. Expected POINT defined over {}, received {}",
                self.crs,
                point.crs()
            ));
        }
        Ok(Value::Point(*point))
    }

    fn deflate(&self, value: &Value) -> std::result::Result<Value, String> {
        let point = match value {
            Value::Point(p) => p,
            other => {
                return Err(format!(
                    "Invalid datatype to deflate. Expected NeomodelPoint, received {}",
                    other.type_name()
                ));
            }
        };
        if point.crs() != self.crs {
            return Err(format!(
                "Invalid CRS. Expected NeomodelPoint defined over {}, received NeomodelPoint defined over {}",
                self.crs,
                point.crs()
            ));
        }
        Ok(Value::Point(*point))
    }
}
