//! Point cloud records and the loader seam used by the playback engine.
//!
//! A sequence directory holds one PCD file per frame. Each frame can be
//! projected into several record kinds (plain geometry, geometry with color,
//! geometry with SIFT descriptors); the player asks a [`RecordLoader`] for
//! each kind it is configured to publish.
//!
//! - `pcd`: PCD v0.7 header and data parsing (ascii and binary)

pub mod pcd;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

pub use pcd::{PcdData, PcdError, PcdHeader};

/// Length of a SIFT descriptor.
pub const SIFT_DESCRIPTOR_LEN: usize = 128;

/// The kinds of record a single frame file can be decoded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// Geometry only (x, y, z).
    Xyz,
    /// Geometry with packed RGB color.
    XyzRgb,
    /// Geometry with a 128-element SIFT descriptor.
    XyzSift,
}

impl RecordKind {
    /// All kinds, in publication order.
    pub const ALL: [RecordKind; 3] = [RecordKind::Xyz, RecordKind::XyzRgb, RecordKind::XyzSift];

    /// Short lowercase name used in config files and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            RecordKind::Xyz => "xyz",
            RecordKind::XyzRgb => "xyzrgb",
            RecordKind::XyzSift => "xyzsift",
        }
    }

    /// Stable slot index for per-kind tables.
    pub fn index(self) -> usize {
        match self {
            RecordKind::Xyz => 0,
            RecordKind::XyzRgb => 1,
            RecordKind::XyzSift => 2,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a record kind name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown record kind '{0}' (expected xyz, xyzrgb or xyzsift)")]
pub struct UnknownKind(pub String);

impl FromStr for RecordKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xyz" => Ok(RecordKind::Xyz),
            "xyzrgb" | "rgb" => Ok(RecordKind::XyzRgb),
            "xyzsift" | "sift" => Ok(RecordKind::XyzSift),
            _ => Err(UnknownKind(s.to_string())),
        }
    }
}

/// A point with position only.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PointXyz {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// A point with position and 8-bit color channels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PointXyzRgb {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// A point with position and a SIFT feature descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct PointXyzSift {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub multiplicity: i32,
    pub point_id: i32,
    pub descriptor: [f32; SIFT_DESCRIPTOR_LEN],
}

/// A decoded frame, one variant per [`RecordKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum Cloud {
    Xyz(Vec<PointXyz>),
    XyzRgb(Vec<PointXyzRgb>),
    XyzSift(Vec<PointXyzSift>),
}

/// Axis-aligned bounding box of a cloud.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Cloud {
    /// The kind this cloud was decoded as.
    pub fn kind(&self) -> RecordKind {
        match self {
            Cloud::Xyz(_) => RecordKind::Xyz,
            Cloud::XyzRgb(_) => RecordKind::XyzRgb,
            Cloud::XyzSift(_) => RecordKind::XyzSift,
        }
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        match self {
            Cloud::Xyz(points) => points.len(),
            Cloud::XyzRgb(points) => points.len(),
            Cloud::XyzSift(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bounding box over finite points, or `None` if there are none.
    pub fn bounds(&self) -> Option<Bounds> {
        let positions: Box<dyn Iterator<Item = [f32; 3]> + '_> = match self {
            Cloud::Xyz(points) => Box::new(points.iter().map(|p| [p.x, p.y, p.z])),
            Cloud::XyzRgb(points) => Box::new(points.iter().map(|p| [p.x, p.y, p.z])),
            Cloud::XyzSift(points) => Box::new(points.iter().map(|p| [p.x, p.y, p.z])),
        };

        let mut bounds: Option<Bounds> = None;
        for pos in positions.filter(|p| p.iter().all(|c| c.is_finite())) {
            let b = bounds.get_or_insert(Bounds { min: pos, max: pos });
            for axis in 0..3 {
                b.min[axis] = b.min[axis].min(pos[axis]);
                b.max[axis] = b.max[axis].max(pos[axis]);
            }
        }
        bounds
    }
}

/// Failure to produce a record from a frame file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot decode {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: PcdError,
    },

    #[error("{0}")]
    Other(String),
}

/// Decodes one frame file into a record of the requested kind.
///
/// Implementations must not keep hold of records they have returned; the
/// player owns them from then on.
pub trait RecordLoader {
    fn load(&self, path: &Path, kind: RecordKind) -> Result<Cloud, LoadError>;
}

impl<F> RecordLoader for F
where
    F: Fn(&Path, RecordKind) -> Result<Cloud, LoadError>,
{
    fn load(&self, path: &Path, kind: RecordKind) -> Result<Cloud, LoadError> {
        self(path, kind)
    }
}

/// Loader backed by the PCD parser in [`pcd`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PcdLoader;

impl RecordLoader for PcdLoader {
    fn load(&self, path: &Path, kind: RecordKind) -> Result<Cloud, LoadError> {
        let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        PcdData::parse_bytes(&bytes)
            .and_then(|data| data.project(kind))
            .map_err(|source| LoadError::Format {
                path: path.to_path_buf(),
                source,
            })
    }
}
