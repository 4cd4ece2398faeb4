//! Pixel coordinates sampled by the extractors

use crate::error::{ProcessorError, Result};
use crate::types::frame_batch::FrameShape;
use bon::Builder;
use serde::{Deserialize, Serialize};

/// Represents a 2D coordinate using row and column.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Builder)]
pub struct Coordinate {
    pub row: usize,
    pub col: usize,
}

impl From<(usize, usize)> for Coordinate {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

impl Coordinate {
    pub fn is_within(&self, frame: &FrameShape) -> bool {
        self.row < frame.height && self.col < frame.width
    }
}

/// Ordered list of sampling locations.
///
/// The order is fixed at construction and is the order of the pixel axis in
/// every extracted result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Coordinate>", into = "Vec<Coordinate>")]
pub struct PixelSpec {
    coordinates: Vec<Coordinate>,
}

impl PixelSpec {
    pub fn new<I, C>(coordinates: I) -> Result<Self>
    where
        I: IntoIterator<Item = C>,
        C: Into<Coordinate>,
    {
        let coordinates: Vec<Coordinate> = coordinates.into_iter().map(Into::into).collect();
        if coordinates.is_empty() {
            return Err(ProcessorError::InvalidConfig(
                "at least one pixel coordinate is required".to_string(),
            ));
        }
        Ok(Self { coordinates })
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coordinate> + '_ {
        self.coordinates.iter()
    }

    pub fn as_slice(&self) -> &[Coordinate] {
        &self.coordinates
    }

    /// Fails with `OutOfBounds` on the first coordinate that lies outside `frame`.
    pub fn check_within(&self, frame: &FrameShape) -> Result<()> {
        match self.iter().find(|c| !c.is_within(frame)) {
            Some(c) => Err(ProcessorError::OutOfBounds {
                row: c.row,
                col: c.col,
                rows: (c.row as isize, c.row as isize),
                cols: (c.col as isize, c.col as isize),
                height: frame.height,
                width: frame.width,
            }),
            None => Ok(()),
        }
    }
}

impl TryFrom<Vec<Coordinate>> for PixelSpec {
    type Error = ProcessorError;

    fn try_from(coordinates: Vec<Coordinate>) -> Result<Self> {
        Self::new(coordinates)
    }
}

impl From<PixelSpec> for Vec<Coordinate> {
    fn from(spec: PixelSpec) -> Self {
        spec.coordinates
    }
}

impl<'a> IntoIterator for &'a PixelSpec {
    type Item = &'a Coordinate;
    type IntoIter = std::slice::Iter<'a, Coordinate>;

    fn into_iter(self) -> Self::IntoIter {
        self.coordinates.iter()
    }
}
