//! Fixed rectangular regions around sampled pixels

use crate::error::{ProcessorError, Result};
use crate::types::frame_batch::FrameShape;
use crate::types::pixel_spec::{Coordinate, PixelSpec};
use itertools::{Itertools, MinMaxResult};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Box dimensions as a `(box_height, box_width)` pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxSize {
    pub height: usize,
    pub width: usize,
}

impl From<(usize, usize)> for BoxSize {
    fn from((height, width): (usize, usize)) -> Self {
        Self { height, width }
    }
}

/// One inclusive rectangle, in signed coordinates so that regions hanging
/// over the top or left edge can still be described.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BoxRegion {
    pub center: Coordinate,
    pub rows: (isize, isize),
    pub cols: (isize, isize),
}

impl BoxRegion {
    pub fn area(&self) -> usize {
        ((self.rows.1 - self.rows.0 + 1) * (self.cols.1 - self.cols.0 + 1)) as usize
    }

    pub fn fits(&self, frame: &FrameShape) -> bool {
        self.rows.0 >= 0
            && self.cols.0 >= 0
            && (self.rows.1 as usize) < frame.height
            && (self.cols.1 as usize) < frame.width
    }

    /// Row indices covered by the region. Only meaningful once `fits` holds.
    pub fn row_range(&self) -> RangeInclusive<usize> {
        self.rows.0 as usize..=self.rows.1 as usize
    }

    /// Column indices covered by the region. Only meaningful once `fits` holds.
    pub fn col_range(&self) -> RangeInclusive<usize> {
        self.cols.0 as usize..=self.cols.1 as usize
    }

    fn out_of_bounds(&self, frame: &FrameShape) -> ProcessorError {
        ProcessorError::OutOfBounds {
            row: self.center.row,
            col: self.center.col,
            rows: self.rows,
            cols: self.cols,
            height: frame.height,
            width: frame.width,
        }
    }
}

/// Regions for every pixel of a `PixelSpec`, computed once.
///
/// With `off_h = box_height / 2` and `off_v = box_width / 2`, the region of
/// pixel `(row, col)` is `[row - off_v, row + off_v] x [col - off_h, col + off_h]`.
/// `off_h` therefore spans columns and `off_v` spans rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxGeometry {
    size: BoxSize,
    regions: Vec<BoxRegion>,
}

impl BoxGeometry {
    pub fn new(pixels: &PixelSpec, size: BoxSize) -> Result<Self> {
        if size.height == 0 || size.width == 0 {
            return Err(ProcessorError::InvalidConfig(format!(
                "box size must be positive, got {}x{}",
                size.height, size.width
            )));
        }

        let off_h = (size.height / 2) as isize;
        let off_v = (size.width / 2) as isize;
        let regions = pixels
            .iter()
            .map(|&center| {
                let (row, col) = (center.row as isize, center.col as isize);
                BoxRegion {
                    center,
                    rows: (row - off_v, row + off_v),
                    cols: (col - off_h, col + off_h),
                }
            })
            .collect();

        Ok(Self { size, regions })
    }

    pub fn size(&self) -> BoxSize {
        self.size
    }

    pub fn regions(&self) -> &[BoxRegion] {
        &self.regions
    }

    /// Number of pixels inside every region.
    pub fn area(&self) -> usize {
        self.regions.first().map(BoxRegion::area).unwrap_or(0)
    }

    /// Bounding rectangle `(rows, cols)` of all regions together.
    pub fn extent(&self) -> Option<((isize, isize), (isize, isize))> {
        let rows = self.regions.iter().flat_map(|r| [r.rows.0, r.rows.1]).minmax();
        let cols = self.regions.iter().flat_map(|r| [r.cols.0, r.cols.1]).minmax();
        match (rows, cols) {
            (MinMaxResult::MinMax(r0, r1), MinMaxResult::MinMax(c0, c1)) => Some(((r0, r1), (c0, c1))),
            (MinMaxResult::OneElement(r), MinMaxResult::OneElement(c)) => Some(((r, r), (c, c))),
            _ => None,
        }
    }

    /// Fails with `OutOfBounds` naming the first region that leaves `frame`.
    pub fn check_within(&self, frame: &FrameShape) -> Result<()> {
        let inside = match self.extent() {
            Some(((r0, r1), (c0, c1))) => {
                r0 >= 0 && c0 >= 0 && (r1 as usize) < frame.height && (c1 as usize) < frame.width
            }
            None => true,
        };
        if inside {
            return Ok(());
        }

        match self.regions.iter().find(|r| !r.fits(frame)) {
            Some(region) => Err(region.out_of_bounds(frame)),
            None => Ok(()),
        }
    }
}
