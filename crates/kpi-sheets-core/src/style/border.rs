//! Border style types
//!
//! Borders are stored per cell, separately from the cell's [`Style`](super::Style),
//! so re-applying a format never wipes borders drawn by an earlier pass.

use super::Color;
use crate::cell::{GridAddress, GridRange};

/// Border edges of a single cell
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BorderStyle {
    /// Left border
    pub left: Option<BorderEdge>,
    /// Right border
    pub right: Option<BorderEdge>,
    /// Top border
    pub top: Option<BorderEdge>,
    /// Bottom border
    pub bottom: Option<BorderEdge>,
}

impl BorderStyle {
    /// Create a new border style with no borders
    pub fn new() -> Self {
        Self::default()
    }

    /// Set all borders to the same style
    pub fn all(style: BorderLineStyle, color: Color) -> Self {
        let edge = Some(BorderEdge::new(style, color));
        Self {
            left: edge,
            right: edge,
            top: edge,
            bottom: edge,
        }
    }

    /// Overlay another border style: edges set in `other` win
    pub fn merge(&mut self, other: &BorderStyle) {
        if other.left.is_some() {
            self.left = other.left;
        }
        if other.right.is_some() {
            self.right = other.right;
        }
        if other.top.is_some() {
            self.top = other.top;
        }
        if other.bottom.is_some() {
            self.bottom = other.bottom;
        }
    }

    /// Check if all borders are empty
    pub fn is_empty(&self) -> bool {
        self.left.is_none() && self.right.is_none() && self.top.is_none() && self.bottom.is_none()
    }
}

/// A single border edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BorderEdge {
    /// Line style
    pub style: BorderLineStyle,
    /// Line color
    pub color: Color,
}

impl BorderEdge {
    /// Create a new border edge
    pub const fn new(style: BorderLineStyle, color: Color) -> Self {
        Self { style, color }
    }

    /// Create a solid black border
    pub const fn solid() -> Self {
        Self::new(BorderLineStyle::Solid, Color::BLACK)
    }
}

/// Border line styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BorderLineStyle {
    /// No border
    #[default]
    None,
    /// Thin solid line
    Solid,
    /// Medium solid line
    SolidMedium,
    /// Thick solid line
    SolidThick,
    /// Dashed line
    Dashed,
    /// Dotted line
    Dotted,
    /// Double line
    Double,
}

/// Borders to draw over a whole range.
///
/// `outer` is drawn around the perimeter, `inner` on every edge shared by two
/// cells inside the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RangeBorders {
    /// Perimeter edge
    pub outer: Option<BorderEdge>,
    /// Interior edges, horizontal and vertical
    pub inner: Option<BorderEdge>,
}

impl RangeBorders {
    /// Same edge inside and around the range
    pub const fn all(edge: BorderEdge) -> Self {
        Self {
            outer: Some(edge),
            inner: Some(edge),
        }
    }

    /// Edge around the perimeter only
    pub const fn outline(edge: BorderEdge) -> Self {
        Self {
            outer: Some(edge),
            inner: None,
        }
    }

    /// The edges one cell of `range` receives
    pub fn cell_edges(&self, range: &GridRange, addr: GridAddress) -> BorderStyle {
        if !range.contains(&addr) {
            return BorderStyle::default();
        }

        let pick = |on_perimeter: bool| {
            if on_perimeter {
                self.outer
            } else {
                self.inner
            }
        };

        BorderStyle {
            top: pick(addr.row == range.start.row),
            bottom: pick(addr.row == range.end.row),
            left: pick(addr.col == range.start.col),
            right: pick(addr.col == range.end.col),
        }
    }
}
