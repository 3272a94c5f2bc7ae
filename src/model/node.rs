use std::fmt;

use serde::{Deserialize, Serialize};

/// Integer grid position. Meaning is scoped to the owning node's level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct GridCoord {
    pub x: i32,
    pub y: i32,
}

impl GridCoord {
    pub const ORIGIN: GridCoord = GridCoord { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: GridCoord) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn manhattan(self, other: GridCoord) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Axis-aligned integer rectangle, min-inclusive and max-exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct IntRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl IntRect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn max_x(&self) -> i32 {
        self.x + self.width
    }

    pub fn max_y(&self) -> i32 {
        self.y + self.height
    }

    pub fn area(&self) -> i32 {
        self.width.max(0) * self.height.max(0)
    }

    /// Width over height; zero-height rectangles report a flat 1.0.
    pub fn aspect_ratio(&self) -> f32 {
        if self.height <= 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    pub fn contains(&self, point: GridCoord) -> bool {
        point.x >= self.x && point.x < self.max_x() && point.y >= self.y && point.y < self.max_y()
    }

    /// Whether a `width`×`height` footprint anchored at `origin` lies fully inside.
    pub fn contains_footprint(&self, origin: GridCoord, width: i32, height: i32) -> bool {
        width > 0
            && height > 0
            && origin.x >= self.x
            && origin.y >= self.y
            && origin.x + width <= self.max_x()
            && origin.y + height <= self.max_y()
    }

    /// Split into `cols`×`rows` cells that tile the rectangle exactly. The last column and
    /// row absorb the remainder. Cells are returned row-major.
    pub fn subdivide(&self, cols: i32, rows: i32) -> Vec<(GridCoord, IntRect)> {
        let cols = cols.max(1);
        let rows = rows.max(1);
        let cell_w = self.width / cols;
        let cell_h = self.height / rows;
        let mut cells = Vec::with_capacity((cols * rows) as usize);
        for row in 0..rows {
            for col in 0..cols {
                let x = self.x + col * cell_w;
                let y = self.y + row * cell_h;
                let w = if col == cols - 1 { self.max_x() - x } else { cell_w };
                let h = if row == rows - 1 { self.max_y() - y } else { cell_h };
                cells.push((GridCoord::new(col, row), IntRect::new(x, y, w, h)));
            }
        }
        cells
    }
}

/// Hierarchy level of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeLevel {
    District,
    Sector,
    Room,
}

impl NodeLevel {
    pub fn as_u8(self) -> u8 {
        match self {
            NodeLevel::District => 0,
            NodeLevel::Sector => 1,
            NodeLevel::Room => 2,
        }
    }

    /// Level a node's parent must have, or `None` for the top level.
    pub fn parent_level(self) -> Option<NodeLevel> {
        match self {
            NodeLevel::District => None,
            NodeLevel::Sector => Some(NodeLevel::District),
            NodeLevel::Room => Some(NodeLevel::Sector),
        }
    }
}

/// Identity of a graph node at any scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    pub value: u32,
    pub level: NodeLevel,
    /// Parent node value, 0 at the root.
    pub parent_id: u32,
    pub coordinates: GridCoord,
}

impl NodeId {
    pub fn district(value: u32, coordinates: GridCoord) -> Self {
        Self {
            value,
            level: NodeLevel::District,
            parent_id: 0,
            coordinates,
        }
    }

    pub fn child(value: u32, level: NodeLevel, parent_id: u32, coordinates: GridCoord) -> Self {
        Self {
            value,
            level,
            parent_id,
            coordinates,
        }
    }

    pub fn is_root_level(&self) -> bool {
        self.parent_id == 0
    }
}
