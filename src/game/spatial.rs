//! Spatial hash grid for proximity queries
//!
//! Divides the world into square cells and stores point entries in each cell.
//! Radius queries only visit the cells overlapping the query circle's bounding box.

use hashbrown::HashMap;
use rustc_hash::FxBuildHasher;

use crate::game::state::Food;
use crate::util::vec2::Vec2;

/// Default cell size for the food grid (world units)
pub const FOOD_GRID_CELL_SIZE: f32 = 100.0;

/// Initial capacity for entity vectors within cells
const CELL_INITIAL_CAPACITY: usize = 8;

/// Grid cell key - (x, y) cell coordinates
pub type CellKey = (i32, i32);

/// Entry stored in the grid: an index into the caller's collection plus its position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridEntry {
    pub index: usize,
    pub position: Vec2,
}

/// Uniform spatial hash grid over point entries
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    /// Inverse cell size for fast position-to-cell conversion
    inv_cell_size: f32,
    cells: HashMap<CellKey, Vec<GridEntry>, FxBuildHasher>,
    len: usize,
}

impl SpatialGrid {
    /// Create a new spatial grid with the given cell size
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size > 0.0 { cell_size } else { FOOD_GRID_CELL_SIZE };
        Self {
            cell_size,
            inv_cell_size: 1.0 / cell_size,
            cells: HashMap::default(),
            len: 0,
        }
    }

    /// Grid over the current food collection (entry index = position in the slice)
    pub fn from_foods(foods: &[Food]) -> Self {
        let mut grid = Self::default();
        for (index, food) in foods.iter().enumerate() {
            grid.insert(index, food.position);
        }
        grid
    }

    /// Clear all entries, keeping cell allocations
    #[inline]
    pub fn clear(&mut self) {
        for cell in self.cells.values_mut() {
            cell.clear();
        }
        self.len = 0;
    }

    #[inline]
    fn position_to_cell(&self, position: Vec2) -> CellKey {
        (
            (position.x * self.inv_cell_size).floor() as i32,
            (position.y * self.inv_cell_size).floor() as i32,
        )
    }

    #[inline]
    pub fn insert(&mut self, index: usize, position: Vec2) {
        let cell_key = self.position_to_cell(position);
        self.cells
            .entry(cell_key)
            .or_insert_with(|| Vec::with_capacity(CELL_INITIAL_CAPACITY))
            .push(GridEntry { index, position });
        self.len += 1;
    }

    /// All entries whose position lies strictly within `radius` of `center`
    pub fn query_radius(&self, center: Vec2, radius: f32) -> impl Iterator<Item = &GridEntry> + '_ {
        let radius = radius.max(0.0);
        let radius_sq = radius * radius;
        let (min_x, min_y) = self.position_to_cell(Vec2::new(center.x - radius, center.y - radius));
        let (max_x, max_y) = self.position_to_cell(Vec2::new(center.x + radius, center.y + radius));

        (min_x..=max_x)
            .flat_map(move |cx| (min_y..=max_y).map(move |cy| (cx, cy)))
            .filter_map(move |key| self.cells.get(&key))
            .flat_map(|cell| cell.iter())
            .filter(move |entry| entry.position.distance_sq_to(center) < radius_sq)
    }

    /// Closest entry strictly within `radius`, if any
    pub fn nearest_within(&self, center: Vec2, radius: f32) -> Option<GridEntry> {
        self.query_radius(center, radius)
            .min_by(|a, b| {
                a.position
                    .distance_sq_to(center)
                    .total_cmp(&b.position.distance_sq_to(center))
                    .then(a.index.cmp(&b.index))
            })
            .copied()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Get statistics about the grid
    pub fn stats(&self) -> SpatialGridStats {
        let non_empty_cells = self.cells.values().filter(|c| !c.is_empty()).count();
        let max_per_cell = self.cells.values().map(|c| c.len()).max().unwrap_or(0);

        SpatialGridStats {
            non_empty_cells,
            total_entries: self.len,
            max_per_cell,
        }
    }
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(FOOD_GRID_CELL_SIZE)
    }
}

/// Statistics about the spatial grid
#[derive(Debug, Clone)]
pub struct SpatialGridStats {
    pub non_empty_cells: usize,
    pub total_entries: usize,
    pub max_per_cell: usize,
}
