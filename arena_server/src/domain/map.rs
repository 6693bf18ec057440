// Arena grid and the deterministic map generator.

use crate::domain::tuning::ArenaTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wall {
    pub health: u32,
    /// Boundary walls never take damage.
    pub indestructible: bool,
    /// Ability-placed walls are not rebuilt once destroyed.
    pub temporary: bool,
}

impl Wall {
    pub fn boundary(health: u32) -> Self {
        Self {
            health,
            indestructible: true,
            temporary: false,
        }
    }

    pub fn destructible(health: u32) -> Self {
        Self {
            health,
            indestructible: false,
            temporary: false,
        }
    }

    pub fn temporary(health: u32) -> Self {
        Self {
            health,
            indestructible: false,
            temporary: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Wall(Wall),
}

impl Cell {
    pub fn is_wall(&self) -> bool {
        matches!(self, Cell::Wall(_))
    }
}

/// A destructible wall waiting to be rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DestroyedWall {
    pub x: usize,
    pub y: usize,
    /// Ticks left until the wall comes back.
    pub respawn_in: u32,
}

/// Square grid of cells stored row-major; `(x, y)` is column then row.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    size: usize,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn empty(size: usize) -> Self {
        Self {
            size,
            cells: vec![Cell::Empty; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&Cell> {
        if x >= self.size || y >= self.size {
            return None;
        }
        self.cells.get(y * self.size + x)
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut Cell> {
        if x >= self.size || y >= self.size {
            return None;
        }
        self.cells.get_mut(y * self.size + x)
    }

    pub fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if let Some(slot) = self.get_mut(x, y) {
            *slot = cell;
        }
    }

    /// Cell coordinate containing a world point, or `None` outside the grid.
    pub fn cell_at(&self, x: f32, y: f32, cell_size: f32) -> Option<(usize, usize)> {
        let cx = (x / cell_size).floor();
        let cy = (y / cell_size).floor();
        if !cx.is_finite() || !cy.is_finite() || cx < 0.0 || cy < 0.0 {
            return None;
        }
        let (cx, cy) = (cx as usize, cy as usize);
        (cx < self.size && cy < self.size).then_some((cx, cy))
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.size.max(1))
    }
}

/// Interior wall coordinates: a 3x3 lattice at the quarter, half and three-quarter lines,
/// mirrored about the grid center.
pub fn interior_wall_cells(size: usize) -> Vec<(usize, usize)> {
    let quarter = size / 4;
    let lines = [quarter, size / 2, size - quarter];
    let mut cells = Vec::with_capacity(lines.len() * lines.len());
    for &y in &lines {
        for &x in &lines {
            let inside = x > 0 && y > 0 && x + 1 < size && y + 1 < size;
            if inside && !cells.contains(&(x, y)) {
                cells.push((x, y));
            }
        }
    }
    cells
}

/// Builds the arena map. The layout depends only on the tuning, so every room and every
/// client sees the same walls.
pub fn generate_map(arena: &ArenaTuning) -> Grid {
    let size = arena.grid_size;
    let mut grid = Grid::empty(size);
    if size == 0 {
        return grid;
    }

    for i in 0..size {
        let boundary = Cell::Wall(Wall::boundary(arena.wall_health));
        grid.set(i, 0, boundary);
        grid.set(i, size - 1, boundary);
        grid.set(0, i, boundary);
        grid.set(size - 1, i, boundary);
    }

    for (x, y) in interior_wall_cells(size) {
        grid.set(x, y, Cell::Wall(Wall::destructible(arena.wall_health)));
    }

    grid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_generating_default_map_then_border_is_indestructible() {
        let arena = ArenaTuning::default();
        let grid = generate_map(&arena);
        let last = arena.grid_size - 1;
        for i in 0..arena.grid_size {
            for (x, y) in [(i, 0), (i, last), (0, i), (last, i)] {
                match grid.get(x, y) {
                    Some(Cell::Wall(wall)) => assert!(wall.indestructible),
                    other => panic!("expected boundary wall at ({x}, {y}), got {other:?}"),
                }
            }
        }
    }

    #[test]
    fn when_generating_default_map_then_interior_walls_match_reference_layout() {
        let grid = generate_map(&ArenaTuning::default());
        let expected = [
            (5, 5),
            (5, 15),
            (15, 5),
            (15, 15),
            (10, 5),
            (10, 15),
            (5, 10),
            (15, 10),
            (10, 10),
        ];
        for (x, y) in expected {
            assert_eq!(grid.get(x, y), Some(&Cell::Wall(Wall::destructible(3))));
        }

        let interior_walls = (1..19)
            .flat_map(|y| (1..19).map(move |x| (x, y)))
            .filter(|&(x, y)| grid.get(x, y).is_some_and(Cell::is_wall))
            .count();
        assert_eq!(interior_walls, expected.len());
    }

    #[test]
    fn when_generating_twice_then_layout_is_identical_and_mirrored() {
        let arena = ArenaTuning::default();
        let a = generate_map(&arena);
        let b = generate_map(&arena);
        assert_eq!(a, b);

        let n = arena.grid_size;
        let interior = interior_wall_cells(n);
        for &(x, y) in &interior {
            assert!(interior.contains(&(n - x, y)));
            assert!(interior.contains(&(x, n - y)));
        }
        for y in 0..n {
            for x in 0..n {
                assert_eq!(a.get(x, y), a.get(y, x));
            }
        }
    }

    #[test]
    fn when_point_is_outside_grid_then_cell_lookup_is_none() {
        let grid = Grid::empty(20);
        assert_eq!(grid.cell_at(-1.0, 10.0, 40.0), None);
        assert_eq!(grid.cell_at(800.0, 10.0, 40.0), None);
        assert_eq!(grid.cell_at(79.9, 40.0, 40.0), Some((1, 1)));
    }
}
