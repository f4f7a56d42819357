use cgmath::Point2;
use log::trace;

// Answers whether a grid cell holds solid ground. Cells outside the grid are never occupied.
pub trait GridOccupancy {
    fn is_occupied(&self, column: i32, row: i32) -> bool;
}

impl GridOccupancy for std::collections::HashSet<(i32, i32)> {
    fn is_occupied(&self, column: i32, row: i32) -> bool {
        self.contains(&(column, row))
    }
}

/// Index of the cell containing `coordinate`. Floors, so negative coordinates map to negative
/// cells.
pub fn cell_index(coordinate: f32, cell_size: f32) -> i32 {
    (coordinate / cell_size).floor() as i32
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum FallStep {
    Falling {
        position: Point2<f32>,
    },
    Landed {
        column: i32,
        row: i32,
        position: Point2<f32>,
    },
}

impl FallStep {
    pub fn position(&self) -> Point2<f32> {
        match *self {
            FallStep::Falling { position } => position,
            FallStep::Landed { position, .. } => position,
        }
    }

    pub fn landed(&self) -> bool {
        match self {
            FallStep::Landed { .. } => true,
            FallStep::Falling { .. } => false,
        }
    }
}

/// Single fall step. World is Y-up, so a falling body has a negative `fall_velocity`.
///
/// The cell under the prospective position is looked up once. If it is empty the body moves by
/// `fall_velocity`, otherwise it is placed on top of that cell. There is no sweep across
/// intermediate cells.
pub fn resolve_fall(
    position: Point2<f32>,
    fall_velocity: f32,
    cell_size: f32,
    grid: &impl GridOccupancy,
) -> FallStep {
    let column = cell_index(position.x, cell_size);
    let row = cell_index(position.y + fall_velocity, cell_size);
    if grid.is_occupied(column, row) {
        let y = (row + 1) as f32 * cell_size;
        trace!("landed on cell ({}, {}) at y = {}", column, row, y);
        FallStep::Landed {
            column,
            row,
            position: Point2::new(position.x, y),
        }
    } else {
        FallStep::Falling {
            position: Point2::new(position.x, position.y + fall_velocity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const CELL: f32 = 16.0;
    const V: f32 = -2.0;

    fn grid(cells: &[(i32, i32)]) -> HashSet<(i32, i32)> {
        cells.iter().cloned().collect()
    }

    #[test]
    fn cell_index_floors() {
        assert_eq!(cell_index(80.0, CELL), 5);
        assert_eq!(cell_index(95.9, CELL), 5);
        assert_eq!(cell_index(0.0, CELL), 0);
        assert_eq!(cell_index(-0.5, CELL), -1);
        assert_eq!(cell_index(-16.0, CELL), -1);
        assert_eq!(cell_index(-16.5, CELL), -2);
    }

    #[test]
    fn falls_through_empty_cell() {
        let step = resolve_fall(Point2::new(80.0, 100.0), V, CELL, &grid(&[]));
        assert_eq!(
            step,
            FallStep::Falling {
                position: Point2::new(80.0, 98.0)
            }
        );
    }

    #[test]
    fn lands_on_occupied_cell() {
        let step = resolve_fall(Point2::new(80.0, 100.0), V, CELL, &grid(&[(5, 6)]));
        assert_eq!(
            step,
            FallStep::Landed {
                column: 5,
                row: 6,
                position: Point2::new(80.0, 112.0)
            }
        );
    }

    #[test]
    fn only_the_target_cell_matters() {
        // Ground directly below the target row and in neighbouring columns is ignored.
        let step = resolve_fall(
            Point2::new(80.0, 100.0),
            V,
            CELL,
            &grid(&[(5, 5), (4, 6), (6, 6)]),
        );
        assert_eq!(step.position(), Point2::new(80.0, 98.0));
        assert!(!step.landed());
    }

    #[test]
    fn resting_is_stable() {
        let ground = grid(&[(2, 3)]);
        let mut position = Point2::new(40.0, 4.0 * CELL);
        for _ in 0..10 {
            let step = resolve_fall(position, V, CELL, &ground);
            assert!(step.landed());
            position = step.position();
            assert_eq!(position, Point2::new(40.0, 64.0));
        }
    }

    #[test]
    fn falls_until_landing() {
        let ground = grid(&[(5, 2)]);
        let mut position = Point2::new(80.0, 100.0);
        let mut frames = 0;
        loop {
            let step = resolve_fall(position, V, CELL, &ground);
            position = step.position();
            frames += 1;
            if step.landed() {
                break;
            }
            assert!(frames < 100);
        }
        assert_eq!(position, Point2::new(80.0, 48.0));
        // 100 -> 48 takes 26 steps, the 27th lookup hits row 2.
        assert_eq!(frames, 27);
    }

    #[test]
    fn outside_the_grid_is_empty() {
        // Every cell of a 4x4 grid is solid.
        let bounded: HashSet<(i32, i32)> =
            (0..4).flat_map(|c| (0..4).map(move |r| (c, r))).collect();
        let step = resolve_fall(Point2::new(-8.0, 10.0), V, CELL, &bounded);
        assert_eq!(step.position(), Point2::new(-8.0, 8.0));
        let step = resolve_fall(Point2::new(8.0, 1.0), V, CELL, &bounded);
        assert_eq!(step.position(), Point2::new(8.0, -1.0));
        let step = resolve_fall(Point2::new(8.0, 10.0), V, CELL, &bounded);
        assert!(step.landed());
    }

    #[test]
    fn upward_convention_with_positive_velocity() {
        let step = resolve_fall(Point2::new(80.0, 100.0), 2.0, CELL, &grid(&[]));
        assert_eq!(step.position(), Point2::new(80.0, 102.0));
    }
}
