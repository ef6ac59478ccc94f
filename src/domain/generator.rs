/// Randomized depth-first maze carver.
///
/// Works on the lattice of odd coordinates: each step jumps two cells and
/// opens the wall in between, so parallel corridors always keep a wall
/// between them. Carving continues from the top of the stack until it runs
/// out of uncarved neighbours, then backtracks. Every lattice cell ends up
/// connected by exactly one route.

use rand::seq::SliceRandom;
use rand::Rng;

use super::cell::Cell;

/// Two-cell jumps: up, right, down, left.
const JUMPS: [(i32, i32); 4] = [(0, -2), (2, 0), (0, 2), (-2, 0)];

/// Carve a `size × size` block of cells starting from (1, 1).
///
/// Sizes below 3 have no interior and come back as solid wall.
pub fn carve<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Vec<Vec<Cell>> {
    let mut cells = vec![vec![Cell::Wall; size]; size];
    if size < 3 {
        return cells;
    }

    let limit = size as i32 - 1;
    let mut stack: Vec<(i32, i32)> = Vec::with_capacity((size / 2) * (size / 2));
    cells[1][1] = Cell::Path;
    stack.push((1, 1));

    while let Some(&(cx, cy)) = stack.last() {
        let mut jumps = JUMPS;
        jumps.shuffle(rng);

        let next = jumps.iter().copied().find(|&(dx, dy)| {
            let (nx, ny) = (cx + dx, cy + dy);
            nx > 0 && nx < limit && ny > 0 && ny < limit
                && cells[ny as usize][nx as usize] == Cell::Wall
        });

        match next {
            Some((dx, dy)) => {
                let (nx, ny) = (cx + dx, cy + dy);
                cells[(cy + dy / 2) as usize][(cx + dx / 2) as usize] = Cell::Path;
                cells[ny as usize][nx as usize] = Cell::Path;
                stack.push((nx, ny));
            }
            None => {
                stack.pop();
            }
        }
    }

    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// (carved lattice cells, carved connections between them)
    fn lattice_counts(cells: &[Vec<Cell>]) -> (usize, usize) {
        let size = cells.len();
        let mut nodes = 0;
        let mut edges = 0;
        for y in 1..size - 1 {
            for x in 1..size - 1 {
                if cells[y][x] != Cell::Path { continue; }
                match (x % 2 == 1, y % 2 == 1) {
                    (true, true) => nodes += 1,
                    (true, false) | (false, true) => edges += 1,
                    (false, false) => panic!("carved a lattice corner at ({x}, {y})"),
                }
            }
        }
        (nodes, edges)
    }

    #[test]
    fn carves_spanning_tree() {
        let mut rng = StdRng::seed_from_u64(42);
        for size in [5, 7, 9, 11, 21, 31] {
            let cells = carve(size, &mut rng);
            let (nodes, edges) = lattice_counts(&cells);
            assert_eq!(edges, nodes - 1, "cycle or gap at size {size}");
        }
    }

    #[test]
    fn visits_every_lattice_cell() {
        let mut rng = StdRng::seed_from_u64(5);
        let size = 15;
        let cells = carve(size, &mut rng);
        for y in (1..size - 1).step_by(2) {
            for x in (1..size - 1).step_by(2) {
                assert_eq!(cells[y][x], Cell::Path, "lattice cell ({x}, {y}) not carved");
            }
        }
    }

    #[test]
    fn border_stays_wall() {
        let mut rng = StdRng::seed_from_u64(9);
        let size = 11;
        let cells = carve(size, &mut rng);
        for i in 0..size {
            assert_eq!(cells[0][i], Cell::Wall);
            assert_eq!(cells[size - 1][i], Cell::Wall);
            assert_eq!(cells[i][0], Cell::Wall);
            assert_eq!(cells[i][size - 1], Cell::Wall);
        }
    }

    #[test]
    fn tiny_sizes_are_solid() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(carve(2, &mut rng).iter().flatten().all(|&c| c == Cell::Wall));
        assert!(carve(0, &mut rng).is_empty());
    }

    #[test]
    fn smallest_maze_is_one_cell() {
        let mut rng = StdRng::seed_from_u64(0);
        let cells = carve(3, &mut rng);
        let open = cells.iter().flatten().filter(|&&c| c == Cell::Path).count();
        assert_eq!(open, 1);
        assert_eq!(cells[1][1], Cell::Path);
    }

    #[test]
    fn different_seeds_give_different_mazes() {
        let a = carve(21, &mut StdRng::seed_from_u64(1));
        let b = carve(21, &mut StdRng::seed_from_u64(2));
        assert_ne!(a, b);
    }
}
