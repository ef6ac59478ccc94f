/// Breadth-first hint search.
///
/// Finds the shortest 4-connected route from a start cell to the grid's
/// recorded goal. The returned path excludes the start and ends on the
/// goal, so a start next to the goal yields exactly one cell and a start
/// on the goal yields none.
///
/// An unreachable goal also yields an empty path. Nothing is cached
/// between calls.

use std::collections::VecDeque;

use super::grid::Grid;

/// Neighbour order: up, right, down, left.
const STEPS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

pub fn find_path(grid: &Grid, start: (usize, usize)) -> Vec<(usize, usize)> {
    let goal = match grid.goal() {
        Some(g) => g,
        None => {
            log::warn!("hint requested on a maze without a goal");
            return vec![];
        }
    };

    let (sx, sy) = start;
    if grid.is_wall(sx as i32, sy as i32) {
        log::warn!("hint requested from blocked cell ({sx}, {sy})");
        return vec![];
    }
    if start == goal {
        return vec![];
    }

    // came_from[y][x]: predecessor on the shortest route, start points at itself
    let mut came_from: Vec<Vec<Option<(usize, usize)>>> =
        vec![vec![None; grid.width()]; grid.height()];
    let mut queue = VecDeque::new();
    came_from[sy][sx] = Some(start);
    queue.push_back(start);

    let mut reached = false;
    while let Some((x, y)) = queue.pop_front() {
        if (x, y) == goal {
            reached = true;
            break;
        }
        for &(dx, dy) in &STEPS {
            let (nx, ny) = (x as i32 + dx, y as i32 + dy);
            if grid.is_wall(nx, ny) {
                continue;
            }
            let (nx, ny) = (nx as usize, ny as usize);
            if came_from[ny][nx].is_some() {
                continue;
            }
            came_from[ny][nx] = Some((x, y));
            queue.push_back((nx, ny));
        }
    }

    if !reached {
        log::warn!("goal {:?} is unreachable from ({sx}, {sy})", goal);
        return vec![];
    }

    let mut path = Vec::new();
    let mut current = goal;
    while current != start {
        path.push(current);
        match came_from[current.1][current.0] {
            Some(prev) => current = prev,
            None => return vec![],
        }
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn grid(rows: &[&str]) -> Grid {
        Grid::parse(&rows.join("\n")).unwrap()
    }

    fn assert_walkable(g: &Grid, start: (usize, usize), path: &[(usize, usize)]) {
        let mut prev = start;
        for &(x, y) in path {
            assert!(!g.is_wall(x as i32, y as i32), "path crosses wall at ({x}, {y})");
            let step = (x as i32 - prev.0 as i32).abs() + (y as i32 - prev.1 as i32).abs();
            assert_eq!(step, 1, "path jumps from {:?} to ({x}, {y})", prev);
            prev = (x, y);
        }
    }

    #[test]
    fn sample_level_path() {
        let g = grid(&["#####", "#P.G#", "#.#.#", "#...#", "#####"]);
        let path = find_path(&g, (1, 1));
        assert_eq!(path, vec![(2, 1), (3, 1)]);
    }

    #[test]
    fn adjacent_to_goal_is_one_step() {
        let g = grid(&["####", "#.G#", "####"]);
        assert_eq!(find_path(&g, (1, 1)), vec![(2, 1)]);
    }

    #[test]
    fn standing_on_goal_is_empty() {
        let g = grid(&["###", "#G#", "###"]);
        assert!(find_path(&g, (1, 1)).is_empty());
    }

    #[test]
    fn takes_the_shortest_route() {
        let g = grid(&[
            "#######",
            "#.....#",
            "#.###.#",
            "#.#G..#",
            "#.###.#",
            "#.....#",
            "#######",
        ]);
        let path = find_path(&g, (1, 1));
        // right along the top, down the right side, left into the pocket
        assert_eq!(path.len(), 8);
        assert_eq!(path.last(), Some(&(3, 3)));
        assert_walkable(&g, (1, 1), &path);
    }

    #[test]
    fn unreachable_goal_is_empty() {
        let g = grid(&["#####", "#.#G#", "#####"]);
        assert!(find_path(&g, (1, 1)).is_empty());
    }

    #[test]
    fn blocked_or_off_grid_start_is_empty() {
        let g = grid(&["####", "#.G#", "####"]);
        assert!(find_path(&g, (0, 0)).is_empty());
        assert!(find_path(&g, (10, 10)).is_empty());
    }

    #[test]
    fn no_goal_is_empty() {
        assert!(find_path(&Grid::default(), (0, 0)).is_empty());
    }

    #[test]
    fn repeated_calls_agree() {
        let g = grid(&["#####", "#P.G#", "#.#.#", "#...#", "#####"]);
        let first = find_path(&g, (1, 3));
        let second = find_path(&g, (1, 3));
        assert_eq!(first, second);
        assert_walkable(&g, (1, 3), &first);
    }

    #[test]
    fn generated_mazes_are_solvable() {
        let mut rng = StdRng::seed_from_u64(2024);
        for size in [5, 7, 11, 17, 25] {
            let g = Grid::generate(size, &mut rng).unwrap();
            let path = find_path(&g, (1, 1));
            assert!(!path.is_empty(), "no route in {size}x{size} maze");
            assert_eq!(path.last(), Some(&(size - 2, size - 2)));
            assert_walkable(&g, (1, 1), &path);
        }
    }
}
