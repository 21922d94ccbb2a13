#![allow(dead_code)]

use adstar::Transition;

pub type Cell = (i32, i32);

const DIRECTIONS: [Cell; 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Four-connected grid with a cost for each directed edge between neighbouring cells.
///
/// Edge costs are at least one, so the Manhattan distance is a consistent heuristic.
#[derive(Clone, Debug)]
pub struct Grid {
    pub width: i32,
    pub height: i32,
    costs: Vec<f64>,
}

impl Grid {
    /// Creates a grid whose edge costs are given by `cost(cell, direction index)`.
    pub fn new(width: i32, height: i32, cost: impl Fn(Cell, usize) -> f64) -> Self {
        let mut costs = Vec::with_capacity((width * height) as usize * DIRECTIONS.len());

        for y in 0..height {
            for x in 0..width {
                for direction in 0..DIRECTIONS.len() {
                    costs.push(cost((x, y), direction));
                }
            }
        }

        Self {
            width,
            height,
            costs,
        }
    }

    /// Creates a grid with deterministic pseudo-random costs between 1 and 5.
    pub fn patterned(width: i32, height: i32) -> Self {
        Self::new(width, height, |(x, y), direction| {
            1.0 + ((x * 7 + y * 13 + direction as i32 * 5) % 5) as f64
        })
    }

    pub fn contains(&self, (x, y): Cell) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| (x, y)))
    }

    fn slot(&self, (x, y): Cell, direction: usize) -> usize {
        ((y * self.width + x) as usize) * DIRECTIONS.len() + direction
    }

    /// Returns the neighbours of a cell with the direction leading to them.
    pub fn neighbours(&self, (x, y): Cell) -> impl Iterator<Item = (Cell, usize)> + '_ {
        DIRECTIONS
            .iter()
            .enumerate()
            .map(move |(direction, (dx, dy))| ((x + dx, y + dy), direction))
            .filter(|&(cell, _)| self.contains(cell))
    }

    pub fn get_cost(&self, from: Cell, direction: usize) -> f64 {
        self.costs[self.slot(from, direction)]
    }

    pub fn set_cost(&mut self, from: Cell, direction: usize, cost: f64) {
        let slot = self.slot(from, direction);
        self.costs[slot] = cost;
    }

    /// Returns the edges entering a cell as forward transitions.
    pub fn incoming(&self, cell: Cell) -> Vec<Transition<Cell, usize>> {
        self.neighbours(cell)
            .map(|(neighbour, direction)| Transition::new(neighbour, cell, direction ^ 1))
            .collect()
    }

    pub fn successors(&self) -> impl Fn(&Cell) -> Vec<Transition<Cell, usize>> + '_ {
        move |&cell| {
            self.neighbours(cell)
                .map(|(neighbour, direction)| Transition::new(cell, neighbour, direction))
                .collect()
        }
    }

    pub fn predecessors(&self) -> impl Fn(&Cell) -> Vec<Transition<Cell, usize>> + '_ {
        move |&cell| {
            self.incoming(cell)
                .into_iter()
                .map(|transition| Transition::new(cell, transition.from.unwrap(), transition.action))
                .collect()
        }
    }

    pub fn cost(&self) -> impl Fn(&Transition<Cell, usize>) -> f64 + '_ {
        move |transition| self.get_cost(transition.from.unwrap(), transition.action)
    }

    /// Cost of the shortest path by Dijkstra's algorithm, or `None` if `goal` is unreachable.
    pub fn shortest_path_cost(&self, start: Cell, goal: Cell) -> Option<f64> {
        let cells = self.cells().collect::<Vec<_>>();
        let index = |(x, y): Cell| (y * self.width + x) as usize;
        let mut distance = vec![f64::INFINITY; cells.len()];
        let mut settled = vec![false; cells.len()];
        distance[index(start)] = 0.0;

        loop {
            let next = (0..cells.len())
                .filter(|&i| !settled[i] && distance[i].is_finite())
                .min_by(|&a, &b| distance[a].total_cmp(&distance[b]));

            let Some(current) = next else {
                break;
            };

            settled[current] = true;

            for (neighbour, direction) in self.neighbours(cells[current]) {
                let candidate = distance[current] + self.get_cost(cells[current], direction);

                if candidate < distance[index(neighbour)] {
                    distance[index(neighbour)] = candidate;
                }
            }
        }

        Some(distance[index(goal)]).filter(|cost| cost.is_finite())
    }

    /// Sums the edge costs along a path, failing if consecutive cells are not adjacent.
    pub fn path_cost(&self, path: &[Cell]) -> Option<f64> {
        path.windows(2).try_fold(0.0, |total, pair| {
            self.neighbours(pair[0])
                .find(|&(neighbour, _)| neighbour == pair[1])
                .map(|(_, direction)| total + self.get_cost(pair[0], direction))
        })
    }
}

pub fn manhattan(goal: Cell) -> impl Fn(&Cell) -> f64 {
    move |&(x, y)| ((goal.0 - x).abs() + (goal.1 - y).abs()) as f64
}

/// Directed multigraph given as an edge list; the action of an edge is its index.
#[derive(Clone, Debug)]
pub struct EdgeList {
    pub size: usize,
    pub edges: Vec<(usize, usize, f64)>,
}

impl EdgeList {
    pub fn successors(&self) -> impl Fn(&usize) -> Vec<Transition<usize, usize>> + '_ {
        move |&state| {
            self.edges
                .iter()
                .enumerate()
                .filter(|(_, (from, _, _))| *from == state)
                .map(|(i, &(from, to, _))| Transition::new(from, to, i))
                .collect()
        }
    }

    pub fn predecessors(&self) -> impl Fn(&usize) -> Vec<Transition<usize, usize>> + '_ {
        move |&state| {
            self.edges
                .iter()
                .enumerate()
                .filter(|(_, (_, to, _))| *to == state)
                .map(|(i, &(from, to, _))| Transition::new(to, from, i))
                .collect()
        }
    }

    pub fn cost(&self) -> impl Fn(&Transition<usize, usize>) -> f64 + '_ {
        move |transition| self.edges[transition.action].2
    }

    /// Cost of the shortest path by Bellman-Ford relaxation under `weights`,
    /// or `None` if `goal` is unreachable.
    pub fn shortest_path_cost(&self, weights: &[f64], start: usize, goal: usize) -> Option<f64> {
        let mut distance = vec![f64::INFINITY; self.size];
        distance[start] = 0.0;

        for _ in 0..self.size {
            for (i, &(from, to, _)) in self.edges.iter().enumerate() {
                let candidate = distance[from] + weights[i];

                if candidate < distance[to] {
                    distance[to] = candidate;
                }
            }
        }

        Some(distance[goal]).filter(|cost| cost.is_finite())
    }
}
