use std::collections::VecDeque;

use rand::Rng;

pub const ROWS: i32 = 14;
pub const COLS: i32 = 25;
pub const FOOD_SCORE: u32 = 10;

const START: Point = Point { row: 12, col: 12 };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub row: i32,
    pub col: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickResult {
    Moved,
    Ate,
    Paused,
    GameOver,
}

#[derive(Debug, Clone)]
pub struct Snake {
    body: VecDeque<Point>,
    direction: Direction,
    food: Point,
    score: u32,
    paused: bool,
    game_over: bool,
}

impl Snake {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            body: VecDeque::from([START]),
            direction: Direction::Right,
            food: random_point(rng),
            score: 0,
            paused: false,
            game_over: false,
        }
    }

    pub fn head(&self) -> Point {
        self.body[0]
    }

    pub fn body(&self) -> impl Iterator<Item = &Point> {
        self.body.iter()
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn food(&self) -> Point {
        self.food
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Changes heading unless it would reverse the snake onto itself
    pub fn turn(&mut self, direction: Direction) {
        if direction != self.direction.opposite() {
            self.direction = direction;
        }
    }

    /// Advances the snake one cell, wrapping around the edges
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) -> TickResult {
        if self.game_over {
            return TickResult::GameOver;
        }
        if self.paused {
            return TickResult::Paused;
        }

        let head = step(self.head(), self.direction);
        self.body.push_front(head);

        let ate = head == self.food;
        if ate {
            self.score += FOOD_SCORE;
            self.food = random_point(rng);
        } else {
            self.body.pop_back();
        }

        if self.body.iter().skip(1).any(|p| *p == head) {
            self.game_over = true;
            return TickResult::GameOver;
        }

        if ate {
            TickResult::Ate
        } else {
            TickResult::Moved
        }
    }
}

fn step(point: Point, direction: Direction) -> Point {
    let (dr, dc) = match direction {
        Direction::Up => (-1, 0),
        Direction::Down => (1, 0),
        Direction::Left => (0, -1),
        Direction::Right => (0, 1),
    };
    Point {
        row: (point.row + dr).rem_euclid(ROWS),
        col: (point.col + dc).rem_euclid(COLS),
    }
}

fn random_point<R: Rng + ?Sized>(rng: &mut R) -> Point {
    Point {
        row: rng.gen_range(0..ROWS),
        col: rng.gen_range(0..COLS),
    }
}
