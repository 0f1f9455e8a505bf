//! Placement geometry: positions, the environment, and range predicates
//! that decide which pairs of nodes share an edge.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

// ── Position ──────────────────────────────────────────────────────────

/// A point in the plane.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }

    /// Euclidean distance.
    pub fn distance(self, other: Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl From<(f64, f64)> for Position {
    fn from((x, y): (f64, f64)) -> Self {
        Position { x, y }
    }
}

/// What a range predicate needs to know about one end of a candidate edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Endpoint {
    pub position: Position,
    pub comm_range: f64,
}

// ── Environment ───────────────────────────────────────────────────────

/// The space nodes live in.
pub trait Environment: std::fmt::Debug {
    /// Whether a node may be placed at `position`.
    fn is_space(&self, position: Position) -> bool;

    /// Whether nothing blocks the line between two points.
    fn are_visible(&self, a: Position, b: Position) -> bool;

    /// Sample a free position, giving up after `max_tries` attempts.
    fn find_random_pos(&self, max_tries: usize, rng: &mut ChaCha8Rng) -> Option<Position>;
}

/// An obstacle-free rectangle anchored at the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct OpenEnvironment {
    pub width: f64,
    pub height: f64,
}

impl OpenEnvironment {
    pub fn new(width: f64, height: f64) -> Self {
        OpenEnvironment { width, height }
    }
}

impl Default for OpenEnvironment {
    fn default() -> Self {
        OpenEnvironment::new(600.0, 600.0)
    }
}

impl Environment for OpenEnvironment {
    fn is_space(&self, position: Position) -> bool {
        (0.0..=self.width).contains(&position.x) && (0.0..=self.height).contains(&position.y)
    }

    fn are_visible(&self, _a: Position, _b: Position) -> bool {
        true
    }

    fn find_random_pos(&self, max_tries: usize, rng: &mut ChaCha8Rng) -> Option<Position> {
        (0..max_tries)
            .map(|_| Position::new(rng.gen::<f64>() * self.width, rng.gen::<f64>() * self.height))
            .find(|p| self.is_space(*p))
    }
}

// ── Range predicates ──────────────────────────────────────────────────

/// Decides whether `a` can reach `b`.
///
/// In a directed network the predicate is asked once per direction; in an
/// undirected one once per unordered pair.
pub trait RangeType: std::fmt::Debug {
    fn in_range(
        &self,
        a: Endpoint,
        b: Endpoint,
        environment: &dyn Environment,
        rng: &mut ChaCha8Rng,
    ) -> bool;
}

/// Every pair is connected.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompleteRange;

impl RangeType for CompleteRange {
    fn in_range(&self, _: Endpoint, _: Endpoint, _: &dyn Environment, _: &mut ChaCha8Rng) -> bool {
        true
    }
}

/// Unit disc graph: closer than both ranges and mutually visible.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitDisc;

impl RangeType for UnitDisc {
    fn in_range(
        &self,
        a: Endpoint,
        b: Endpoint,
        environment: &dyn Environment,
        _rng: &mut ChaCha8Rng,
    ) -> bool {
        let d = a.position.distance(b.position);
        d < a.comm_range && d < b.comm_range && environment.are_visible(a.position, b.position)
    }
}

/// Probabilistic disc: connected with probability `1 - d²/r²`, where `r`
/// is the range of the first endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct SquareDisc;

impl RangeType for SquareDisc {
    fn in_range(
        &self,
        a: Endpoint,
        b: Endpoint,
        environment: &dyn Environment,
        rng: &mut ChaCha8Rng,
    ) -> bool {
        if a.comm_range <= 0.0 {
            return false;
        }
        let d = a.position.distance(b.position);
        rng.gen::<f64>() > d * d / (a.comm_range * a.comm_range)
            && environment.are_visible(a.position, b.position)
    }
}
