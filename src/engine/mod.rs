//! Pure game-rule code with no I/O or shared state.

/// Grid representation and the place/win/full primitives.
pub mod board;
/// Column-choice heuristic for the built-in opponent.
pub mod bot;
