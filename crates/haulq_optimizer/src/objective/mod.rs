pub mod objective;
pub mod objective_score;
pub mod objective_weights;
