pub mod accepted_offsets;
mod coordinate_descent;
mod grid_search;
mod monte_carlo;
pub mod offset_domain;
pub mod optimization_outcome;
mod search_context;
pub mod search_trace;
pub mod solver;
pub mod solver_params;
