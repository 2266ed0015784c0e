pub mod contractor;
pub mod haul_cycle_record;
pub mod haul_problem;
pub mod horizon;
pub mod offset_vector;
pub mod route_template;
pub mod site;
