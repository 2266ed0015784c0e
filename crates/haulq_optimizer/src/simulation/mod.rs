pub mod arrivals;
pub mod bucket_grid;
pub mod bucket_queue;
pub mod event_queue;
pub mod service_sampler;
pub mod simulation_config;
pub mod simulator;
pub mod site_series;
