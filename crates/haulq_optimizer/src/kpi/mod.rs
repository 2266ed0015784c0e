pub mod kpi_set;
pub mod wait_rating;
