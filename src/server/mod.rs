mod business_lines;
mod cost_centers;
mod entries;
mod imports;
mod reports;
pub mod dto;
pub mod response;
mod router;
pub mod validation;

pub use router::{AppState, create_router};
