pub mod controller;
pub mod detail;
pub mod view;

pub use controller::{DashboardController, DashboardSnapshot, ForecastView};
pub use detail::{load_date_detail, DetailRow};
pub use view::render;
