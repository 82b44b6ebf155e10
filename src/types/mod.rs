pub mod comparison;
pub mod forecast;
pub mod parameter;
pub mod series;
pub mod station;
pub mod window;
