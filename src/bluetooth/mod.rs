pub mod station;

pub use station::read_station;
