pub mod aggregate;
pub mod open_meteo;
pub mod sync;
