pub mod config;
pub mod doctor;
pub mod extract;
pub mod progress;
pub mod split;
pub mod timestamps;
