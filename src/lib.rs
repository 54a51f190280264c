pub mod heatmap;
pub mod output;
pub mod parser;
pub mod stores;
