pub mod baseline;
pub mod config;
pub mod data;
pub mod errors;
pub mod eval;
pub mod io;
pub mod logging;
pub mod model;
pub mod output;
pub mod overrep;
pub mod pipeline;
pub mod runner;
pub mod text;
pub mod weighting;
