mod adstar;
pub mod search_algorithms;

pub use adstar::{create_adstar, create_incremental_dijkstra};
pub use search_algorithms::{AdStarSearch, Phase, Search, SearchParameters, Solution};
