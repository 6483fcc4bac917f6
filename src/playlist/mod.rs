pub mod config;
pub mod duplicates;
pub mod engine;
pub mod history;
pub mod metadata;
pub mod priority;
pub mod shuffle;


pub use config::*;
pub use duplicates::*;
pub use engine::*;
pub use history::*;
pub use metadata::*;
pub use priority::*;
pub use shuffle::*;
