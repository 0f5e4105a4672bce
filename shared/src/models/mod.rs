//! Domain models for ThunderCast

mod features;
mod forecast;
mod history;
mod observation;

pub use features::*;
pub use forecast::*;
pub use history::*;
pub use observation::*;
