//! stepsort core library: a counting sort that records every micro-operation
//! as a replayable step, plus the history buffer and navigator that walk it.

mod config;
mod error;
mod history;
mod input;
mod navigator;
mod recorder;
mod step;
mod timeline;
mod tracefile;

pub use config::*;
pub use error::*;
pub use history::*;
pub use input::*;
pub use navigator::*;
pub use recorder::*;
pub use step::*;
pub use timeline::*;
pub use tracefile::*;
