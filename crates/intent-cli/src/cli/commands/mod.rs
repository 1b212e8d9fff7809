pub mod collect;
mod dispatch;
pub mod history;
pub mod list;
pub(crate) mod output;
pub mod run;
pub mod serve;

pub use dispatch::dispatch;
