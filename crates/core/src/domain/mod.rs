pub mod decision;
pub mod snapshot;
