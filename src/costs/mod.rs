//! Costs and cost reduction.
//!
//! ## Key Types
//!
//! - `CostSpec`: what an ability costs, paid through events
//! - `PlayType`: where a card is played from
//! - `CostReducer`: a gated, possibly limited, fate cost reduction
//! - `CostReducerManager`: every player's reducers

mod cost;
mod reducer;

pub use cost::{CostSpec, PlayType};
pub(crate) use cost::reduced_cost;
pub use reducer::{CostReducer, CostReducerManager, ReducerAmount, ReducerId};
