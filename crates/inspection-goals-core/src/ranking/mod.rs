pub mod daily_rank;

pub use daily_rank::{rank_units, Direction, RankedUnit, RankingInput, RankingOutput, UnitTarget};
