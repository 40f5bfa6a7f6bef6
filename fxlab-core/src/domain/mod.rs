//! Domain types: bars, instrument, parameters, positions, trades.

pub mod bar;
pub mod ids;
pub mod instrument;
pub mod params;
pub mod position;
pub mod trade;

pub use bar::{Bar, Timeframe};
pub use ids::{IdGen, PositionId, TrialId};
pub use instrument::Instrument;
pub use params::{
    FlagDomain, FloatRange, IntRange, ParamValue, ParameterSet, SearchSpace, DIMENSIONS,
    FIELD_NAMES,
};
pub use position::{Position, PositionStatus, Side};
pub use trade::{ExitReason, Trade};
