pub mod config;
pub mod config_loader;
pub mod error;
pub mod result;
pub mod series;

pub use config::{BandConfig, DrawMode, ExperimentConfig, NullModel, PairConfig};
pub use config_loader::{ConfigLoader, DEFAULT_CONFIG_PATH, ENV_PREFIX};
pub use error::{AnalysisError, AnalysisResult};
pub use result::{ResultRow, RowOutcome};
pub use series::{AlignedPair, TimeSeries};
