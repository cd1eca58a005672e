pub mod features;
pub mod forest;
pub mod model;

pub use features::{FeatureBuilder, FeatureVector, TrainingSet};
pub use forest::{ForestConfig, RandomForest};
pub use model::{SignalClassifier, TrainedModel, TrainingReport};
