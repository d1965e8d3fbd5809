//! Model training and selection
//!
//! Two candidate regressors are fitted on the training block and compared
//! on the test block:
//! - Random forest of regression trees (bagged, trees built in parallel)
//! - Ordinary least squares linear regression
//!
//! The one with the lower mean absolute percentage error wins.

pub mod decision_tree;
pub mod linear_models;
pub mod metrics;
mod models;
pub mod random_forest;
mod selection;

pub use decision_tree::{Criterion, DecisionTree};
pub use linear_models::LinearRegression;
pub use metrics::{mean_absolute_error, mean_absolute_percentage_error, root_mean_squared_error};
pub use models::{CandidateModel, ModelMetrics, Regressor};
pub use random_forest::RandomForest;
pub use selection::{CandidateScore, ModelSelector, Selection};
