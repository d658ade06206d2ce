pub mod classifier;
pub mod manifest;
pub mod score;
pub mod single;
pub mod util;

pub use classifier::{evaluate, Classifier, EvalAccumulator, EvalError, EvalReport};
pub use manifest::{LabelLine, PredictionLine, SplitEntry, SplitsManifest};
pub use score::{run_score, score, ReportFormat, ScoreArgs, TaskArg};
pub use single::{classify_image, eval_image_galaxy_id, ImagePrediction, StoredPrediction};
pub use util::{run_prepare, PrepareArgs, PrepareSummary};
