pub mod codec;
pub mod config;
pub mod manager;
pub mod persistence;
pub mod registry;
pub mod sync;
pub mod task;
pub mod task_set;
pub mod task_validation;
pub mod visualization;

pub use codec::{
    CodecError, FnMarshaller, Marshaller, TaskSetCodec, TaskSetCollectionCodec, ThresholdEncoding,
    VisualizationCodec,
};
pub use config::StoreConfig;
pub use manager::Manager;
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteStore;
pub use persistence::{
    FileStore, PersistenceError, PersistenceResult, TextStore, load_task_set_from_csv,
    load_task_set_from_json, save_task_set_to_csv, save_task_set_to_json,
};
pub use registry::{ListenerId, TaskSetCollection, TaskSetListener, TaskSetRegistry};
pub use sync::RwSafe;
pub use task::{Color, NO_THRESHOLD, Task};
pub use task_set::TaskSet;
pub use task_validation::{TaskField, TaskValidationError};
pub use visualization::{
    Visualization, VisualizationError, VisualizationListener, VisualizationManager,
};
