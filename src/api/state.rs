use std::sync::Arc;

use crate::config::Config;
use crate::db::NoteStore;
use crate::llm::NoteGenerator;
use crate::pipeline::NotePipeline;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn NoteStore>,
    pub pipeline: Arc<NotePipeline>,
    /// Present when an LLM is configured; used for health reporting.
    pub generator: Option<Arc<NoteGenerator>>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn NoteStore>,
        pipeline: Arc<NotePipeline>,
        generator: Option<Arc<NoteGenerator>>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            pipeline,
            generator,
        }
    }
}
