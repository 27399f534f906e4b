use std::sync::Arc;

use crate::batch::BatchProcessor;
use crate::context::AppContext;
use crate::stream::StreamingTranslator;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub context: AppContext,
    pub translator: Arc<StreamingTranslator>,
    pub batches: BatchProcessor,
}

impl AppState {
    pub fn new(context: AppContext) -> Self {
        Self {
            translator: Arc::new(StreamingTranslator::new(context.clone())),
            batches: BatchProcessor::new(context.clone()),
            context,
        }
    }
}
