//! Resolution, metrics and reply rendering

pub mod comment_renderer;
pub mod metrics;
pub mod resolver;
pub mod templates;

pub use comment_renderer::render;
pub use metrics::{MetricsEvent, MetricsRecorder};
pub use resolver::{Resolution, SauceResolver};
pub use templates::CommentTemplates;
