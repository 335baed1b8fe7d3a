pub mod ids;
pub mod logging;

pub use ids::TemplateId;
pub use logging::SessionLog;
