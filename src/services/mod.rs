pub mod blog_service;
pub mod chart;
pub mod chat_service;
pub mod conversation_service;
pub mod dispatcher;
pub mod editor;
pub mod fallback_report;
pub mod llm_service;
pub mod onboarding_service;
pub mod report_renderer;
pub mod report_service;
pub mod session_store;
pub mod stock_metrics;
