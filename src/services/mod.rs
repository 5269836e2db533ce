pub mod grading_service;
pub mod insight_service;
pub mod llm_service;
pub mod question_service;
pub mod stub_service;
