pub mod assignments;
pub mod batch_grading;
pub mod errors;
pub mod files;
pub mod grading;
pub mod health;
pub(crate) mod http;
pub mod supabase;
pub(crate) mod validation;

pub use assignments::AssignmentsService;
pub use batch_grading::BatchGradingService;
pub use errors::ClientError;
pub use files::FilesService;
pub use grading::GradingService;
pub use health::HealthService;
pub use http::ApiClient;
pub use supabase::SupabaseClient;
