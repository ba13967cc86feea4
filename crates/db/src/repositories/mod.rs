pub mod answer_repo;
pub mod classification_repo;
pub mod comment_repo;
pub mod media_repo;
pub mod task_repo;

pub use answer_repo::AnswerRepo;
pub use classification_repo::ClassificationRepo;
pub use comment_repo::CommentRepo;
pub use media_repo::MediaRepo;
pub use task_repo::TaskRepo;
