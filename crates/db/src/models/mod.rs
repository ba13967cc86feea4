pub mod answer;
pub mod classification;
pub mod comment;
pub mod media;
pub mod status;
pub mod task;
