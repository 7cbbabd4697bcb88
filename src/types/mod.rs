pub mod job;
pub mod session;
pub mod trim;
pub mod video_info;
