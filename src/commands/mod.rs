pub mod diagnose;
pub mod diary;
pub mod settings;
