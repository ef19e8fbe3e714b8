//! Query modules for the work ledger.

pub mod converted_videos;
pub mod subtitles;
pub mod work_items;
