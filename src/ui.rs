pub mod tab_strip;
pub mod transcript;
