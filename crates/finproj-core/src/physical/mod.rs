pub mod heat_index;
pub mod ohms_law;
