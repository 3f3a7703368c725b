pub mod lapdm_format;
pub mod s_frame_type;
pub mod u_frame_type;
