pub mod lapdm_frame;
