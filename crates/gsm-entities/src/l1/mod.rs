pub mod l1_ms;
