pub mod display_sink;
