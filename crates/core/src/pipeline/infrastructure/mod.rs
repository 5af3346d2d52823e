pub mod stage_channel;
pub mod thread_worker;
