//! Key queue and worker loop driving the controller

mod manager;

pub use manager::ControllerManager;
