// Domain layer: core models, the notification payload and ports (interfaces).

pub mod event;
pub mod model;
pub mod ports;
