// Domain layer: upstream records, the composite response and the ports (interfaces)
// the aggregation core depends on.

pub mod model;
pub mod ports;
