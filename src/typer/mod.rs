pub mod aggregator;
pub mod calls;
pub mod external;
pub mod hits;
pub mod reference;
pub mod resolver;
pub mod scheduler;
pub mod workflows;
pub mod writers;
