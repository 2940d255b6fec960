#![forbid(unsafe_code)]

//! Runtime for drivewatch: the Elm-style program loop, background
//! subscriptions, and a headless simulator for tests.

pub mod program;
pub mod simulator;
pub mod subscription;

pub use program::{Cmd, Model, Program, ProgramConfig};
pub use simulator::ProgramSimulator;
pub use subscription::{Every, StopSignal, SubId, Subscription, SubscriptionManager};
