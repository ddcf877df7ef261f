//! Occupancy-grid map annotation engine.
//!
//! Loads a ROS-style occupancy map, lets an operator draw walls, clear
//! floor, annotate semantic zones and place a robot pose estimate, and
//! reports every committed edit to a hosting web shell over JSON-RPC.

pub mod engine;
pub mod rpc;
pub mod tools;
