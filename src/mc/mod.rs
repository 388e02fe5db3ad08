pub mod mc_engine;
pub mod path_simulator;
pub mod payoffs;
pub mod statistics;
