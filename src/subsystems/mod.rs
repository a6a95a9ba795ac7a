//! Subsystem modules for the palabra bot.

pub mod comms;
pub mod runtime;
