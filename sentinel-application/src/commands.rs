pub mod sentinel_commands;
