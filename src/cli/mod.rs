pub mod commands;

pub use commands::{
    build_cli, handle_offline_commands, parse_coil, parse_u16, parse_write_command, WriteCommand,
};
