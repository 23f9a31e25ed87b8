use clap::{Arg, ArgAction, ArgMatches, Command};
use log::info;

use crate::config::Config;
use crate::modbus::client::ModbusSession;
use crate::modbus::transport::Transport;
use crate::utils::error::ModbusError;

pub fn build_cli() -> Command {
    Command::new("modbus-tcp-write")
        .version(crate::VERSION)
        .about("Send Modbus/TCP write requests to a server")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .global(true)
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("IPV4")
                .global(true)
                .help("Server address (default 127.0.0.1)"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .global(true)
                .help("Server port (default 502)"),
        )
        .arg(
            Arg::new("slave")
                .short('s')
                .long("slave")
                .value_name("ID")
                .global(true)
                .help("Slave/unit id (default 1)"),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("SECONDS")
                .global(true)
                .help("Socket I/O timeout (default 20)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Log frames at debug level"),
        )
        .subcommand(
            Command::new("write-register")
                .about("Write Single Register (0x06)")
                .arg(Arg::new("address").required(true))
                .arg(Arg::new("value").required(true)),
        )
        .subcommand(
            Command::new("write-coil")
                .about("Write Single Coil (0x05)")
                .arg(Arg::new("address").required(true))
                .arg(Arg::new("state").required(true).help("on|off")),
        )
        .subcommand(
            Command::new("write-registers")
                .about("Write Multiple Registers (0x10)")
                .arg(Arg::new("address").required(true))
                .arg(
                    Arg::new("values")
                        .required(true)
                        .help("Comma separated, e.g. 1,2,0x10"),
                ),
        )
        .subcommand(
            Command::new("write-coils")
                .about("Write Multiple Coils (0x0F)")
                .arg(Arg::new("address").required(true))
                .arg(
                    Arg::new("states")
                        .required(true)
                        .help("Comma separated, e.g. 1,0,1"),
                ),
        )
        .subcommand(
            Command::new("init-config")
                .about("Write the effective configuration to a TOML file")
                .arg(Arg::new("path").required(true)),
        )
}

/// Commands that need no connection. Returns true when one ran.
pub fn handle_offline_commands(matches: &ArgMatches, config: &Config) -> Result<bool, ModbusError> {
    if let Some(matches) = matches.subcommand_matches("init-config") {
        let path = required(matches, "path")?;
        config.save_to_file(path)?;
        info!("💾 Configuration written to {}", path);
        println!("✅ Configuration written to {}", path);
        return Ok(true);
    }

    Ok(false)
}

/// A write requested on the command line, parsed before any connection is
/// made so bad values never reach the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteCommand {
    Register { address: u16, value: u16 },
    Coil { address: u16, state: bool },
    Registers { address: u16, values: Vec<u16> },
    Coils { address: u16, states: Vec<bool> },
}

impl WriteCommand {
    /// Send the write on a connected session. Returns the bytes sent.
    pub fn execute<T: Transport>(
        &self,
        session: &mut ModbusSession<T>,
    ) -> Result<usize, ModbusError> {
        let sent = match self {
            WriteCommand::Register { address, value } => {
                let sent = session.write_register(*address, *value)?;
                println!(
                    "✅ Register {} <- {} ({} bytes sent)",
                    address,
                    value,
                    sent
                );
                sent
            }
            WriteCommand::Coil { address, state } => {
                let sent = session.write_coil(*address, *state)?;
                let label = if *state { "ON" } else { "OFF" };
                println!("✅ Coil {} <- {} ({} bytes sent)", address, label, sent);
                sent
            }
            WriteCommand::Registers { address, values } => {
                let sent = session.write_registers(*address, values)?;
                println!(
                    "✅ {} registers from {} ({} bytes sent)",
                    values.len(),
                    address,
                    sent
                );
                sent
            }
            WriteCommand::Coils { address, states } => {
                let sent = session.write_coils(*address, states)?;
                println!(
                    "✅ {} coils from {} ({} bytes sent)",
                    states.len(),
                    address,
                    sent
                );
                sent
            }
        };
        Ok(sent)
    }
}

/// Parse the write subcommand, if any. Returns `Ok(None)` when none was given.
pub fn parse_write_command(matches: &ArgMatches) -> Result<Option<WriteCommand>, ModbusError> {
    if let Some(matches) = matches.subcommand_matches("write-register") {
        return Ok(Some(WriteCommand::Register {
            address: parse_u16(required(matches, "address")?)?,
            value: parse_u16(required(matches, "value")?)?,
        }));
    }

    if let Some(matches) = matches.subcommand_matches("write-coil") {
        return Ok(Some(WriteCommand::Coil {
            address: parse_u16(required(matches, "address")?)?,
            state: parse_coil(required(matches, "state")?)?,
        }));
    }

    if let Some(matches) = matches.subcommand_matches("write-registers") {
        return Ok(Some(WriteCommand::Registers {
            address: parse_u16(required(matches, "address")?)?,
            values: parse_list(required(matches, "values")?, parse_u16)?,
        }));
    }

    if let Some(matches) = matches.subcommand_matches("write-coils") {
        return Ok(Some(WriteCommand::Coils {
            address: parse_u16(required(matches, "address")?)?,
            states: parse_list(required(matches, "states")?, parse_coil)?,
        }));
    }

    Ok(None)
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str, ModbusError> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| ModbusError::ConfigError(format!("Missing argument <{}>", name)))
}

/// Parse a decimal or `0x`-prefixed hexadecimal 16-bit value.
pub fn parse_u16(text: &str) -> Result<u16, ModbusError> {
    let text = text.trim();
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|_| ModbusError::InvalidData(format!("Not a 16-bit value: {}", text)))
}

pub fn parse_coil(text: &str) -> Result<bool, ModbusError> {
    match text.trim().to_ascii_lowercase().as_str() {
        "1" | "on" | "true" => Ok(true),
        "0" | "off" | "false" => Ok(false),
        other => Err(ModbusError::InvalidData(format!("Not a coil state: {}", other))),
    }
}

fn parse_list<T>(
    text: &str,
    parse: fn(&str) -> Result<T, ModbusError>,
) -> Result<Vec<T>, ModbusError> {
    text.split(',')
        .filter(|item| !item.trim().is_empty())
        .map(parse)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_u16() {
        assert_eq!(parse_u16("222").unwrap(), 222);
        assert_eq!(parse_u16("0x00DE").unwrap(), 0xDE);
        assert_eq!(parse_u16(" 65535 ").unwrap(), u16::MAX);
        assert!(parse_u16("65536").is_err());
        assert!(parse_u16("-1").is_err());
    }

    #[test]
    fn test_parse_coil() {
        assert!(parse_coil("ON").unwrap());
        assert!(parse_coil("1").unwrap());
        assert!(!parse_coil("off").unwrap());
        assert!(parse_coil("maybe").is_err());
    }

    #[test]
    fn test_parse_lists() {
        assert_eq!(parse_list("1, 2,0x10", parse_u16).unwrap(), vec![1, 2, 16]);
        assert_eq!(
            parse_list("1,0,1,1", parse_coil).unwrap(),
            vec![true, false, true, true]
        );
        assert!(parse_list("", parse_u16).unwrap().is_empty());
        assert!(parse_list("1,x", parse_u16).is_err());
    }

    fn matches_for(args: &[&str]) -> ArgMatches {
        let mut argv = vec!["modbus-tcp-write"];
        argv.extend_from_slice(args);
        build_cli().try_get_matches_from(argv).unwrap()
    }

    #[test]
    fn test_parse_write_register_command() {
        let matches = matches_for(&["write-register", "0", "222", "--slave", "3"]);
        assert_eq!(
            parse_write_command(&matches).unwrap(),
            Some(WriteCommand::Register {
                address: 0,
                value: 222,
            })
        );
        assert_eq!(matches.get_one::<String>("slave").unwrap(), "3");
    }

    #[test]
    fn test_parse_multiple_write_commands() {
        let matches = matches_for(&["write-registers", "10", "1,0x20,3"]);
        assert_eq!(
            parse_write_command(&matches).unwrap(),
            Some(WriteCommand::Registers {
                address: 10,
                values: vec![1, 32, 3],
            })
        );

        let matches = matches_for(&["write-coils", "4", "1,0,on"]);
        assert_eq!(
            parse_write_command(&matches).unwrap(),
            Some(WriteCommand::Coils {
                address: 4,
                states: vec![true, false, true],
            })
        );

        assert_eq!(parse_write_command(&matches_for(&[])).unwrap(), None);
    }

    #[test]
    fn test_non_numeric_value_is_reported() {
        let matches = matches_for(&["write-register", "0", "abc"]);
        let err = parse_write_command(&matches).unwrap_err();
        assert!(matches!(err, ModbusError::InvalidData(_)));
        assert!(err.to_string().contains("abc"));

        let matches = matches_for(&["write-coil", "1", "maybe"]);
        let err = parse_write_command(&matches).unwrap_err();
        assert!(err.to_string().contains("maybe"));
    }

    #[test]
    fn test_unconnected_session_reports_error() {
        let command = WriteCommand::Coil {
            address: 4,
            state: true,
        };
        let mut session = ModbusSession::new("127.0.0.1", 502);
        let result = command.execute(&mut session);
        assert!(matches!(result, Err(ModbusError::NotConnected)));
        assert!(session.is_failed());
        assert_eq!(session.error_code(), ModbusError::NotConnected.code());
    }

    #[test]
    fn test_init_config_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("modbus.toml");
        let path_arg = path.to_string_lossy().to_string();
        let matches = matches_for(&["init-config", path_arg.as_str()]);

        assert!(handle_offline_commands(&matches, &Config::default()).unwrap());
        assert_eq!(Config::from_file(&path).unwrap(), Config::default());
    }
}
