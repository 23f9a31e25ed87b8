use anyhow::{bail, Context, Result};
use log::info;

use modbus_tcp_rust::cli::{build_cli, handle_offline_commands, parse_write_command, WriteCommand};
use modbus_tcp_rust::{Config, ModbusError, ModbusSession, Transport};

fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn report_failure<T: Transport>(err: &ModbusError, session: &ModbusSession<T>, config: &Config) {
    eprintln!("❌ {}", err);
    if session.is_failed() {
        eprintln!(
            "   Session error record (code {}): {}",
            session.error_code(),
            session.error_message()
        );
    }
    if err.is_timeout() {
        eprintln!(
            "💡 No progress within {}s; raise --timeout or check the server",
            config.connection.timeout_seconds
        );
    }
}

fn main() -> Result<()> {
    let matches = build_cli().get_matches();
    let config = Config::from_matches(&matches).context("failed to load configuration")?;
    init_logging(&config.logging.level);

    info!("🖥️  Modbus/TCP write client v{}", modbus_tcp_rust::VERSION);

    if handle_offline_commands(&matches, &config)? {
        return Ok(());
    }

    // No subcommand: write 222 to holding register 0.
    let command = parse_write_command(&matches)
        .context("invalid write arguments")?
        .unwrap_or(WriteCommand::Register {
            address: 0,
            value: 222,
        });

    config.validate().context("invalid connection settings")?;
    let mut session = config.session();

    if let Err(e) = session.connect() {
        report_failure(&e, &session, &config);
        bail!(
            "could not connect to {}:{}",
            config.connection.host,
            config.connection.port
        );
    }

    let outcome = command.execute(&mut session);
    session.close();

    if let Err(e) = outcome {
        report_failure(&e, &session, &config);
        bail!("write request failed");
    }
    Ok(())
}
