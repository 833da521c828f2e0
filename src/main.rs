use std::{
    net::TcpListener,
    process::ExitCode,
    thread,
};

use nmea2tcp::{hang_up, BridgeCfg, CommandTranslator, SentenceTranslator};

fn main() -> ExitCode {
    let cfg: BridgeCfg = argh::from_env();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = nmea2tcp::self_test() {
        log::error!("{e}");
        return ExitCode::FAILURE;
    }

    let serial = match cfg.serial().open() {
        Ok(serial) => serial,
        Err(e) => {
            log::error!("Cant open serial port {}: {e}", cfg.serial_port);
            return ExitCode::FAILURE;
        }
    };
    log::info!(
        "Serial on: {}",
        serial.name().unwrap_or_else(|| cfg.serial_port.clone())
    );

    match serve(&cfg, serial) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Accept a single client and bridge it to the serial port until it goes away.
fn serve(cfg: &BridgeCfg, serial: Box<dyn serialport::SerialPort>) -> std::io::Result<()> {
    let serial_out = serial.try_clone()?;
    let listener = TcpListener::bind(cfg.listen_addr())?;
    log::info!("Port #: {}", cfg.port);
    let (conn, addr) = listener.accept()?;
    log::info!("Connected by {addr}");

    let commands = {
        let input = conn.try_clone()?;
        thread::spawn(move || {
            let mut translator = CommandTranslator::new(input, serial_out);
            match translator.run() {
                Ok(stats) => log::info!("UBX handler stopped: {stats:?}"),
                Err(e) => log::error!("UBX handler: {e}"),
            }
        })
    };

    let mut sentences = SentenceTranslator::new(serial, &conn);
    match sentences.run() {
        Ok(stats) => log::info!("Sentence handler stopped: {stats:?}"),
        Err(e) => log::error!("{e}; {:?}", sentences.stats()),
    }

    // unblocks the UBX handler if the client is still connected
    let _ = hang_up(&conn);
    if commands.join().is_err() {
        log::error!("UBX handler panicked");
    }
    Ok(())
}
